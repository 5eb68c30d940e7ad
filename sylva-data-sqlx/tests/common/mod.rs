#![allow(dead_code)]

use serde_json::{json, Value};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyConnection, AnyPool, Connection, FromRow, Row};
use sylva_data::{Column, Entity};
use sylva_data_sqlx::{RecordData, SqlxRepository};

const SCHEMA: &[&str] = &[
    "CREATE TABLE permits (
        id INTEGER PRIMARY KEY,
        name TEXT,
        status TEXT,
        year INTEGER,
        is_deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE regions (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Permit {
    pub id: i64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub year: Option<i64>,
    pub is_deleted: bool,
}

impl Entity for Permit {
    type Id = i64;

    fn table_name() -> &'static str {
        "permits"
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::integer("id"),
            Column::text("name"),
            Column::text("status"),
            Column::integer("year"),
            Column::boolean("is_deleted"),
        ];
        COLUMNS
    }

    fn soft_delete_column() -> Option<&'static str> {
        Some("is_deleted")
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl<'r> FromRow<'r, AnyRow> for Permit {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            status: row.try_get("status")?,
            year: row.try_get("year")?,
            is_deleted: row.try_get::<i64, _>("is_deleted")? != 0,
        })
    }
}

/// A record type without a soft-delete marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: i64,
    pub name: String,
}

impl Entity for Region {
    type Id = i64;

    fn table_name() -> &'static str {
        "regions"
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[Column::integer("id"), Column::text("name")];
        COLUMNS
    }

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl<'r> FromRow<'r, AnyRow> for Region {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

pub async fn connect() -> AnyConnection {
    sylva_core::init_tracing();
    sqlx::any::install_default_drivers();
    let mut conn = AnyConnection::connect("sqlite::memory:").await.unwrap();
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(&mut conn).await.unwrap();
    }
    conn
}

/// Single-connection pool so every checkout sees the same in-memory database.
pub async fn pool() -> AnyPool {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    pool
}

pub fn permits() -> SqlxRepository<Permit> {
    SqlxRepository::new().unwrap()
}

pub fn regions() -> SqlxRepository<Region> {
    SqlxRepository::new().unwrap()
}

pub fn data(value: Value) -> RecordData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Insert `(id, name, status, year, is_deleted)` rows directly.
pub async fn seed(conn: &mut AnyConnection, rows: &[(i64, &str, &str, i64, bool)]) {
    let repo = permits();
    for (id, name, status, year, is_deleted) in rows {
        repo.create(
            conn,
            &data(json!({
                "id": id,
                "name": name,
                "status": status,
                "year": year,
                "is_deleted": is_deleted,
            })),
        )
        .await
        .unwrap();
    }
}

pub fn ids(permits: &[Permit]) -> Vec<i64> {
    permits.iter().map(|p| p.id).collect()
}
