//! Parameterized SQL statements for reads by identifier and for mutations.
//!
//! Every statement is rendered against a [`RecordDescriptor`]: column names
//! come from the descriptor (already validated), are quoted in the dialect's
//! style, and every value travels as a bound parameter. `NULL` values are
//! written as literals so backends never have to infer a parameter type.

use crate::descriptor::RecordDescriptor;
use crate::entity::ColumnType;
use crate::error::DataError;
use crate::query::Dialect;
use crate::value::SqlValue;

/// A rendered SQL statement with its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Accumulates SQL text and bind values, numbering placeholders for the dialect.
pub(crate) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlWriter {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub(crate) fn push_ident(&mut self, ident: &str) {
        let quoted = self.dialect.quote(ident);
        self.sql.push_str(&quoted);
    }

    /// Write a placeholder for `value`, or the `NULL` literal.
    pub(crate) fn push_value(&mut self, value: SqlValue) {
        if value.is_null() {
            self.sql.push_str("NULL");
            return;
        }
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    pub(crate) fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Bind value for an identifier, typed after the declared id column.
/// An integer key that does not parse stays text and simply matches nothing
/// on lenient backends.
fn id_value(d: &RecordDescriptor, id: &str) -> SqlValue {
    match d.column_type(d.id_column()) {
        Some(ColumnType::Integer) => id
            .parse()
            .map_or_else(|_| SqlValue::Text(id.to_string()), SqlValue::Int),
        _ => SqlValue::Text(id.to_string()),
    }
}

/// Append `WHERE "id" = ?` plus the soft-delete guard when requested.
fn push_id_condition(w: &mut SqlWriter, d: &RecordDescriptor, id: &str, skip_deleted: bool) {
    w.push(" WHERE ");
    w.push_ident(d.id_column());
    w.push(" = ");
    w.push_value(id_value(d, id));
    if skip_deleted {
        if let Some(marker) = d.soft_delete_column() {
            w.push(" AND ");
            w.push_ident(marker);
            w.push(" IS FALSE");
        }
    }
}

fn check_columns<'a>(
    d: &RecordDescriptor,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<(), DataError> {
    for column in columns {
        d.require_column(column)?;
    }
    Ok(())
}

/// `SELECT * FROM t WHERE id = ?` hiding soft-deleted rows.
pub fn select_by_id(d: &RecordDescriptor, dialect: Dialect, id: &str) -> Statement {
    select_by_id_with(d, dialect, id, true)
}

/// `SELECT * FROM t WHERE id = ?`, optionally including soft-deleted rows.
pub fn select_by_id_with(
    d: &RecordDescriptor,
    dialect: Dialect,
    id: &str,
    skip_deleted: bool,
) -> Statement {
    let mut w = SqlWriter::new(dialect);
    w.push("SELECT * FROM ");
    w.push_ident(d.table());
    push_id_condition(&mut w, d, id, skip_deleted);
    w.finish()
}

/// `SELECT 1 FROM t WHERE id = ? [AND marker IS FALSE] LIMIT 1`
pub fn exists(d: &RecordDescriptor, dialect: Dialect, id: &str) -> Statement {
    let mut w = SqlWriter::new(dialect);
    w.push("SELECT 1 FROM ");
    w.push_ident(d.table());
    push_id_condition(&mut w, d, id, true);
    w.push(" LIMIT 1");
    w.finish()
}

/// Single-row insert. Appends `RETURNING *` when the dialect supports it.
pub fn insert(
    d: &RecordDescriptor,
    dialect: Dialect,
    row: &[(String, SqlValue)],
) -> Result<Statement, DataError> {
    check_columns(d, row.iter().map(|(c, _)| c.as_str()))?;

    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO ");
    w.push_ident(d.table());
    if row.is_empty() {
        w.push(dialect.empty_insert());
    } else {
        w.push(" (");
        for (i, (column, _)) in row.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_ident(column);
        }
        w.push(") VALUES (");
        for (i, (_, value)) in row.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_value(value.clone());
        }
        w.push(")");
    }
    if dialect.supports_returning() {
        w.push(" RETURNING *");
    }
    Ok(w.finish())
}

/// Multi-row insert; every row must carry exactly `columns`, in that order.
pub fn insert_many(
    d: &RecordDescriptor,
    dialect: Dialect,
    columns: &[String],
    rows: &[Vec<SqlValue>],
) -> Result<Statement, DataError> {
    check_columns(d, columns.iter().map(String::as_str))?;
    if columns.is_empty() {
        return Err(DataError::validation(
            "Multi-row insert needs at least one column",
        ));
    }
    if rows.is_empty() {
        return Err(DataError::validation("Multi-row insert needs at least one row"));
    }

    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO ");
    w.push_ident(d.table());
    w.push(" (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push_ident(column);
    }
    w.push(") VALUES ");
    for (r, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(DataError::Validation(format!(
                "Row {r} has {} values for {} columns",
                row.len(),
                columns.len()
            )));
        }
        if r > 0 {
            w.push(", ");
        }
        w.push("(");
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_value(value.clone());
        }
        w.push(")");
    }
    Ok(w.finish())
}

/// [`insert_many`] split so that no statement carries more bind parameters
/// than the dialect accepts. Statements come back in row order.
pub fn insert_many_split(
    d: &RecordDescriptor,
    dialect: Dialect,
    columns: &[String],
    rows: &[Vec<SqlValue>],
) -> Result<Vec<Statement>, DataError> {
    if rows.is_empty() {
        return Err(DataError::validation("Multi-row insert needs at least one row"));
    }
    let rows_per_statement = (dialect.max_bind_params() / columns.len().max(1)).max(1);
    rows.chunks(rows_per_statement)
        .map(|chunk| insert_many(d, dialect, columns, chunk))
        .collect()
}

/// `UPDATE t SET a = ?, b = ? WHERE id = ?`. `set` must not be empty.
pub fn update(
    d: &RecordDescriptor,
    dialect: Dialect,
    id: &str,
    set: &[(String, SqlValue)],
) -> Result<Statement, DataError> {
    check_columns(d, set.iter().map(|(c, _)| c.as_str()))?;
    if set.is_empty() {
        return Err(DataError::validation("Update needs at least one column"));
    }

    let mut w = SqlWriter::new(dialect);
    w.push("UPDATE ");
    w.push_ident(d.table());
    w.push(" SET ");
    for (i, (column, value)) in set.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push_ident(column);
        w.push(" = ");
        w.push_value(value.clone());
    }
    push_id_condition(&mut w, d, id, false);
    Ok(w.finish())
}

/// Marks a row deleted (and inactive, when the descriptor has an active flag).
pub fn soft_delete(d: &RecordDescriptor, dialect: Dialect, id: &str) -> Result<Statement, DataError> {
    let marker = d.soft_delete_column().ok_or_else(|| {
        DataError::Validation(format!("Table {} has no soft-delete column", d.table()))
    })?;
    let mut set = vec![(marker.to_string(), SqlValue::Bool(true))];
    if let Some(active) = d.active_column() {
        set.push((active.to_string(), SqlValue::Bool(false)));
    }
    update(d, dialect, id, &set)
}

/// `DELETE FROM t WHERE id = ?`
pub fn delete(d: &RecordDescriptor, dialect: Dialect, id: &str) -> Statement {
    let mut w = SqlWriter::new(dialect);
    w.push("DELETE FROM ");
    w.push_ident(d.table());
    push_id_condition(&mut w, d, id, false);
    w.finish()
}
