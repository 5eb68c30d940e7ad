//! Create, update, delete, existence and bulk insert.
//!
//! Every mutating call runs in its own transaction begun on the caller's
//! connection. Inside a caller's [`Tx`](crate::Tx) that transaction is a
//! savepoint, so the caller's rollback still discards the work.

use sqlx::any::{Any, AnyQueryResult};
use sqlx::{AnyConnection, Connection};
use sylva_data::{statement, DataError, Dialect, RecordDescriptor, SqlValue, Statement};

use crate::bind::{dialect_of, trace_statement, BindValues, FromAnyRow};
use crate::error::{SqlxErrorExt, SqlxResult};

/// Column values of one record, keyed by column name.
pub type RecordData = serde_json::Map<String, serde_json::Value>;

fn to_row(data: &RecordData) -> Vec<(String, SqlValue)> {
    data.iter()
        .map(|(column, value)| (column.clone(), SqlValue::from_json(value)))
        .collect()
}

fn key_text(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn execute(conn: &mut AnyConnection, stmt: Statement) -> SqlxResult<AnyQueryResult> {
    trace_statement(&stmt);
    sqlx::query::<Any>(&stmt.sql)
        .bind_values(stmt.params)
        .execute(&mut *conn)
        .await
        .map_err(SqlxErrorExt::into_data_error)
}

async fn fetch_optional<T: FromAnyRow>(
    conn: &mut AnyConnection,
    stmt: Statement,
) -> SqlxResult<Option<T>> {
    trace_statement(&stmt);
    sqlx::query_as::<Any, T>(&stmt.sql)
        .bind_values(stmt.params)
        .fetch_optional(&mut *conn)
        .await
        .map_err(SqlxErrorExt::into_data_error)
}

/// Insert one row and read it back, through `RETURNING *` or, where the
/// backend lacks it, a select by the supplied or generated identifier.
async fn insert_returning<T: FromAnyRow>(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    dialect: Dialect,
    row: Vec<(String, SqlValue)>,
) -> SqlxResult<T> {
    let stmt = statement::insert(d, dialect, &row)?;
    if dialect.supports_returning() {
        trace_statement(&stmt);
        return sqlx::query_as::<Any, T>(&stmt.sql)
            .bind_values(stmt.params)
            .fetch_one(&mut *conn)
            .await
            .map_err(SqlxErrorExt::into_data_error);
    }

    let result = execute(conn, stmt).await?;
    let id = match row.iter().find(|(column, _)| column == d.id_column()) {
        Some((_, value)) if !value.is_null() => key_text(value),
        _ => result
            .last_insert_id()
            .map(|id| id.to_string())
            .ok_or_else(|| {
                DataError::Other(format!(
                    "Insert into {} returned no identifier to read the row back",
                    d.table()
                ))
            })?,
    };
    fetch_optional(conn, statement::select_by_id_with(d, dialect, &id, false))
        .await?
        .ok_or_else(|| DataError::NotFound(format!("{} {id} vanished after insert", d.table())))
}

/// Read one row by identifier, hiding soft-deleted rows.
pub async fn find_by_id<T: FromAnyRow>(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    id: &str,
) -> SqlxResult<Option<T>> {
    let stmt = statement::select_by_id(d, dialect_of(conn), id);
    fetch_optional(conn, stmt).await
}

/// Insert `data` and return the stored row. `null` values are written as SQL `NULL`.
pub async fn create<T: FromAnyRow>(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    data: &RecordData,
) -> SqlxResult<T> {
    let dialect = dialect_of(conn);
    let mut tx = conn.begin().await.map_err(SqlxErrorExt::into_data_error)?;
    let record = insert_returning(&mut *tx, d, dialect, to_row(data)).await?;
    tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;
    tracing::debug!(table = d.table(), "created record");
    Ok(record)
}

/// Update the non-null values of `data` on row `id`.
///
/// `null` values are dropped, so a column cannot be cleared through this
/// path. With nothing left to write, the current row is returned (when
/// `refresh` is set). Returns `None` when no row matched, or when `refresh`
/// is off.
pub async fn update<T: FromAnyRow>(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    id: &str,
    data: &RecordData,
    refresh: bool,
) -> SqlxResult<Option<T>> {
    let set: Vec<(String, SqlValue)> = to_row(data)
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    if set.is_empty() {
        return if refresh {
            find_by_id(conn, d, id).await
        } else {
            Ok(None)
        };
    }

    let stmt = statement::update(d, dialect_of(conn), id, &set)?;
    let mut tx = conn.begin().await.map_err(SqlxErrorExt::into_data_error)?;
    let result = execute(&mut *tx, stmt).await?;
    tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;

    tracing::debug!(table = d.table(), id, rows = result.rows_affected(), "updated record");
    if result.rows_affected() == 0 || !refresh {
        return Ok(None);
    }
    find_by_id(conn, d, id).await
}

/// Whether row `id` exists and is not soft-deleted.
pub async fn exists(conn: &mut AnyConnection, d: &RecordDescriptor, id: &str) -> SqlxResult<bool> {
    let stmt = statement::exists(d, dialect_of(conn), id);
    trace_statement(&stmt);
    let row = sqlx::query::<Any>(&stmt.sql)
        .bind_values(stmt.params)
        .fetch_optional(&mut *conn)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    Ok(row.is_some())
}

/// Delete row `id`.
///
/// Record types with a soft-delete marker are marked deleted (and inactive)
/// unless `permanent` is set; a missing or already deleted row is then a
/// not-found error. Hard deletes report whether a row was removed.
pub async fn delete(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    id: &str,
    permanent: bool,
) -> SqlxResult<bool> {
    let dialect = dialect_of(conn);
    let stmt = if !permanent && d.soft_delete_column().is_some() {
        if !exists(conn, d, id).await? {
            return Err(DataError::NotFound(format!("{} {id} not found", d.table())));
        }
        statement::soft_delete(d, dialect, id)?
    } else {
        statement::delete(d, dialect, id)
    };

    let mut tx = conn.begin().await.map_err(SqlxErrorExt::into_data_error)?;
    let result = execute(&mut *tx, stmt).await?;
    tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;

    tracing::debug!(table = d.table(), id, permanent, rows = result.rows_affected(), "deleted record");
    Ok(result.rows_affected() > 0)
}

/// One validated slice of a bulk insert: every row carries `columns`, in order.
#[derive(Debug)]
struct Batch {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

fn prepare_batches(
    d: &RecordDescriptor,
    records: &[RecordData],
    batch_size: usize,
) -> Result<Vec<Batch>, DataError> {
    if batch_size == 0 {
        return Err(DataError::validation("Batch size must be greater than zero"));
    }

    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    for (index, chunk) in records.chunks(batch_size).enumerate() {
        let columns: Vec<String> = chunk[0].keys().cloned().collect();
        if columns.is_empty() {
            return Err(DataError::Validation(format!(
                "Bulk insert batch {index} has a record without columns"
            )));
        }
        for column in &columns {
            d.require_column(column)?;
        }

        let mut rows = Vec::with_capacity(chunk.len());
        for record in chunk {
            let same_keys =
                record.len() == columns.len() && columns.iter().all(|c| record.contains_key(c));
            if !same_keys {
                return Err(DataError::Validation(format!(
                    "Bulk insert batch {index} mixes records with different columns"
                )));
            }
            rows.push(
                columns
                    .iter()
                    .map(|c| record.get(c).map_or(SqlValue::Null, SqlValue::from_json))
                    .collect(),
            );
        }
        batches.push(Batch { columns, rows });
    }
    Ok(batches)
}

async fn insert_batch<T: FromAnyRow>(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    dialect: Dialect,
    batch: &Batch,
    return_records: bool,
) -> SqlxResult<Vec<T>> {
    let mut tx = conn.begin().await.map_err(SqlxErrorExt::into_data_error)?;
    let mut created = Vec::new();
    if return_records {
        created.reserve(batch.rows.len());
        for values in &batch.rows {
            let row = batch.columns.iter().cloned().zip(values.iter().cloned()).collect();
            created.push(insert_returning(&mut *tx, d, dialect, row).await?);
        }
    } else {
        for stmt in statement::insert_many_split(d, dialect, &batch.columns, &batch.rows)? {
            execute(&mut *tx, stmt).await?;
        }
    }
    tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;
    Ok(created)
}

/// Insert `records` in batches of `batch_size`, each batch in its own
/// transaction.
///
/// All records are validated before anything is written. A failing batch is
/// rolled back, earlier batches stay committed, and the error is
/// [`DataError::BatchFailed`] with the 0-based batch index and the number of
/// committed rows. Returns the stored rows when `return_records` is set.
pub async fn bulk_create<T: FromAnyRow>(
    conn: &mut AnyConnection,
    d: &RecordDescriptor,
    records: &[RecordData],
    batch_size: usize,
    return_records: bool,
) -> SqlxResult<Option<Vec<T>>> {
    let batches = prepare_batches(d, records, batch_size)?;
    let dialect = dialect_of(conn);

    let mut committed = 0;
    let mut created = Vec::new();
    for (index, batch) in batches.iter().enumerate() {
        match insert_batch::<T>(conn, d, dialect, batch, return_records).await {
            Ok(rows) => {
                committed += batch.rows.len();
                created.extend(rows);
            }
            Err(source) => {
                tracing::warn!(
                    table = d.table(),
                    batch = index,
                    committed,
                    error = %source,
                    "bulk insert batch failed"
                );
                return Err(DataError::BatchFailed {
                    batch: index,
                    committed,
                    source: Box::new(source),
                });
            }
        }
    }

    tracing::debug!(table = d.table(), rows = committed, batches = batches.len(), "bulk insert done");
    Ok(return_records.then_some(created))
}
