//! Count + page execution of a [`QueryPlan`].

use sqlx::any::Any;
use sqlx::AnyConnection;
use sylva_data::{Page, QueryPlan};

use crate::bind::{dialect_of, trace_statement, BindValues, FromAnyRow};
use crate::error::{SqlxErrorExt, SqlxResult};

/// Number of rows (or groups) matching the plan, ignoring its page window.
pub async fn count(conn: &mut AnyConnection, plan: &QueryPlan) -> SqlxResult<u64> {
    let stmt = plan.count_statement(dialect_of(conn));
    trace_statement(&stmt);
    let total = sqlx::query_scalar::<Any, i64>(&stmt.sql)
        .bind_values(stmt.params.clone())
        .fetch_optional(&mut *conn)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    Ok(total.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
}

/// Run the count query, then the data query, and wrap both in a [`Page`].
///
/// The two queries are not isolated from concurrent writers: `total` may
/// disagree with `items` if rows change in between.
pub async fn fetch_page<T: FromAnyRow>(
    conn: &mut AnyConnection,
    plan: &QueryPlan,
) -> SqlxResult<Page<T>> {
    let total = count(conn, plan).await?;

    let stmt = plan.select_statement(dialect_of(conn));
    trace_statement(&stmt);
    let items = sqlx::query_as::<Any, T>(&stmt.sql)
        .bind_values(stmt.params.clone())
        .fetch_all(&mut *conn)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;

    tracing::debug!(
        table = plan.table(),
        total,
        returned = items.len(),
        "fetched page"
    );
    Ok(Page::new(items, total, plan.limit(), plan.offset()))
}
