//! Binding [`SqlValue`]s onto `sqlx` queries over the `Any` driver.

use sqlx::any::{Any, AnyArguments, AnyRow};
use sqlx::AnyConnection;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::FromRow;
use sylva_data::{Dialect, SqlValue, Statement};

/// Rows decodable from the `Any` driver.
pub trait FromAnyRow: for<'r> FromRow<'r, AnyRow> + Send + Unpin {}

impl<T> FromAnyRow for T where T: for<'r> FromRow<'r, AnyRow> + Send + Unpin {}

/// Dialect of the backend behind `conn`.
pub fn dialect_of(conn: &AnyConnection) -> Dialect {
    Dialect::from_backend_name(conn.backend_name())
}

pub(crate) fn trace_statement(stmt: &Statement) {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "executing statement");
}

/// Bind a statement's parameters in placeholder order.
pub(crate) trait BindValues: Sized {
    fn bind_value(self, value: SqlValue) -> Self;

    fn bind_values(self, values: Vec<SqlValue>) -> Self {
        values.into_iter().fold(self, Self::bind_value)
    }
}

macro_rules! bind_sql_value {
    ($query:expr, $value:expr) => {
        match $value {
            SqlValue::Null => $query.bind(None::<String>),
            SqlValue::Bool(b) => $query.bind(b),
            SqlValue::Int(i) => $query.bind(i),
            SqlValue::Float(x) => $query.bind(x),
            SqlValue::Text(s) => $query.bind(s),
        }
    };
}

impl<'q> BindValues for Query<'q, Any, AnyArguments<'q>> {
    fn bind_value(self, value: SqlValue) -> Self {
        bind_sql_value!(self, value)
    }
}

impl<'q, O> BindValues for QueryAs<'q, Any, O, AnyArguments<'q>> {
    fn bind_value(self, value: SqlValue) -> Self {
        bind_sql_value!(self, value)
    }
}

impl<'q, O> BindValues for QueryScalar<'q, Any, O, AnyArguments<'q>> {
    fn bind_value(self, value: SqlValue) -> Self {
        bind_sql_value!(self, value)
    }
}
