//! # sylva-data
//!
//! Backend-agnostic core of the Sylva query engine: record descriptors, the
//! filter/sort token language, value coercion, the query builder and the SQL
//! statements it renders, and the page envelope.
//!
//! Execution against a database lives in `sylva-data-sqlx`.
//!
//! ```ignore
//! use sylva_data::prelude::*;
//!
//! let descriptor = RecordDescriptor::of::<Permit>()?;
//! let plan = QueryBuilder::new(&descriptor)
//!     .any_of(["status=Y", "status=N"])
//!     .filter("year=2024")
//!     .sort("name:asc")
//!     .build()?;
//! let count = plan.count_statement(Dialect::Postgres);
//! ```

pub mod cache;
pub mod coerce;
pub mod config;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod page;
pub mod params;
pub mod parse;
pub mod query;
pub mod statement;
pub mod value;

pub use cache::BoundedCache;
pub use config::DataConfig;
pub use descriptor::RecordDescriptor;
pub use entity::{Column, ColumnType, Entity};
pub use error::DataError;
pub use page::Page;
pub use params::QueryParams;
pub use parse::{parse_filter, parse_sort, FilterExpression, FilterOp, SortDirection, SortExpression};
pub use query::{Dialect, FilterInput, Predicate, QueryBuilder, QueryPlan};
pub use statement::Statement;
pub use value::SqlValue;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Column, ColumnType, DataError, Dialect, Entity, FilterInput, Page, QueryBuilder, QueryParams,
        RecordDescriptor, SqlValue,
    };
}
