//! # sylva-data-sqlx — SQLx backend for the Sylva query engine
//!
//! Runs the plans and statements built by [`sylva-data`] against a database
//! through the `sqlx` `Any` driver. The SQL dialect is picked from the
//! connection's backend at call time.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxRepository`] | The engine bound to one [`Entity`](sylva_data::Entity) type |
//! | [`pagination`] | Count + page execution of a `QueryPlan` |
//! | [`mutation`] | Create, update, delete, exists, batched bulk insert |
//! | [`Tx`] | Transaction wrapper; engine calls nest inside it as savepoints |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Feature flags
//!
//! Enable the drivers you connect to:
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//! | `mysql`    | MySQL via `sqlx/mysql` |
//!
//! Call `sqlx::any::install_default_drivers()` once before connecting.
//!
//! # Quick start
//!
//! ```ignore
//! use sqlx::{AnyConnection, Connection};
//! use sylva_data_sqlx::prelude::*;
//!
//! sqlx::any::install_default_drivers();
//! let mut conn = AnyConnection::connect("sqlite::memory:").await?;
//!
//! let repo = SqlxRepository::<Permit>::new()?;
//! let page = repo
//!     .find_page(&mut conn, repo.query().filter("status=Y").sort("name:asc"))
//!     .await?;
//! ```
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use sylva_data_sqlx::SqlxErrorExt;
//!
//! let row = sqlx::query("SELECT ...")
//!     .fetch_one(&mut conn)
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

mod bind;
pub mod error;
pub mod mutation;
pub mod pagination;
pub mod repository;
pub mod tx;

pub use bind::{dialect_of, FromAnyRow};
pub use error::{SqlxErrorExt, SqlxResult};
pub use mutation::RecordData;
pub use repository::SqlxRepository;
pub use tx::Tx;

/// Re-exports of the most commonly used types from both `sylva-data` and this crate.
pub mod prelude {
    pub use crate::{RecordData, SqlxErrorExt, SqlxRepository, SqlxResult, Tx};
    pub use sylva_data::prelude::*;
}
