//! Caller-owned transaction wrapper.

use sqlx::any::Any;
use sqlx::{AnyConnection, AnyPool, Connection, Transaction};
use std::ops::{Deref, DerefMut};

use crate::error::{SqlxErrorExt, SqlxResult};

/// A wrapper around an SQLx [`Transaction`] on the `Any` driver.
///
/// Engine calls made through [`as_mut`](Tx::as_mut) run as savepoints inside
/// it: nothing they write is visible to others until [`commit`](Tx::commit),
/// and [`rollback`](Tx::rollback) (or dropping the `Tx`) discards all of it.
///
/// # Example
///
/// ```ignore
/// let mut tx = Tx::begin(&pool).await?;
/// let permit = repo.create(tx.as_mut(), &data).await?;
/// repo.delete(tx.as_mut(), &permit.id, false).await?;
/// tx.commit().await?;
/// ```
pub struct Tx<'a>(pub Transaction<'a, Any>);

impl<'a> Deref for Tx<'a> {
    type Target = Transaction<'a, Any>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> DerefMut for Tx<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Tx<'static> {
    /// Begin a transaction on a connection taken from `pool`.
    pub async fn begin(pool: &AnyPool) -> SqlxResult<Self> {
        let tx = pool.begin().await.map_err(SqlxErrorExt::into_data_error)?;
        Ok(Tx(tx))
    }
}

impl<'a> Tx<'a> {
    /// Begin a transaction on an existing connection.
    pub async fn begin_on(conn: &'a mut AnyConnection) -> SqlxResult<Self> {
        let tx = conn.begin().await.map_err(SqlxErrorExt::into_data_error)?;
        Ok(Tx(tx))
    }

    /// Unwraps the `Tx` into the inner `Transaction`.
    pub fn into_inner(self) -> Transaction<'a, Any> {
        self.0
    }

    /// Returns a mutable reference to the underlying connection.
    pub fn as_mut(&mut self) -> &mut AnyConnection {
        &mut *self.0
    }

    pub async fn commit(self) -> SqlxResult<()> {
        self.0.commit().await.map_err(SqlxErrorExt::into_data_error)
    }

    pub async fn rollback(self) -> SqlxResult<()> {
        self.0.rollback().await.map_err(SqlxErrorExt::into_data_error)
    }
}
