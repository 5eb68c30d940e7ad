use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::AnyConnection;
use sylva_core::SylvaConfig;
use sylva_data::{DataConfig, DataError, Entity, FilterInput, Page, QueryBuilder, QueryParams, RecordDescriptor};

use crate::bind::FromAnyRow;
use crate::error::SqlxResult;
use crate::mutation::{self, RecordData};
use crate::pagination;

/// The query engine bound to one record type.
///
/// Holds the record type's descriptor (introspected once) and the engine
/// settings; every call runs on a caller-supplied connection or
/// [`Tx`](crate::Tx).
///
/// # Example
///
/// ```ignore
/// let repo = SqlxRepository::<Permit>::new()?;
/// let page = repo.find_all(&mut conn, &params).await?;
/// let permit = repo.require_by_id(&mut conn, &id).await?;
/// ```
pub struct SqlxRepository<T> {
    descriptor: Arc<RecordDescriptor>,
    config: DataConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> SqlxRepository<T> {
    pub fn new() -> SqlxResult<Self> {
        Self::with_config(DataConfig::default())
    }

    /// Read the `sylva.data` section and size the parse caches from it.
    pub fn from_config(config: &SylvaConfig) -> SqlxResult<Self> {
        let data = config.section::<DataConfig>()?;
        data.install_parse_cache();
        Self::with_config(data)
    }

    pub fn with_config(config: DataConfig) -> SqlxResult<Self> {
        Ok(Self {
            descriptor: RecordDescriptor::describe::<T>()?,
            config,
            _marker: PhantomData,
        })
    }
}

impl<T> SqlxRepository<T> {
    pub fn descriptor(&self) -> &Arc<RecordDescriptor> {
        &self.descriptor
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// A builder for this record type, using the configured page size.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.descriptor).limit(self.config.default_limit)
    }
}

impl<T: Entity + FromAnyRow> SqlxRepository<T> {
    /// List rows according to query-string style parameters. A missing
    /// `limit` takes the configured page size.
    pub async fn find_all(&self, conn: &mut AnyConnection, params: &QueryParams) -> SqlxResult<Page<T>> {
        let plan = params
            .to_builder_with_limit(&self.descriptor, self.config.default_limit)?
            .build()?;
        pagination::fetch_page(conn, &plan).await
    }

    /// Run a builder obtained from [`query`](Self::query).
    pub async fn find_page(&self, conn: &mut AnyConnection, query: QueryBuilder<'_>) -> SqlxResult<Page<T>> {
        let plan = query.build()?;
        pagination::fetch_page(conn, &plan).await
    }

    pub async fn find_by_id(&self, conn: &mut AnyConnection, id: &T::Id) -> SqlxResult<Option<T>> {
        mutation::find_by_id(conn, &self.descriptor, &id.to_string()).await
    }

    /// Like [`find_by_id`](Self::find_by_id), failing with `NotFound`.
    pub async fn require_by_id(&self, conn: &mut AnyConnection, id: &T::Id) -> SqlxResult<T> {
        let id = id.to_string();
        mutation::find_by_id(conn, &self.descriptor, &id)
            .await?
            .ok_or_else(|| self.not_found(&id))
    }

    /// Number of rows matching `filters`, soft-deleted rows excluded.
    pub async fn count(
        &self,
        conn: &mut AnyConnection,
        filters: impl IntoIterator<Item = FilterInput>,
    ) -> SqlxResult<u64> {
        let plan = QueryBuilder::new(&self.descriptor).filters(filters).build()?;
        pagination::count(conn, &plan).await
    }

    pub async fn create(&self, conn: &mut AnyConnection, data: &RecordData) -> SqlxResult<T> {
        mutation::create(conn, &self.descriptor, data).await
    }

    /// Update non-null values and return the refreshed row, `None` if no row matched.
    pub async fn update(&self, conn: &mut AnyConnection, id: &T::Id, data: &RecordData) -> SqlxResult<Option<T>> {
        mutation::update(conn, &self.descriptor, &id.to_string(), data, true).await
    }

    /// Update without reading the row back.
    pub async fn update_only(&self, conn: &mut AnyConnection, id: &T::Id, data: &RecordData) -> SqlxResult<()> {
        mutation::update::<T>(conn, &self.descriptor, &id.to_string(), data, false).await?;
        Ok(())
    }

    /// Update a row that must exist (and not be soft-deleted).
    pub async fn update_existing(&self, conn: &mut AnyConnection, id: &T::Id, data: &RecordData) -> SqlxResult<T> {
        let id = id.to_string();
        if !mutation::exists(conn, &self.descriptor, &id).await? {
            return Err(self.not_found(&id));
        }
        mutation::update(conn, &self.descriptor, &id, data, true)
            .await?
            .ok_or_else(|| self.not_found(&id))
    }

    pub async fn delete(&self, conn: &mut AnyConnection, id: &T::Id, permanent: bool) -> SqlxResult<bool> {
        mutation::delete(conn, &self.descriptor, &id.to_string(), permanent).await
    }

    pub async fn exists(&self, conn: &mut AnyConnection, id: &T::Id) -> SqlxResult<bool> {
        mutation::exists(conn, &self.descriptor, &id.to_string()).await
    }

    /// Bulk insert with the configured batch size.
    pub async fn bulk_create(
        &self,
        conn: &mut AnyConnection,
        records: &[RecordData],
        return_records: bool,
    ) -> SqlxResult<Option<Vec<T>>> {
        self.bulk_create_batched(conn, records, self.config.bulk_batch_size, return_records)
            .await
    }

    pub async fn bulk_create_batched(
        &self,
        conn: &mut AnyConnection,
        records: &[RecordData],
        batch_size: usize,
        return_records: bool,
    ) -> SqlxResult<Option<Vec<T>>> {
        mutation::bulk_create(conn, &self.descriptor, records, batch_size, return_records).await
    }

    fn not_found(&self, id: &str) -> DataError {
        DataError::NotFound(format!("{} {id} not found", self.descriptor.table()))
    }
}

impl<T> Clone for SqlxRepository<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            config: self.config.clone(),
            _marker: PhantomData,
        }
    }
}
