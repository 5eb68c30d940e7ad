use sylva_core::config::typed::PropertyMeta;
use sylva_core::{ConfigError, ConfigProperties, SylvaConfig};

use crate::parse::{configure_parse_cache, DEFAULT_PARSE_CACHE_CAPACITY};
use crate::query::DEFAULT_LIMIT;

/// Default number of rows per bulk-insert batch.
pub const DEFAULT_BULK_BATCH_SIZE: usize = 1000;

const PAGE_LIMIT_KEY: &str = "sylva.data.page.limit";
const BULK_BATCH_KEY: &str = "sylva.data.bulk.batch";
const CACHE_CAPACITY_KEY: &str = "sylva.data.cache.capacity";

/// Engine settings under `sylva.data`.
///
/// ```yaml
/// sylva:
///   data:
///     page:
///       limit: 100
///     bulk:
///       batch: 1000
///     cache:
///       capacity: 256
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub default_limit: u64,
    pub bulk_batch_size: usize,
    pub parse_cache_capacity: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            bulk_batch_size: DEFAULT_BULK_BATCH_SIZE,
            parse_cache_capacity: DEFAULT_PARSE_CACHE_CAPACITY,
        }
    }
}

impl DataConfig {
    /// Size the process-wide parse caches. Returns `false` if they were
    /// already sized (by an earlier call or a first parse).
    pub fn install_parse_cache(&self) -> bool {
        let installed = configure_parse_cache(self.parse_cache_capacity);
        if !installed {
            tracing::debug!(
                capacity = self.parse_cache_capacity,
                "parse cache already sized, keeping existing capacity"
            );
        }
        installed
    }
}

impl ConfigProperties for DataConfig {
    fn prefix() -> &'static str {
        "sylva.data"
    }

    fn properties_metadata() -> Vec<PropertyMeta> {
        vec![
            PropertyMeta {
                key: PAGE_LIMIT_KEY,
                type_name: "u64",
                default_value: Some(DEFAULT_LIMIT.to_string()),
                description: "Page size used when a listing does not ask for one",
            },
            PropertyMeta {
                key: BULK_BATCH_KEY,
                type_name: "usize",
                default_value: Some(DEFAULT_BULK_BATCH_SIZE.to_string()),
                description: "Rows per transaction in bulk inserts",
            },
            PropertyMeta {
                key: CACHE_CAPACITY_KEY,
                type_name: "usize",
                default_value: Some(DEFAULT_PARSE_CACHE_CAPACITY.to_string()),
                description: "Filter and sort tokens kept in each parse cache",
            },
        ]
    }

    fn from_config(config: &SylvaConfig) -> Result<Self, ConfigError> {
        let defaults = DataConfig::default();
        let bulk_batch_size = config.get_or(BULK_BATCH_KEY, defaults.bulk_batch_size)?;
        if bulk_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: BULK_BATCH_KEY.to_string(),
                message: "batch size must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            default_limit: config.get_or(PAGE_LIMIT_KEY, defaults.default_limit)?,
            bulk_batch_size,
            parse_cache_capacity: config
                .get_or(CACHE_CAPACITY_KEY, defaults.parse_cache_capacity)?,
        })
    }
}
