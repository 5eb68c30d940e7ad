use super::{ConfigError, SylvaConfig};

/// Metadata about a single configuration property.
#[derive(Debug, Clone)]
pub struct PropertyMeta {
    /// Absolute key (e.g., `"sylva.data.page.limit"`).
    pub key: &'static str,
    /// Rust type name (e.g., `"u64"`).
    pub type_name: &'static str,
    /// Default value as a string, if any.
    pub default_value: Option<String>,
    pub description: &'static str,
}

/// Trait for strongly-typed configuration sections.
///
/// ```ignore
/// impl ConfigProperties for PoolConfig {
///     fn prefix() -> &'static str { "sylva.pool" }
///     fn properties_metadata() -> Vec<PropertyMeta> { vec![] }
///     fn from_config(config: &SylvaConfig) -> Result<Self, ConfigError> {
///         Ok(Self { size: config.get_or("sylva.pool.size", 10)? })
///     }
/// }
/// ```
pub trait ConfigProperties: Sized {
    /// The configuration key prefix (e.g., `"sylva.data"`).
    fn prefix() -> &'static str;

    /// Metadata about all expected properties.
    fn properties_metadata() -> Vec<PropertyMeta>;

    /// Construct from a loaded configuration.
    fn from_config(config: &SylvaConfig) -> Result<Self, ConfigError>;
}
