mod loader;
pub mod typed;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use typed::{ConfigProperties, PropertyMeta};
pub use value::{ConfigValue, FromConfigValue};

const PROFILE_ENV: &str = "SYLVA_PROFILE";

#[derive(Debug)]
pub enum ConfigError {
    /// No value under this key.
    NotFound(String),
    TypeMismatch { key: String, expected: &'static str },
    /// Reading or parsing a YAML source failed.
    Load(String),
    /// Well-typed but out of range.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Missing config key '{key}'"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config key '{key}' is not a valid {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Cannot load configuration: {msg}"),
            ConfigError::Invalid { key, message } => write!(f, "Config key '{key}': {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Flat, dot-keyed settings merged from several sources.
///
/// Later sources win:
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env`, then `.env.{profile}` (only fill variables not already set)
/// 4. the process environment, `SYLVA_DATA_PAGE_LIMIT` standing for
///    `sylva.data.page.limit`
///
/// `SYLVA_PROFILE`, when set, replaces the profile passed in.
#[derive(Debug, Clone)]
pub struct SylvaConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl SylvaConfig {
    /// Merge every source found in `dir` for `profile`. Missing files are skipped.
    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("application.yaml"), &mut values)?;
        loader::load_yaml_file(&dir.join(format!("application-{profile}.yaml")), &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{profile}")));
        values.extend(
            std::env::vars()
                .map(|(name, value)| (name.to_lowercase().replace('_', "."), ConfigValue::String(value))),
        );

        tracing::debug!(profile = %profile, keys = values.len(), "configuration loaded");
        Ok(Self { values, profile })
    }

    /// Settings from a single YAML document, without files or environment.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(Self {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Err(ConfigError::NotFound(key.to_string())),
        }
    }

    /// `default` when the key is absent; a present value of the wrong type
    /// is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Read a typed section, e.g. `config.section::<DataConfig>()`.
    pub fn section<C: ConfigProperties>(&self) -> Result<C, ConfigError> {
        C::from_config(self)
    }
}
