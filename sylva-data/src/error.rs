/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// A filter or sort token is malformed (missing operator, missing `:`).
    Syntax(String),
    /// A token or payload is well-formed but references something the
    /// record type does not support (unknown column, bad direction, ...).
    Validation(String),
    /// The targeted record does not exist.
    NotFound(String),
    /// The backend rejected a write (unique, foreign key, not-null, check).
    Constraint(Box<dyn std::error::Error + Send + Sync>),
    /// Any other backend failure.
    Database(Box<dyn std::error::Error + Send + Sync>),
    /// A bulk insert stopped at `batch`; `committed` rows from earlier
    /// batches remain in the store.
    BatchFailed {
        batch: usize,
        committed: usize,
        source: Box<DataError>,
    },
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `sylva-data-sqlx`) to wrap driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    /// Construct a `Constraint` variant from any error type.
    pub fn constraint(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Constraint(Box::new(err))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        DataError::Validation(msg.into())
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        DataError::Syntax(msg.into())
    }

    /// Whether this error (or the batch failure it wraps) is a constraint violation.
    pub fn is_constraint(&self) -> bool {
        match self {
            DataError::Constraint(_) => true,
            DataError::BatchFailed { source, .. } => source.is_constraint(),
            _ => false,
        }
    }

    /// Whether the caller sent something unusable: a syntax or validation error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DataError::Syntax(_) | DataError::Validation(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Syntax(msg) => write!(f, "Syntax error: {msg}"),
            DataError::Validation(msg) => write!(f, "Validation error: {msg}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Constraint(err) => write!(f, "Constraint violation: {err}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::BatchFailed {
                batch,
                committed,
                source,
            } => write!(
                f,
                "Bulk insert failed at batch {batch} ({committed} rows already committed): {source}"
            ),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl From<sylva_core::ConfigError> for DataError {
    fn from(err: sylva_core::ConfigError) -> Self {
        DataError::Other(format!("Configuration error: {err}"))
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Constraint(err) | DataError::Database(err) => Some(err.as_ref()),
            DataError::BatchFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
