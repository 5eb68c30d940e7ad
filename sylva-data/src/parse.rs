//! Filter and sort token parsing.
//!
//! Filter tokens look like `column=value`, `column!=value`, `column>=value`
//! or `column<=value`; sort tokens look like `column:asc` / `column:desc`.
//! Parsing is syntax-only (columns are checked by the query builder) and
//! memoized in process-wide [`BoundedCache`]s keyed by the raw token.

use std::fmt;
use std::sync::OnceLock;

use crate::cache::BoundedCache;
use crate::error::DataError;

/// Default number of cached tokens per token kind.
pub const DEFAULT_PARSE_CACHE_CAPACITY: usize = 256;

/// Comparison operator of a filter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gte,
    Lte,
}

impl FilterOp {
    /// Scan order: compound operators before the bare `=`, so that
    /// `col!=value` never splits as `col!` / `value`.
    pub const SCAN_ORDER: [FilterOp; 4] = [FilterOp::NotEq, FilterOp::Gte, FilterOp::Lte, FilterOp::Eq];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `column op value` filter token. The value is still raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterExpression {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A parsed `column:direction` sort token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortExpression {
    pub column: String,
    pub direction: SortDirection,
}

impl SortExpression {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

static PARSE_CACHE_CAPACITY: OnceLock<usize> = OnceLock::new();
static FILTER_CACHE: OnceLock<BoundedCache<String, FilterExpression>> = OnceLock::new();
static SORT_CACHE: OnceLock<BoundedCache<String, SortExpression>> = OnceLock::new();

/// Set the capacity of the parse caches.
///
/// Only effective before the first token is parsed; returns `false` if the
/// capacity was already fixed.
pub fn configure_parse_cache(capacity: usize) -> bool {
    PARSE_CACHE_CAPACITY.set(capacity).is_ok()
}

fn cache_capacity() -> usize {
    *PARSE_CACHE_CAPACITY.get_or_init(|| DEFAULT_PARSE_CACHE_CAPACITY)
}

fn filter_cache() -> &'static BoundedCache<String, FilterExpression> {
    FILTER_CACHE.get_or_init(|| BoundedCache::new(cache_capacity()))
}

fn sort_cache() -> &'static BoundedCache<String, SortExpression> {
    SORT_CACHE.get_or_init(|| BoundedCache::new(cache_capacity()))
}

/// Number of filter and sort tokens currently cached.
pub fn parse_cache_len() -> (usize, usize) {
    (filter_cache().len(), sort_cache().len())
}

/// Parse a filter token, consulting the shared cache first.
pub fn parse_filter(token: &str) -> Result<FilterExpression, DataError> {
    filter_cache().get_or_try_insert(&token.to_string(), || parse_filter_uncached(token))
}

/// Parse a sort token, consulting the shared cache first.
pub fn parse_sort(token: &str) -> Result<SortExpression, DataError> {
    sort_cache().get_or_try_insert(&token.to_string(), || parse_sort_uncached(token))
}

pub fn parse_filter_uncached(token: &str) -> Result<FilterExpression, DataError> {
    for op in FilterOp::SCAN_ORDER {
        if let Some((column, value)) = token.split_once(op.as_str()) {
            return Ok(FilterExpression {
                column: column.trim().to_string(),
                op,
                value: value.trim().to_string(),
            });
        }
    }
    Err(DataError::Syntax(format!(
        "Invalid filter {token:?}: expected 'column=value', 'column!=value', 'column>=value' or 'column<=value'"
    )))
}

pub fn parse_sort_uncached(token: &str) -> Result<SortExpression, DataError> {
    let (column, direction) = token.split_once(':').ok_or_else(|| {
        DataError::Syntax(format!(
            "Invalid sort {token:?}: expected 'column:asc' or 'column:desc'"
        ))
    })?;
    let column = column.trim();
    let direction = match direction.trim().to_lowercase().as_str() {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        other => {
            return Err(DataError::Validation(format!(
                "Invalid sort order '{other}' for {column}"
            )))
        }
    };
    Ok(SortExpression {
        column: column.to_string(),
        direction,
    })
}
