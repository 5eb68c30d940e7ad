use serde::Deserialize;

use crate::descriptor::RecordDescriptor;
use crate::error::DataError;
use crate::query::{FilterInput, QueryBuilder, DEFAULT_LIMIT};

/// Listing parameters as they arrive from a query string.
///
/// `filter` and `sort` are either JSON (`"status=Y"`,
/// `["status=Y", ["year=2023", "year=2024"]]`) or a bare token (`status=Y`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub group_by: Option<String>,
    /// `None` falls back to the configured page size.
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: u64,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            filter: None,
            sort: None,
            search: String::new(),
            group_by: None,
            limit: None,
            offset: 0,
        }
    }
}

impl QueryParams {
    /// Decode `filter` into builder inputs. A value that is not valid JSON,
    /// or JSON that is neither a string nor a list, is taken as one raw token.
    pub fn filter_inputs(&self) -> Result<Vec<FilterInput>, DataError> {
        let raw = match self.filter.as_deref() {
            None | Some("") => return Ok(Vec::new()),
            Some(raw) => raw,
        };
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::String(token)) => Ok(vec![FilterInput::Token(token)]),
            Ok(list @ serde_json::Value::Array(_)) => serde_json::from_value(list).map_err(|e| {
                DataError::Syntax(format!(
                    "Invalid filter list {raw:?}: expected tokens or lists of tokens ({e})"
                ))
            }),
            _ => Ok(vec![FilterInput::Token(raw.to_string())]),
        }
    }

    /// Decode `sort` into sort tokens, with the same JSON-or-raw rule.
    pub fn sort_tokens(&self) -> Result<Vec<String>, DataError> {
        let raw = match self.sort.as_deref() {
            None | Some("") => return Ok(Vec::new()),
            Some(raw) => raw,
        };
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::String(token)) => Ok(vec![token]),
            Ok(list @ serde_json::Value::Array(_)) => serde_json::from_value(list).map_err(|e| {
                DataError::Syntax(format!("Invalid sort list {raw:?}: expected tokens ({e})"))
            }),
            _ => Ok(vec![raw.to_string()]),
        }
    }

    /// Load these parameters into a builder for `descriptor`, defaulting the
    /// page size to [`DEFAULT_LIMIT`].
    pub fn to_builder<'d>(
        &self,
        descriptor: &'d RecordDescriptor,
    ) -> Result<QueryBuilder<'d>, DataError> {
        self.to_builder_with_limit(descriptor, DEFAULT_LIMIT)
    }

    /// Like [`to_builder`](Self::to_builder), with `default_limit` used when
    /// no `limit` was given.
    pub fn to_builder_with_limit<'d>(
        &self,
        descriptor: &'d RecordDescriptor,
        default_limit: u64,
    ) -> Result<QueryBuilder<'d>, DataError> {
        let mut builder = QueryBuilder::new(descriptor)
            .filters(self.filter_inputs()?)
            .sorts(self.sort_tokens()?)
            .search(self.search.clone())
            .limit(self.limit.unwrap_or(default_limit))
            .offset(self.offset);
        if let Some(column) = &self.group_by {
            builder = builder.group_by(column.clone());
        }
        Ok(builder)
    }
}
