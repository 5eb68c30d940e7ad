use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A page of results with pagination metadata.
///
/// `has_more` is always derived from `total`, `limit` and `offset`; it is
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching rows ignoring the page window.
    pub total: u64,
    /// `0` means the page was unbounded; `has_more` still compares against it.
    pub limit: u64,
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, limit: u64, offset: u64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn empty(limit: u64, offset: u64) -> Self {
        Self::new(Vec::new(), 0, limit, offset)
    }

    /// `total > offset + limit`, for every window including `limit == 0`.
    pub fn has_more(&self) -> bool {
        self.total > self.offset.saturating_add(self.limit)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Page", 5)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("limit", &self.limit)?;
        state.serialize_field("offset", &self.offset)?;
        state.serialize_field("has_more", &self.has_more())?;
        state.end()
    }
}
