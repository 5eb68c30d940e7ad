use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::{Column, ColumnType, Entity};
use crate::error::DataError;

/// Static metadata about one record type: table, columns, identifier column,
/// and soft-delete / active markers.
///
/// Built once per entity binding and shared read-only behind an `Arc`.
/// Column lookups are hash lookups.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    table: String,
    id_column: String,
    columns: Vec<(String, ColumnType)>,
    index: HashMap<String, ColumnType>,
    soft_delete: Option<String>,
    active: Option<String>,
}

impl RecordDescriptor {
    /// Introspect an [`Entity`] implementation.
    pub fn of<T: Entity>() -> Result<Self, DataError> {
        let mut builder = RecordDescriptor::builder(T::table_name()).id_column(T::id_column());
        for Column { name, ty } in T::columns() {
            builder = builder.column(name, *ty);
        }
        if let Some(marker) = T::soft_delete_column() {
            builder = builder.soft_delete(marker);
        }
        if let Some(active) = T::active_column() {
            builder = builder.active(active);
        }
        builder.build()
    }

    /// Same as [`of`](Self::of), wrapped for sharing.
    pub fn describe<T: Entity>() -> Result<Arc<Self>, DataError> {
        Self::of::<T>().map(Arc::new)
    }

    pub fn builder(table: &str) -> RecordDescriptorBuilder {
        RecordDescriptorBuilder {
            table: table.to_string(),
            id_column: "id".to_string(),
            columns: Vec::new(),
            soft_delete: None,
            active: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete.as_deref()
    }

    pub fn active_column(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.index.get(name).copied()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Fail with a validation error unless `name` is a known column.
    pub fn require_column(&self, name: &str) -> Result<(), DataError> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(DataError::Validation(format!(
                "Invalid column: {name} (table {})",
                self.table
            )))
        }
    }
}

/// Builder for ad-hoc descriptors (tests, tables without a Rust record type).
#[derive(Debug, Clone)]
pub struct RecordDescriptorBuilder {
    table: String,
    id_column: String,
    columns: Vec<(String, ColumnType)>,
    soft_delete: Option<String>,
    active: Option<String>,
}

impl RecordDescriptorBuilder {
    pub fn id_column(mut self, name: &str) -> Self {
        self.id_column = name.to_string();
        self
    }

    pub fn column(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.push((name.to_string(), ty));
        self
    }

    pub fn soft_delete(mut self, name: &str) -> Self {
        self.soft_delete = Some(name.to_string());
        self
    }

    pub fn active(mut self, name: &str) -> Self {
        self.active = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<RecordDescriptor, DataError> {
        check_identifier(&self.table, "table")?;

        let mut index = HashMap::with_capacity(self.columns.len());
        for (name, ty) in &self.columns {
            check_identifier(name, "column")?;
            if index.insert(name.clone(), *ty).is_some() {
                return Err(DataError::Validation(format!(
                    "Duplicate column {name} in table {}",
                    self.table
                )));
            }
        }

        let declared = |name: &str, role: &str| {
            if index.contains_key(name) {
                Ok(())
            } else {
                Err(DataError::Validation(format!(
                    "{role} column {name} is not a column of table {}",
                    self.table
                )))
            }
        };
        declared(&self.id_column, "Identifier")?;
        if let Some(marker) = &self.soft_delete {
            declared(marker, "Soft-delete")?;
        }
        if let Some(active) = &self.active {
            declared(active, "Active")?;
        }

        Ok(RecordDescriptor {
            table: self.table,
            id_column: self.id_column,
            columns: self.columns,
            index,
            soft_delete: self.soft_delete,
            active: self.active,
        })
    }
}

fn check_identifier(ident: &str, kind: &str) -> Result<(), DataError> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(DataError::Validation(format!("Invalid {kind} identifier: {ident}")))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
