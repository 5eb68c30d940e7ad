/// Declared storage type of a column.
///
/// Filter values are typed by [`coerce`](crate::coerce::coerce) from the token
/// text and search casts every column to text; the declared type of the id
/// column decides how identifiers are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Json,
}

/// A named, typed column of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, ColumnType::Float)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub const fn json(name: &'static str) -> Self {
        Self::new(name, ColumnType::Json)
    }
}

/// Trait representing a flat database record type: table name, identifier
/// column, typed column list, and optional soft-delete / active markers.
///
/// # Example
///
/// ```ignore
/// impl Entity for Permit {
///     type Id = String;
///     fn table_name() -> &'static str { "permits" }
///     fn columns() -> &'static [Column] {
///         const COLUMNS: &[Column] =
///             &[Column::text("id"), Column::text("name"), Column::boolean("is_deleted")];
///         COLUMNS
///     }
///     fn soft_delete_column() -> Option<&'static str> { Some("is_deleted") }
///     fn id(&self) -> &String { &self.id }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    type Id: Send + Sync + ToString + 'static;

    fn table_name() -> &'static str;

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [Column];

    /// Boolean column marking a row as logically deleted.
    fn soft_delete_column() -> Option<&'static str> {
        None
    }

    /// Boolean column cleared alongside the soft-delete marker.
    fn active_column() -> Option<&'static str> {
        None
    }

    fn id(&self) -> &Self::Id;
}
