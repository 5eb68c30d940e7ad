use serde::Deserialize;

use crate::coerce::coerce;
use crate::descriptor::RecordDescriptor;
use crate::error::DataError;
use crate::parse::{parse_filter, parse_sort, FilterExpression, FilterOp, SortExpression};
use crate::statement::{SqlWriter, Statement};
use crate::value::SqlValue;

/// Default page size when the caller does not ask for one.
pub const DEFAULT_LIMIT: u64 = 100;

/// SQL flavour used when rendering statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    /// Map a driver backend name (`"PostgreSQL"`, `"SQLite"`, `"MySQL"`, ...)
    /// to a dialect.
    pub fn from_backend_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Dialect::Postgres,
            "sqlite" => Dialect::Sqlite,
            "mysql" | "mariadb" => Dialect::MySql,
            _ => Dialect::Generic,
        }
    }

    pub(crate) fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// Quote an already-validated identifier.
    pub fn quote(self, ident: &str) -> String {
        let quote = self.quote_char();
        format!("{quote}{ident}{quote}")
    }

    /// Whether `INSERT ... RETURNING *` is available.
    pub fn supports_returning(self) -> bool {
        !matches!(self, Dialect::MySql)
    }

    /// Most bind parameters a single statement may carry.
    pub fn max_bind_params(self) -> usize {
        match self {
            Dialect::Postgres | Dialect::MySql => 65_535,
            Dialect::Sqlite => 32_766,
            Dialect::Generic => 999,
        }
    }

    pub(crate) fn empty_insert(self) -> &'static str {
        match self {
            Dialect::MySql => " () VALUES ()",
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => " DEFAULT VALUES",
        }
    }

    fn text_type(self) -> &'static str {
        match self {
            Dialect::MySql => "CHAR",
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => "TEXT",
        }
    }

    /// Case-insensitive pattern operator. SQLite's `LIKE` and MySQL's default
    /// collations already ignore case.
    fn ilike(self) -> &'static str {
        match self {
            Dialect::Postgres => "ILIKE",
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "LIKE",
        }
    }

    /// `limit == 0` renders no bound at all.
    fn push_limit_offset(self, sql: &mut String, limit: u64, offset: u64) {
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            return;
        }
        if offset == 0 {
            return;
        }
        match self {
            Dialect::Postgres => sql.push_str(&format!(" OFFSET {offset}")),
            Dialect::MySql => sql.push_str(&format!(" LIMIT {} OFFSET {offset}", u64::MAX)),
            Dialect::Generic | Dialect::Sqlite => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
        }
    }
}

/// One element of a filter list: a single token, or an OR-group of tokens.
///
/// Deserializes from the JSON forms `"status=Y"` and `["status=Y", "status=N"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilterInput {
    Token(String),
    AnyOf(Vec<String>),
}

impl From<&str> for FilterInput {
    fn from(token: &str) -> Self {
        FilterInput::Token(token.to_string())
    }
}

impl From<String> for FilterInput {
    fn from(token: String) -> Self {
        FilterInput::Token(token)
    }
}

impl<S: Into<String>> From<Vec<S>> for FilterInput {
    fn from(tokens: Vec<S>) -> Self {
        FilterInput::AnyOf(tokens.into_iter().map(Into::into).collect())
    }
}

/// A resolved, column-checked condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: FilterOp,
        value: SqlValue,
    },
    /// `column IS [NOT] TRUE|FALSE`
    Is {
        column: String,
        value: bool,
        negated: bool,
    },
    /// Case-insensitive substring match on any of `columns`, each cast to text.
    Search {
        columns: Vec<String>,
        pattern: String,
    },
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    fn render(&self, w: &mut SqlWriter) {
        match self {
            Predicate::Compare { column, op, value } => {
                w.push_ident(column);
                w.push(" ");
                w.push(op.as_str());
                w.push(" ");
                w.push_value(value.clone());
            }
            Predicate::Is {
                column,
                value,
                negated,
            } => {
                w.push_ident(column);
                w.push(if *negated { " IS NOT " } else { " IS " });
                w.push(if *value { "TRUE" } else { "FALSE" });
            }
            Predicate::Search { columns, pattern } => {
                let dialect = w.dialect();
                w.push("(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        w.push(" OR ");
                    }
                    w.push("CAST(");
                    w.push_ident(column);
                    w.push(" AS ");
                    w.push(dialect.text_type());
                    w.push(") ");
                    w.push(dialect.ilike());
                    w.push(" ");
                    w.push_value(SqlValue::Text(pattern.clone()));
                }
                w.push(")");
            }
            Predicate::AnyOf(alternatives) => {
                w.push("(");
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        w.push(" OR ");
                    }
                    alternative.render(w);
                }
                w.push(")");
            }
        }
    }
}

/// An immutable, fully validated query: predicates (AND-ed), grouping,
/// ordering, and the page window.
///
/// The count and data statements are rendered from the same predicate list,
/// so they always agree on which rows match.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    table: String,
    predicates: Vec<Predicate>,
    group_by: Option<String>,
    order: Vec<SortExpression>,
    limit: u64,
    offset: u64,
}

impl QueryPlan {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn order(&self) -> &[SortExpression] {
        &self.order
    }

    /// `0` means unbounded.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The same plan over a different page window.
    pub fn with_window(mut self, limit: u64, offset: u64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    fn push_where(&self, w: &mut SqlWriter) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            w.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.render(w);
        }
    }

    fn push_group_by(&self, w: &mut SqlWriter) {
        if let Some(column) = &self.group_by {
            w.push(" GROUP BY ");
            w.push_ident(column);
        }
    }

    /// Row count ignoring ordering and the page window. With a group-by
    /// column this counts groups.
    pub fn count_statement(&self, dialect: Dialect) -> Statement {
        let mut w = SqlWriter::new(dialect);
        if self.group_by.is_some() {
            w.push("SELECT COUNT(*) FROM (SELECT 1 FROM ");
            w.push_ident(&self.table);
            self.push_where(&mut w);
            self.push_group_by(&mut w);
            w.push(") AS grouped");
        } else {
            w.push("SELECT COUNT(*) FROM ");
            w.push_ident(&self.table);
            self.push_where(&mut w);
        }
        w.finish()
    }

    /// The page of rows: predicates, grouping, ordering, limit and offset.
    pub fn select_statement(&self, dialect: Dialect) -> Statement {
        let mut w = SqlWriter::new(dialect);
        w.push("SELECT * FROM ");
        w.push_ident(&self.table);
        self.push_where(&mut w);
        self.push_group_by(&mut w);
        for (i, sort) in self.order.iter().enumerate() {
            w.push(if i == 0 { " ORDER BY " } else { ", " });
            w.push_ident(&sort.column);
            w.push(" ");
            w.push(sort.direction.sql());
        }
        let mut stmt = w.finish();
        dialect.push_limit_offset(&mut stmt.sql, self.limit, self.offset);
        stmt
    }
}

/// A fluent builder turning filter/sort tokens into a [`QueryPlan`] for one
/// record type.
///
/// # Example
///
/// ```ignore
/// let plan = QueryBuilder::new(&descriptor)
///     .any_of(["status=Y", "status=N"])
///     .filter("year=2024")
///     .sort("name:asc")
///     .search("lestari")
///     .limit(10)
///     .build()?;
/// let count = plan.count_statement(Dialect::Postgres);
/// let page = plan.select_statement(Dialect::Postgres);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder<'d> {
    descriptor: &'d RecordDescriptor,
    filters: Vec<FilterInput>,
    sort: Vec<String>,
    search: String,
    searchable_columns: Vec<String>,
    group_by: Option<String>,
    limit: u64,
    offset: u64,
}

impl<'d> QueryBuilder<'d> {
    pub fn new(descriptor: &'d RecordDescriptor) -> Self {
        Self {
            descriptor,
            filters: Vec::new(),
            sort: Vec::new(),
            search: String::new(),
            searchable_columns: Vec::new(),
            group_by: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn filter(mut self, token: impl Into<String>) -> Self {
        self.filters.push(FilterInput::Token(token.into()));
        self
    }

    /// Add an OR-group: at least one of `tokens` must hold.
    pub fn any_of<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters
            .push(FilterInput::AnyOf(tokens.into_iter().map(Into::into).collect()));
        self
    }

    pub fn filters(mut self, inputs: impl IntoIterator<Item = FilterInput>) -> Self {
        self.filters.extend(inputs);
        self
    }

    pub fn sort(mut self, token: impl Into<String>) -> Self {
        self.sort.push(token.into());
        self
    }

    pub fn sorts<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    /// Restrict search to these columns. Empty means every column.
    pub fn searchable_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    /// Page size; `0` returns every matching row.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Parse, validate and assemble the plan.
    pub fn build(&self) -> Result<QueryPlan, DataError> {
        let d = self.descriptor;
        let marker = d.soft_delete_column();
        let mut targets_marker = false;
        let mut predicates = Vec::with_capacity(self.filters.len() + 2);

        for input in &self.filters {
            match input {
                FilterInput::Token(token) => {
                    let expr = parse_filter(token)?;
                    targets_marker |= marker == Some(expr.column.as_str());
                    predicates.push(self.compile(&expr)?);
                }
                FilterInput::AnyOf(tokens) => {
                    let mut alternatives = Vec::with_capacity(tokens.len());
                    for token in tokens {
                        let expr = parse_filter(token)?;
                        targets_marker |= marker == Some(expr.column.as_str());
                        alternatives.push(self.compile(&expr)?);
                    }
                    if !alternatives.is_empty() {
                        predicates.push(Predicate::AnyOf(alternatives));
                    }
                }
            }
        }

        if let Some(marker) = marker {
            if !targets_marker {
                predicates.push(Predicate::Is {
                    column: marker.to_string(),
                    value: false,
                    negated: false,
                });
            }
        }

        if !self.search.is_empty() {
            let columns: Vec<String> = if self.searchable_columns.is_empty() {
                d.column_names().map(str::to_string).collect()
            } else {
                for column in &self.searchable_columns {
                    d.require_column(column)?;
                }
                self.searchable_columns.clone()
            };
            // A descriptor without columns adds no condition at all.
            if !columns.is_empty() {
                predicates.push(Predicate::Search {
                    columns,
                    pattern: format!("%{}%", self.search),
                });
            }
        }

        if let Some(column) = &self.group_by {
            d.require_column(column)?;
        }

        let mut order = Vec::with_capacity(self.sort.len().max(1));
        for token in &self.sort {
            let sort = parse_sort(token)?;
            d.require_column(&sort.column)?;
            order.push(sort);
        }
        if order.is_empty() {
            order.push(SortExpression::asc(d.id_column()));
        }

        Ok(QueryPlan {
            table: d.table().to_string(),
            predicates,
            group_by: self.group_by.clone(),
            order,
            limit: self.limit,
            offset: self.offset,
        })
    }

    fn compile(&self, expr: &FilterExpression) -> Result<Predicate, DataError> {
        let d = self.descriptor;
        d.require_column(&expr.column)?;
        match coerce(d.id_column(), &expr.column, &expr.value) {
            SqlValue::Bool(value) => match expr.op {
                FilterOp::Eq => Ok(Predicate::Is {
                    column: expr.column.clone(),
                    value,
                    negated: false,
                }),
                FilterOp::NotEq => Ok(Predicate::Is {
                    column: expr.column.clone(),
                    value,
                    negated: true,
                }),
                op => Err(DataError::Validation(format!(
                    "Invalid operator '{op}' for boolean value on {}",
                    expr.column
                ))),
            },
            value => Ok(Predicate::Compare {
                column: expr.column.clone(),
                op: expr.op,
                value,
            }),
        }
    }
}
