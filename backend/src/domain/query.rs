//! Query descriptions and the list-filter helpers that shape them.
//!
//! A [`TableQuery`] is a backend-neutral description of a row query. Adapters
//! translate it (the PostgREST adapter into URL parameters, the in-memory
//! adapter into predicates). The `apply_*` helpers are generic over
//! [`FilterableQuery`] so they compose against any query-builder-shaped type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column holding the soft-delete timestamp.
pub const DEFAULT_SOFT_DELETE_COLUMN: &str = "deleted_at";

/// Characters with meaning inside a PostgREST logical filter.
const RESERVED_FILTER_CHARS: &[char] = &[',', '.', ':', '(', ')', '"', '\\'];

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Pattern operator used by a search filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive substring match.
    #[default]
    ILike,
    /// Case-sensitive substring match.
    Like,
}

impl MatchMode {
    fn operator(self) -> &'static str {
        match self {
            Self::ILike => "ilike",
            Self::Like => "like",
        }
    }
}

/// Disjunctive substring match of one term across several columns.
///
/// Renders in PostgREST `or` syntax:
///
/// ```
/// use staffdesk::domain::{MatchMode, build_search_filter};
///
/// let filter = build_search_filter(Some("  john "), &["name", "email"], MatchMode::ILike)
///     .expect("non-blank term");
/// assert_eq!(filter.to_string(), "name.ilike.%john%,email.ilike.%john%");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    term: String,
    columns: Vec<String>,
    mode: MatchMode,
}

impl SearchFilter {
    /// Trimmed search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether `text` contains the term under this filter's match mode.
    pub fn matches_text(&self, text: &str) -> bool {
        match self.mode {
            MatchMode::Like => text.contains(&self.term),
            MatchMode::ILike => text.to_lowercase().contains(&self.term.to_lowercase()),
        }
    }

    fn pattern(&self) -> String {
        let pattern = format!("%{}%", self.term);
        if pattern.contains(RESERVED_FILTER_CHARS) {
            let escaped = pattern.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        } else {
            pattern
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = self.pattern();
        let operator = self.mode.operator();
        let clauses: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("{column}.{operator}.{pattern}"))
            .collect();
        f.write_str(&clauses.join(","))
    }
}

/// Build a search filter, or `None` when there is nothing to search for.
///
/// Blank terms and empty column lists both mean "no filter".
pub fn build_search_filter(
    term: Option<&str>,
    columns: &[&str],
    mode: MatchMode,
) -> Option<SearchFilter> {
    let term = term.map(str::trim).filter(|value| !value.is_empty())?;
    if columns.is_empty() {
        return None;
    }
    Some(SearchFilter {
        term: term.to_owned(),
        columns: columns.iter().map(|column| (*column).to_owned()).collect(),
        mode,
    })
}

/// Row predicate carried by a [`TableQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    IsNull { column: String },
    NotNull { column: String },
    Eq { column: String, value: String },
    Search(SearchFilter),
}

/// One ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub order: SortOrder,
}

/// Window of rows to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: u64,
    pub limit: u64,
}

/// Backend-neutral description of a row query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    filters: Vec<QueryFilter>,
    ordering: Vec<OrderClause>,
    range: Option<RowRange>,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            ordering: Vec::new(),
            range: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[OrderClause] {
        &self.ordering
    }

    pub fn range(&self) -> Option<RowRange> {
        self.range
    }

    /// Restrict to rows where `column` equals `value`.
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(QueryFilter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Restrict to rows where `column` is set.
    #[must_use]
    pub fn not_null(mut self, column: impl Into<String>) -> Self {
        self.filters.push(QueryFilter::NotNull {
            column: column.into(),
        });
        self
    }

    /// Return `limit` rows starting at `offset`.
    #[must_use]
    pub fn with_range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some(RowRange { offset, limit });
        self
    }

    /// Copy of this query without ordering or range, as used for counting.
    #[must_use]
    pub fn filters_only(&self) -> Self {
        Self {
            table: self.table.clone(),
            filters: self.filters.clone(),
            ordering: Vec::new(),
            range: None,
        }
    }
}

/// Query builders the list helpers can shape.
pub trait FilterableQuery: Sized {
    /// Restrict to rows where `column` is null.
    #[must_use]
    fn is_null(self, column: &str) -> Self;

    /// Restrict to rows matching any clause of `filter`.
    #[must_use]
    fn or_filter(self, filter: SearchFilter) -> Self;

    /// Append an ordering clause.
    #[must_use]
    fn order(self, column: &str, order: SortOrder) -> Self;
}

impl FilterableQuery for TableQuery {
    fn is_null(mut self, column: &str) -> Self {
        self.filters.push(QueryFilter::IsNull {
            column: column.to_owned(),
        });
        self
    }

    fn or_filter(mut self, filter: SearchFilter) -> Self {
        self.filters.push(QueryFilter::Search(filter));
        self
    }

    fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.ordering.push(OrderClause {
            column: column.to_owned(),
            order,
        });
        self
    }
}

/// Hide soft-deleted rows unless `include_deleted` is set.
pub fn apply_soft_delete_filter<Q: FilterableQuery>(
    query: Q,
    include_deleted: bool,
    column: &str,
) -> Q {
    if include_deleted {
        query
    } else {
        query.is_null(column)
    }
}

pub fn apply_search_filter<Q: FilterableQuery>(query: Q, filter: Option<SearchFilter>) -> Q {
    match filter {
        Some(filter) => query.or_filter(filter),
        None => query,
    }
}

pub fn apply_sort_filter<Q: FilterableQuery>(query: Q, column: &str, order: SortOrder) -> Q {
    query.order(column, order)
}

/// How a list query should be shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilterConfig {
    pub search: Option<String>,
    pub search_columns: Vec<String>,
    pub include_deleted: bool,
    pub soft_delete_column: String,
    pub sort_column: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for ListFilterConfig {
    fn default() -> Self {
        Self {
            search: None,
            search_columns: Vec::new(),
            include_deleted: false,
            soft_delete_column: DEFAULT_SOFT_DELETE_COLUMN.to_owned(),
            sort_column: None,
            sort_order: SortOrder::default(),
        }
    }
}

/// Apply soft-delete, search and sort filters, in that order.
///
/// Sorting is always the last clause so search only ever scans the rows the
/// soft-delete filter kept.
pub fn apply_list_filters<Q: FilterableQuery>(query: Q, config: &ListFilterConfig) -> Q {
    let columns: Vec<&str> = config.search_columns.iter().map(String::as_str).collect();
    let search = build_search_filter(config.search.as_deref(), &columns, MatchMode::ILike);

    let query = apply_soft_delete_filter(query, config.include_deleted, &config.soft_delete_column);
    let query = apply_search_filter(query, search);
    match config.sort_column.as_deref() {
        Some(column) => apply_sort_filter(query, column, config.sort_order),
        None => query,
    }
}
