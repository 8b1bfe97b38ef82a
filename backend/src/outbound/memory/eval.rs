//! Evaluation of [`TableQuery`] descriptions against in-memory rows.

use std::cmp::Ordering;

use serde_json::Value;

use crate::domain::ports::Record;
use crate::domain::query::{OrderClause, QueryFilter, SortOrder, TableQuery};

/// Rows of `rows` matching every filter of `query`, ordered and windowed.
pub(super) fn evaluate(rows: &[Record], query: &TableQuery) -> Vec<Record> {
    let mut selected: Vec<Record> = rows
        .iter()
        .filter(|row| matches_all(row, query.filters()))
        .cloned()
        .collect();

    if !query.ordering().is_empty() {
        selected.sort_by(|left, right| compare_rows(left, right, query.ordering()));
    }

    match query.range() {
        Some(range) => selected
            .into_iter()
            .skip(usize::try_from(range.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(range.limit).unwrap_or(usize::MAX))
            .collect(),
        None => selected,
    }
}

pub(super) fn matches_all(row: &Record, filters: &[QueryFilter]) -> bool {
    filters.iter().all(|filter| matches(row, filter))
}

fn matches(row: &Record, filter: &QueryFilter) -> bool {
    match filter {
        QueryFilter::IsNull { column } => is_null(row.get(column)),
        QueryFilter::NotNull { column } => !is_null(row.get(column)),
        QueryFilter::Eq { column, value } => {
            value_text(row.get(column)).is_some_and(|text| text == *value)
        }
        QueryFilter::Search(search) => search.columns().iter().any(|column| {
            value_text(row.get(column)).is_some_and(|text| search.matches_text(&text))
        }),
    }
}

pub(super) fn is_null(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Text form of a cell as the data API would compare it in a filter.
pub(super) fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_rows(left: &Record, right: &Record, ordering: &[OrderClause]) -> Ordering {
    ordering
        .iter()
        .map(|clause| {
            let ordering = compare_values(left.get(&clause.column), right.get(&clause.column));
            match clause.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Nulls sort after every value, as PostgreSQL does for ascending order.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (is_null(left), is_null(right)) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => {
            let left = left.as_f64().unwrap_or_default();
            let right = right.as_f64().unwrap_or_default();
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        _ => value_text(left).cmp(&value_text(right)),
    }
}
