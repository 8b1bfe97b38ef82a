//! Translation of [`TableQuery`] into data-API URL parameters.

use crate::domain::query::{QueryFilter, TableQuery};

/// URL query pairs selecting the rows described by `query`.
pub(super) fn query_params(query: &TableQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_owned(), "*".to_owned())];
    params.extend(filter_params(query));

    if !query.ordering().is_empty() {
        let order = query
            .ordering()
            .iter()
            .map(|clause| format!("{}.{}", clause.column, clause.order.as_str()))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_owned(), order));
    }

    if let Some(range) = query.range() {
        params.push(("offset".to_owned(), range.offset.to_string()));
        params.push(("limit".to_owned(), range.limit.to_string()));
    }
    params
}

/// URL query pairs for the filters of `query` alone, as used by mutations.
pub(super) fn filter_params(query: &TableQuery) -> Vec<(String, String)> {
    query
        .filters()
        .iter()
        .map(|filter| match filter {
            QueryFilter::IsNull { column } => (column.clone(), "is.null".to_owned()),
            QueryFilter::NotNull { column } => (column.clone(), "not.is.null".to_owned()),
            QueryFilter::Eq { column, value } => (column.clone(), format!("eq.{value}")),
            QueryFilter::Search(search) => ("or".to_owned(), format!("({search})")),
        })
        .collect()
}

/// Total from a `Content-Range` header such as `0-19/95` or `*/0`.
pub(super) fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.split_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{
        FilterableQuery, ListFilterConfig, SortOrder, apply_list_filters,
    };
    use rstest::rstest;

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    #[rstest]
    fn list_query_renders_filters_order_and_range() {
        let config = ListFilterConfig {
            search: Some("ada".into()),
            search_columns: vec!["first_name".into(), "email".into()],
            sort_column: Some("last_name".into()),
            sort_order: SortOrder::Desc,
            ..ListFilterConfig::default()
        };
        let query = apply_list_filters(TableQuery::new("workers"), &config).with_range(40, 20);

        assert_eq!(
            pairs(&query_params(&query)),
            vec![
                ("select", "*"),
                ("deleted_at", "is.null"),
                ("or", "(first_name.ilike.%ada%,email.ilike.%ada%)"),
                ("order", "last_name.desc"),
                ("offset", "40"),
                ("limit", "20"),
            ]
        );
    }

    #[rstest]
    fn mutation_filters_skip_select_and_ordering() {
        let query = TableQuery::new("clients")
            .filter_eq("id", "7f0c")
            .not_null("deleted_at")
            .order("name", SortOrder::Asc);
        assert_eq!(
            pairs(&filter_params(&query)),
            vec![("id", "eq.7f0c"), ("deleted_at", "not.is.null")]
        );
    }

    #[rstest]
    #[case("0-19/95", Some(95))]
    #[case("*/0", Some(0))]
    #[case("0-19/*", None)]
    #[case("garbage", None)]
    fn content_range_totals(#[case] header: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_content_range_total(header), expected);
    }
}
