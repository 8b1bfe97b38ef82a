//! Paginated list queries.

use pagination::{PageRequest, Paginated, paginate_result};

use super::ports::{BackendClient, BackendError, Record};
use super::query::{ListFilterConfig, TableQuery, apply_list_filters};

/// Run a filtered, paginated list query against `table`.
///
/// The count and the page of rows are fetched concurrently; if either fails
/// the whole listing fails and no partial page is returned.
pub async fn list_records(
    client: &dyn BackendClient,
    table: &str,
    page: PageRequest,
    filters: &ListFilterConfig,
) -> Result<Paginated<Record>, BackendError> {
    let filtered = apply_list_filters(TableQuery::new(table), filters);
    let count_query = filtered.filters_only();
    let data_query = filtered.with_range(page.offset(), page.limit());

    let (total_items, rows) =
        tokio::try_join!(client.count(&count_query), client.select(&data_query))?;

    tracing::debug!(
        table,
        page = page.page(),
        page_size = page.page_size(),
        total_items,
        returned = rows.len(),
        "listed records"
    );
    Ok(paginate_result(rows, total_items, page.page(), page.page_size()))
}
