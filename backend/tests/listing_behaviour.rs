//! Behavioural tests for paginated listings over the in-memory backend.

use pagination::{PageRequest, Paginated};
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;
use staffdesk::domain::ports::{BackendClient, BackendClientFactory, BackendError, Record, RequestScope};
use staffdesk::domain::{ListFilterConfig, Resource, SortOrder, list_records};
use staffdesk::outbound::memory::{InMemoryBackend, MemoryOperation, record};
use tokio::runtime::Runtime;

struct ListingWorld {
    runtime: Runtime,
    backend: InMemoryBackend,
    client: Box<dyn BackendClient>,
}

#[fixture]
fn world() -> ListingWorld {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let backend = InMemoryBackend::new();
    backend.register_account("lead@example.com", "correct horse", Some("Lead"));
    let token = backend
        .session_for("lead@example.com")
        .expect("registered account has a session");
    let client = backend
        .acquire(&RequestScope::with_access_token(token))
        .expect("client");
    ListingWorld {
        runtime,
        backend,
        client,
    }
}

fn client_row(index: usize, archived: bool) -> Record {
    record(json!({
        "id": format!("00000000-0000-4000-8000-{index:012}"),
        "name": format!("Client {index:03}"),
        "email": format!("client{index}@example.com"),
        "deleted_at": if archived { json!("2026-02-01T08:00:00Z") } else { json!(null) },
    }))
}

fn names(page: &Paginated<Record>) -> Vec<String> {
    page.data
        .iter()
        .filter_map(|row| row.get("name").and_then(|name| name.as_str()))
        .map(str::to_owned)
        .collect()
}

#[given("ninety-five active clients")]
fn ninety_five_active_clients(world: &ListingWorld) {
    world
        .backend
        .seed(Resource::Clients, (1..=95).map(|index| client_row(index, false)));
}

#[when("page three of twenty is listed")]
fn page_three_of_twenty_is_listed(
    world: &ListingWorld,
) -> Result<Paginated<Record>, BackendError> {
    let page = PageRequest::new(3, 20).expect("valid page");
    world.runtime.block_on(list_records(
        world.client.as_ref(),
        "clients",
        page,
        &ListFilterConfig::default(),
    ))
}

#[then("rows forty-one to sixty are returned with page metadata")]
fn rows_forty_one_to_sixty_are_returned(outcome: Result<Paginated<Record>, BackendError>) {
    let page = outcome.expect("listing succeeds");
    let expected: Vec<String> = (41..=60).map(|index| format!("Client {index:03}")).collect();
    assert_eq!(names(&page), expected);

    let meta = page.pagination;
    assert_eq!(meta.page, 3);
    assert_eq!(meta.page_size, 20);
    assert_eq!(meta.total_items, 95);
    assert_eq!(meta.total_pages, 5);
    assert!(meta.has_next_page);
    assert!(meta.has_previous_page);
}

#[rstest]
fn listing_a_middle_page(world: ListingWorld) {
    ninety_five_active_clients(&world);
    let outcome = page_three_of_twenty_is_listed(&world);
    rows_forty_one_to_sixty_are_returned(outcome);
}

#[rstest]
fn a_failed_count_fails_the_whole_listing(world: ListingWorld) {
    ninety_five_active_clients(&world);
    world
        .backend
        .fail_next(MemoryOperation::Count, BackendError::transport("connection reset"));

    let outcome = page_three_of_twenty_is_listed(&world);
    assert!(matches!(outcome, Err(BackendError::Transport { .. })));
}

#[rstest]
fn archived_rows_are_hidden_unless_requested(world: ListingWorld) {
    world.backend.seed(
        Resource::Clients,
        (1..=4).map(|index| client_row(index, index % 2 == 0)),
    );
    let page = PageRequest::default();

    let active = world
        .runtime
        .block_on(list_records(
            world.client.as_ref(),
            "clients",
            page,
            &ListFilterConfig::default(),
        ))
        .expect("listing succeeds");
    assert_eq!(names(&active), ["Client 001", "Client 003"]);

    let everything = ListFilterConfig {
        include_deleted: true,
        ..ListFilterConfig::default()
    };
    let all = world
        .runtime
        .block_on(list_records(world.client.as_ref(), "clients", page, &everything))
        .expect("listing succeeds");
    assert_eq!(all.pagination.total_items, 4);
}

#[rstest]
fn search_and_sort_shape_the_page(world: ListingWorld) {
    world
        .backend
        .seed(Resource::Clients, (1..=12).map(|index| client_row(index, false)));
    let filters = ListFilterConfig {
        search: Some("Client 01".into()),
        search_columns: vec!["name".into(), "email".into()],
        sort_column: Some("name".into()),
        sort_order: SortOrder::Desc,
        ..ListFilterConfig::default()
    };

    let page = world
        .runtime
        .block_on(list_records(
            world.client.as_ref(),
            "clients",
            PageRequest::new(1, 2).expect("valid page"),
            &filters,
        ))
        .expect("listing succeeds");

    assert_eq!(names(&page), ["Client 012", "Client 011"]);
    assert_eq!(page.pagination.total_items, 3);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(!page.pagination.has_previous_page);
}

#[rstest]
fn pages_past_the_end_are_empty_but_counted(world: ListingWorld) {
    ninety_five_active_clients(&world);
    let outcome = world.runtime.block_on(list_records(
        world.client.as_ref(),
        "clients",
        PageRequest::new(9, 20).expect("valid page"),
        &ListFilterConfig::default(),
    ));
    let page = outcome.expect("listing succeeds");
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total_items, 95);
    assert!(!page.pagination.has_next_page);
}
