//! CRUD actions shared by every dashboard resource.
//!
//! Each resource gets the same seven actions: list, get, create, update,
//! archive (soft delete), restore and purge (hard delete). Mutations
//! revalidate the resource's dashboard page and the dashboard overview.

use std::marker::PhantomData;

use chrono::Utc;
use pagination::{DEFAULT_PAGE_SIZE, PageRequest, Paginated};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::action::{Action, ActionContext, ActionFailure, ActionOptions, ActionRuntime};
use super::listing::list_records;
use super::ports::{Record, RevalidatePath};
use super::query::{
    DEFAULT_SOFT_DELETE_COLUMN, FilterableQuery, ListFilterConfig, SortOrder, TableQuery,
};
use super::resources::{Resource, ResourceInput};
use super::schema::{InputSchema, ValidatorSchema};
use super::{Error, ValidationFailure, ValidationIssue};

/// Path of the dashboard overview, which shows per-resource counts.
pub const DASHBOARD_PATH: &str = "/dashboard";

const fn default_page() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters of a list action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[serde(default = "default_page")]
    pub page: u32,
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            include_deleted: false,
            sort: None,
            order: None,
        }
    }
}

impl ListParams {
    /// Filter configuration for `resource`, falling back to its default sort.
    pub fn filter_config(&self, resource: Resource) -> ListFilterConfig {
        let (default_column, default_order) = resource.default_sort();
        let (sort_column, sort_order) = match self.sort.as_deref() {
            Some(column) => (column.to_owned(), self.order.unwrap_or_default()),
            None => (default_column.to_owned(), self.order.unwrap_or(default_order)),
        };
        ListFilterConfig {
            search: self.search.clone(),
            search_columns: resource
                .search_columns()
                .iter()
                .map(|column| (*column).to_owned())
                .collect(),
            include_deleted: self.include_deleted,
            soft_delete_column: DEFAULT_SOFT_DELETE_COLUMN.to_owned(),
            sort_column: Some(sort_column),
            sort_order,
        }
    }
}

/// Validates [`ListParams`] and checks the sort column against `resource`.
pub struct ListParamsSchema {
    resource: Resource,
}

impl ListParamsSchema {
    pub fn new(resource: Resource) -> Self {
        Self { resource }
    }
}

impl InputSchema<ListParams> for ListParamsSchema {
    fn validate(&self, input: ListParams) -> Result<ListParams, ValidationFailure> {
        let mut issues = match Validate::validate(&input) {
            Ok(()) => Vec::new(),
            Err(errors) => ValidationFailure::from(&errors).issues,
        };
        let sortable = self.resource.sortable_columns();
        if let Some(column) = input.sort.as_deref().filter(|column| !sortable.contains(column)) {
            issues.push(ValidationIssue::field(
                "sort",
                format!("Cannot sort {} by {column}", self.resource),
            ));
        }
        if issues.is_empty() {
            Ok(input)
        } else {
            Err(ValidationFailure::new(issues))
        }
    }
}

/// Identifies one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: Uuid,
}

/// Replacement values for the editable fields of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate<I> {
    pub id: Uuid,
    pub changes: I,
}

/// Validates the changes of a [`RecordUpdate`] with their own schema.
pub struct RecordUpdateSchema<I>(PhantomData<fn() -> I>);

impl<I> Default for RecordUpdateSchema<I> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<I: Validate> InputSchema<RecordUpdate<I>> for RecordUpdateSchema<I> {
    fn validate(&self, input: RecordUpdate<I>) -> Result<RecordUpdate<I>, ValidationFailure> {
        let RecordUpdate { id, changes } = input;
        let changes = ValidatorSchema::<I>::new().validate(changes)?;
        Ok(RecordUpdate { id, changes })
    }
}

/// Result of a hard delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub id: Uuid,
}

/// The CRUD actions of resource `I::RESOURCE`.
pub struct ResourceActions<I: ResourceInput> {
    pub list: Action<ListParams, Paginated<Record>>,
    pub get: Action<RecordRef, Record>,
    pub create: Action<I, Record>,
    pub update: Action<RecordUpdate<I>, Record>,
    pub archive: Action<RecordRef, Record>,
    pub restore: Action<RecordRef, Record>,
    pub purge: Action<RecordRef, DeletedRecord>,
}

impl<I: ResourceInput> Clone for ResourceActions<I> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            get: self.get.clone(),
            create: self.create.clone(),
            update: self.update.clone(),
            archive: self.archive.clone(),
            restore: self.restore.clone(),
            purge: self.purge.clone(),
        }
    }
}

impl<I: ResourceInput> ResourceActions<I> {
    pub fn new(runtime: &ActionRuntime) -> Self {
        let resource = I::RESOURCE;
        Self {
            list: runtime.create_action(
                "list_records",
                move |params: ListParams, context: ActionContext| list(resource, params, context),
                ActionOptions::default().with_schema(ListParamsSchema::new(resource)),
            ),
            get: runtime.create_action(
                "get_record",
                move |target: RecordRef, context: ActionContext| get(resource, target, context),
                ActionOptions::default(),
            ),
            create: runtime.create_action(
                "create_record",
                move |input: I, context: ActionContext| create(resource, input, context),
                mutation_options(resource).validated(),
            ),
            update: runtime.create_action(
                "update_record",
                move |input: RecordUpdate<I>, context: ActionContext| {
                    update(resource, input, context)
                },
                mutation_options(resource).with_schema(RecordUpdateSchema::<I>::default()),
            ),
            archive: runtime.create_action(
                "archive_record",
                move |target: RecordRef, context: ActionContext| archive(resource, target, context),
                mutation_options(resource),
            ),
            restore: runtime.create_action(
                "restore_record",
                move |target: RecordRef, context: ActionContext| restore(resource, target, context),
                mutation_options(resource),
            ),
            purge: runtime.create_action(
                "purge_record",
                move |target: RecordRef, context: ActionContext| purge(resource, target, context),
                mutation_options(resource),
            ),
        }
    }
}

fn mutation_options<I>(resource: Resource) -> ActionOptions<I> {
    ActionOptions::default()
        .revalidate(RevalidatePath::new(resource.dashboard_path()))
        .revalidate(DASHBOARD_PATH)
}

fn by_id(resource: Resource, id: Uuid) -> TableQuery {
    TableQuery::new(resource.table()).filter_eq("id", id.to_string())
}

fn to_record<T: Serialize>(value: &T) -> Result<Record, ActionFailure> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(Error::internal("Input did not serialise to an object").into()),
        Err(error) => Err(ActionFailure::other(error)),
    }
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

async fn list(
    resource: Resource,
    params: ListParams,
    context: ActionContext,
) -> Result<Paginated<Record>, ActionFailure> {
    let page = PageRequest::new(params.page, params.page_size).map_err(|error| {
        ValidationFailure::single(ValidationIssue::field("pageSize", error.to_string()))
    })?;
    let filters = params.filter_config(resource);
    Ok(list_records(context.client(), resource.table(), page, &filters).await?)
}

async fn get(
    resource: Resource,
    target: RecordRef,
    context: ActionContext,
) -> Result<Record, ActionFailure> {
    Ok(context.client().select_single(&by_id(resource, target.id)).await?)
}

async fn create<I: ResourceInput>(
    resource: Resource,
    input: I,
    context: ActionContext,
) -> Result<Record, ActionFailure> {
    let user = context.require_user()?;
    let mut row = to_record(&input)?;
    row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    row.insert("created_by".into(), Value::String(user.id().to_string()));
    row.insert("created_at".into(), timestamp());
    row.insert("updated_at".into(), timestamp());
    row.insert(DEFAULT_SOFT_DELETE_COLUMN.into(), Value::Null);
    let stored = context.client().insert(resource.table(), row).await?;
    tracing::info!(%resource, "record created");
    Ok(stored)
}

async fn update<I: ResourceInput>(
    resource: Resource,
    input: RecordUpdate<I>,
    context: ActionContext,
) -> Result<Record, ActionFailure> {
    let mut patch = to_record(&input.changes)?;
    patch.insert("updated_at".into(), timestamp());
    let query = by_id(resource, input.id).is_null(DEFAULT_SOFT_DELETE_COLUMN);
    Ok(context.client().update(&query, patch).await?)
}

async fn archive(
    resource: Resource,
    target: RecordRef,
    context: ActionContext,
) -> Result<Record, ActionFailure> {
    let mut patch = Record::new();
    patch.insert(DEFAULT_SOFT_DELETE_COLUMN.into(), timestamp());
    let query = by_id(resource, target.id).is_null(DEFAULT_SOFT_DELETE_COLUMN);
    let archived = context.client().update(&query, patch).await?;
    tracing::info!(%resource, id = %target.id, "record archived");
    Ok(archived)
}

async fn restore(
    resource: Resource,
    target: RecordRef,
    context: ActionContext,
) -> Result<Record, ActionFailure> {
    let mut patch = Record::new();
    patch.insert(DEFAULT_SOFT_DELETE_COLUMN.into(), Value::Null);
    let query = by_id(resource, target.id).not_null(DEFAULT_SOFT_DELETE_COLUMN);
    Ok(context.client().update(&query, patch).await?)
}

async fn purge(
    resource: Resource,
    target: RecordRef,
    context: ActionContext,
) -> Result<DeletedRecord, ActionFailure> {
    let query = by_id(resource, target.id);
    // Delete reports success for zero rows; look the row up first so a
    // missing id surfaces as NOT_FOUND.
    context.client().select_single(&query).await?;
    context.client().delete(&query).await?;
    tracing::info!(%resource, id = %target.id, "record purged");
    Ok(DeletedRecord { id: target.id })
}
