//! Domain primitives and the action execution core.
//!
//! Purpose: define the contract every dashboard operation is built on. An
//! action returns an [`ActionResult`]; failures are always one of the closed
//! set of [`ErrorCode`]s, whichever collaborator produced them.
//!
//! Public surface:
//! - Error / ErrorCode: the action error taxonomy.
//! - ActionResult: success/failure envelope.
//! - Action, ActionRuntime, ActionOptions: the execution wrapper.
//! - query helpers and `list_records`: filtered, paginated list queries.
//! - ResourceActions, AuthActions, `dashboard_summary_action`: the actions
//!   exposed by the dashboard.

pub mod action;
pub mod action_result;
pub mod auth;
pub mod error;
pub mod error_mapping;
pub mod failures;
pub mod listing;
pub mod ports;
pub mod query;
pub mod reporting;
pub mod resource_actions;
pub mod resources;
pub mod schema;
pub mod user;

pub use self::action::{
    Action, ActionContext, ActionFailure, ActionHandler, ActionOptions, ActionRuntime,
};
pub use self::action_result::ActionResult;
pub use self::auth::{
    AuthActions, PasswordResetRequest, PasswordUpdateInput, RegisterInput, Registration,
    SignInInput,
};
pub use self::error::{Error, ErrorCode, ErrorDetails, ErrorValidationError, create_error};
pub use self::error_mapping::{
    ROOT_FIELD_KEY, map_auth_error, map_database_error, map_validation_error,
};
pub use self::failures::{
    AuthProviderError, DatabaseError, DatabaseErrorKind, NavigationSignal, PathSegment,
    ValidationFailure, ValidationIssue,
};
pub use self::listing::list_records;
pub use self::query::{
    FilterableQuery, ListFilterConfig, MatchMode, SearchFilter, SortOrder, TableQuery,
    apply_list_filters, apply_search_filter, apply_soft_delete_filter, apply_sort_filter,
    build_search_filter,
};
pub use self::reporting::{DashboardSummary, ResourceCount, dashboard_summary_action};
pub use self::resource_actions::{
    DeletedRecord, ListParams, RecordRef, RecordUpdate, ResourceActions,
};
pub use self::resources::{
    AssignmentInput, ClientInput, LocationInput, Resource, ResourceInput, WorkerInput,
};
pub use self::schema::{InputSchema, ValidatorSchema};
pub use self::user::{AuthenticatedUser, UserId, UserValidationError};
