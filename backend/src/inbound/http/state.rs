//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain actions and remain testable without I/O.

use crate::domain::{
    Action, ActionRuntime, AssignmentInput, AuthActions, ClientInput, DashboardSummary,
    LocationInput, ResourceActions, ResourceInput, WorkerInput, dashboard_summary_action,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub clients: ResourceActions<ClientInput>,
    pub workers: ResourceActions<WorkerInput>,
    pub locations: ResourceActions<LocationInput>,
    pub assignments: ResourceActions<AssignmentInput>,
    pub auth: AuthActions,
    pub dashboard: Action<(), DashboardSummary>,
}

impl HttpState {
    /// Build every action against one runtime.
    pub fn new(runtime: &ActionRuntime) -> Self {
        Self {
            clients: ResourceActions::new(runtime),
            workers: ResourceActions::new(runtime),
            locations: ResourceActions::new(runtime),
            assignments: ResourceActions::new(runtime),
            auth: AuthActions::new(runtime),
            dashboard: dashboard_summary_action(runtime),
        }
    }
}

/// Resource inputs the HTTP adapter exposes, with the state slot holding
/// their actions.
pub trait RoutedResource: ResourceInput {
    fn actions(state: &HttpState) -> &ResourceActions<Self>;
}

impl RoutedResource for ClientInput {
    fn actions(state: &HttpState) -> &ResourceActions<Self> {
        &state.clients
    }
}

impl RoutedResource for WorkerInput {
    fn actions(state: &HttpState) -> &ResourceActions<Self> {
        &state.workers
    }
}

impl RoutedResource for LocationInput {
    fn actions(state: &HttpState) -> &ResourceActions<Self> {
        &state.locations
    }
}

impl RoutedResource for AssignmentInput {
    fn actions(state: &HttpState) -> &ResourceActions<Self> {
        &state.assignments
    }
}
