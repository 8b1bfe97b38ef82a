//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every handler runs a domain action and renders its outcome with
//! [`error::ActionResponse`], so clients always receive the `ActionResult`
//! envelope.

pub mod auth;
pub mod error;
pub mod health;
pub mod reports;
pub mod resources;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;

use actix_web::{Scope, web};

use crate::domain::{AssignmentInput, ClientInput, LocationInput, WorkerInput};

pub use error::{ActionResponse, ApiResult};
pub use state::HttpState;

/// Versioned API routes with extractor errors mapped onto the envelope.
///
/// Callers supply [`HttpState`] as app data and wrap the scope in a session
/// middleware.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(resources::resource_scope::<ClientInput>())
        .service(resources::resource_scope::<WorkerInput>())
        .service(resources::resource_scope::<LocationInput>())
        .service(resources::resource_scope::<AssignmentInput>())
        .service(auth::auth_scope())
        .service(reports::reports_scope())
}
