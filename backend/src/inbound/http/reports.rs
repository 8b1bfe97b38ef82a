//! Dashboard reporting endpoint.

use actix_web::{Scope, web};

use super::error::ActionResponse;
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::DashboardSummary;

/// Routes mounted at `/reports`.
pub fn reports_scope() -> Scope {
    web::scope("/reports").route("/dashboard", web::get().to(dashboard))
}

async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ActionResponse<DashboardSummary> {
    state.dashboard.run(&session.scope(), ()).await.into()
}
