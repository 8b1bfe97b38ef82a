//! Account endpoints.
//!
//! The identity provider's session never leaves the server: sign-in and
//! registration store the access token in the session cookie and return the
//! user only.

use actix_web::{Scope, web};

use super::error::ActionResponse;
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::AuthSession;
use crate::domain::{
    ActionResult, AuthenticatedUser, PasswordResetRequest, PasswordUpdateInput, RegisterInput,
    Registration, SignInInput,
};

/// Routes mounted at `/auth`.
pub fn auth_scope() -> Scope {
    web::scope("/auth")
        .route("/sign-in", web::post().to(sign_in))
        .route("/register", web::post().to(register))
        .route("/password-reset", web::post().to(request_password_reset))
        .route("/password", web::put().to(update_password))
        .route("/sign-out", web::post().to(sign_out))
        .route("/me", web::get().to(current_user))
}

/// Store the issued session, turning a cookie failure into the action's
/// failure.
fn keep_session<T>(
    session: &SessionContext,
    issued: Option<&AuthSession>,
    result: ActionResult<T>,
) -> ActionResult<T> {
    let Some(issued) = issued else {
        return result;
    };
    match session.persist(issued) {
        Ok(()) => result,
        Err(error) => ActionResult::from_error(error),
    }
}

async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInInput>,
) -> ActionResponse<AuthenticatedUser> {
    let outcome = state
        .auth
        .sign_in
        .run(&session.scope(), payload.into_inner())
        .await;
    outcome
        .map(|result| match result {
            ActionResult::Success { data } => {
                keep_session(&session, Some(&data), ActionResult::success(data.user.clone()))
            }
            ActionResult::Failure { error } => ActionResult::from_error(error),
        })
        .into()
}

async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterInput>,
) -> ActionResponse<Registration> {
    let outcome = state
        .auth
        .register
        .run(&session.scope(), payload.into_inner())
        .await;
    outcome
        .map(|result| match result {
            ActionResult::Success { data } => {
                let issued = data.session.clone();
                keep_session(&session, issued.as_ref(), ActionResult::success(data))
            }
            failure @ ActionResult::Failure { .. } => failure,
        })
        .into()
}

async fn request_password_reset(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PasswordResetRequest>,
) -> ActionResponse<()> {
    state
        .auth
        .request_password_reset
        .run(&session.scope(), payload.into_inner())
        .await
        .into()
}

async fn update_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PasswordUpdateInput>,
) -> ActionResponse<AuthenticatedUser> {
    state
        .auth
        .update_password
        .run(&session.scope(), payload.into_inner())
        .await
        .into()
}

/// The cookie is cleared whatever the provider answers.
async fn sign_out(state: web::Data<HttpState>, session: SessionContext) -> ActionResponse<()> {
    let outcome = state.auth.sign_out.run(&session.scope(), ()).await;
    session.clear();
    outcome.into()
}

async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ActionResponse<AuthenticatedUser> {
    state
        .auth
        .current_user
        .run(&session.scope(), ())
        .await
        .into()
}
