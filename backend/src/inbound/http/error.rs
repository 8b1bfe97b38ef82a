//! HTTP adapter mapping for action outcomes.
//!
//! Purpose: keep the domain error type HTTP-agnostic while letting Actix
//! handlers turn action outcomes into the JSON [`ActionResult`] envelope with
//! a status code matching the error code. Navigation signals become redirects.

use actix_web::body::BoxBody;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use serde::Serialize;
use tracing::error;

use crate::domain::action::GENERIC_FAILURE_MESSAGE;
use crate::domain::{ActionResult, Error, ErrorCode, NavigationSignal};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Raw outcome of [`crate::domain::Action::run`].
pub type ActionOutcome<T> = Result<ActionResult<T>, NavigationSignal>;

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
        ErrorCode::DuplicateEntry | ErrorCode::HasDependencies => StatusCode::CONFLICT,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotAuthenticated
        | ErrorCode::SessionExpired
        | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        Error::internal(GENERIC_FAILURE_MESSAGE)
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ActionResult::<()>::from_error(redact_if_internal(self)))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(GENERIC_FAILURE_MESSAGE)
    }
}

/// Responder rendering an action outcome.
///
/// Successes are `200 OK` with the envelope; failures use [`status_for`];
/// redirects are `303 See Other`.
pub struct ActionResponse<T>(ActionOutcome<T>);

impl<T> From<ActionOutcome<T>> for ActionResponse<T> {
    fn from(outcome: ActionOutcome<T>) -> Self {
        Self(outcome)
    }
}

impl<T: Serialize> Responder for ActionResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        match self.0 {
            Ok(ActionResult::Success { data }) => HttpResponse::Ok().json(ActionResult::success(data)),
            Ok(ActionResult::Failure { error }) => error.error_response(),
            Err(NavigationSignal::Redirect { location }) => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, location))
                .finish(),
            Err(NavigationSignal::NotFound) => {
                Error::not_found("The requested page was not found").error_response()
            }
        }
    }
}

/// Reject malformed JSON bodies with a validation failure.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::validation("The request body is not valid JSON")
        .with_detail("reason", err.to_string())
        .into()
}

/// Reject malformed query strings with a validation failure.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::validation("The query string is not valid")
        .with_detail("reason", err.to_string())
        .into()
}

/// Treat unparsable path segments (e.g. a malformed id) as missing records.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "path rejected");
    Error::not_found("The requested record was not found").into()
}

#[cfg(test)]
mod tests;
