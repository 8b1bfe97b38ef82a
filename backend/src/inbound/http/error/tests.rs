//! Tests for HTTP outcome mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::test::TestRequest;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde_json::{Value, json};

#[fixture]
fn duplicate_error() -> Error {
    Error::new(ErrorCode::DuplicateEntry, "A record with this email already exists")
        .with_detail("field", "email")
}

async fn body_json(response: HttpResponse) -> Value {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

#[rstest]
#[case::not_found(ErrorCode::NotFound, StatusCode::NOT_FOUND)]
#[case::validation(ErrorCode::ValidationError, StatusCode::BAD_REQUEST)]
#[case::duplicate(ErrorCode::DuplicateEntry, StatusCode::CONFLICT)]
#[case::dependencies(ErrorCode::HasDependencies, StatusCode::CONFLICT)]
#[case::forbidden(ErrorCode::Forbidden, StatusCode::FORBIDDEN)]
#[case::not_authenticated(ErrorCode::NotAuthenticated, StatusCode::UNAUTHORIZED)]
#[case::session_expired(ErrorCode::SessionExpired, StatusCode::UNAUTHORIZED)]
#[case::credentials(ErrorCode::InvalidCredentials, StatusCode::UNAUTHORIZED)]
#[case::database(ErrorCode::DatabaseError, StatusCode::INTERNAL_SERVER_ERROR)]
#[case::internal(ErrorCode::InternalError, StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] code: ErrorCode, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&Error::new(code, "x")), status);
}

#[rstest]
#[actix_web::test]
async fn failures_render_the_envelope(duplicate_error: Error) {
    let response = ResponseError::error_response(&duplicate_error);
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": false,
            "error": {
                "code": "DUPLICATE_ENTRY",
                "message": "A record with this email already exists",
                "details": {"field": "email"}
            }
        })
    );
}

#[rstest]
#[actix_web::test]
async fn successes_render_data_with_ok() {
    let request = TestRequest::default().to_http_request();
    let outcome: ActionOutcome<Value> = Ok(ActionResult::success(json!({"id": 7})));
    let response = ActionResponse::from(outcome).respond_to(&request);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "data": {"id": 7}})
    );
}

#[rstest]
#[actix_web::test]
async fn redirects_become_see_other() {
    let request = TestRequest::default().to_http_request();
    let outcome: ActionOutcome<()> = Err(NavigationSignal::redirect("/login"));
    let response = ActionResponse::from(outcome).respond_to(&request);
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/login")
    );
}

#[rstest]
#[actix_web::test]
async fn not_found_signals_render_a_failure() {
    let request = TestRequest::default().to_http_request();
    let outcome: ActionOutcome<()> = Err(NavigationSignal::NotFound);
    let response = ActionResponse::from(outcome).respond_to(&request);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], json!("NOT_FOUND"));
}

#[given("an internal error carrying backend details")]
fn an_internal_error_carrying_backend_details() -> Error {
    Error::internal("connection to 10.0.0.4:5432 refused").with_detail("host", "10.0.0.4")
}

#[when("the adapter redacts the client payload")]
fn the_adapter_redacts_the_client_payload(error: Error) -> Error {
    redact_if_internal(&error)
}

#[then("clients see the generic internal error message")]
fn clients_see_the_generic_internal_error_message(redacted: Error) {
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), GENERIC_FAILURE_MESSAGE);
    assert!(redacted.details().is_none());
}

#[rstest]
fn internal_errors_are_redacted() {
    let error = an_internal_error_carrying_backend_details();
    let redacted = the_adapter_redacts_the_client_payload(error);
    clients_see_the_generic_internal_error_message(redacted);
}

#[rstest]
fn other_errors_pass_through_unredacted(duplicate_error: Error) {
    assert_eq!(redact_if_internal(&duplicate_error), duplicate_error);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    let actix_err = actix_web::error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), GENERIC_FAILURE_MESSAGE);
    assert_eq!(err.details(), None);
}
