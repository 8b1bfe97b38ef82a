//! Regression coverage for backend, identity-provider, and validation mapping.

use super::*;
use crate::domain::failures::{PathSegment, ValidationIssue};
use rstest::rstest;
use serde_json::json;

#[rstest]
fn unique_violation_names_the_field() {
    let failure = DatabaseError::new(
        "23505",
        "duplicate key value violates unique constraint \"clients_email_key\"",
    )
    .with_details("Key (email)=(test@example.com) already exists.");

    let error = map_database_error(&failure);

    assert_eq!(error.code(), ErrorCode::DuplicateEntry);
    assert!(error.message().contains("email"));
    assert_eq!(error.detail("field"), Some(&json!("email")));
}

#[rstest]
#[case(None)]
#[case(Some("duplicate somewhere"))]
fn unique_violation_without_parsable_details_uses_generic_message(#[case] details: Option<&str>) {
    let mut failure = DatabaseError::new("23505", "duplicate key value");
    failure.details = details.map(str::to_owned);

    let error = map_database_error(&failure);

    assert_eq!(error.code(), ErrorCode::DuplicateEntry);
    assert_eq!(error.message(), DUPLICATE_FALLBACK_MESSAGE);
    assert!(error.details().is_none());
}

#[rstest]
fn foreign_key_violation_reports_dependencies() {
    let failure = DatabaseError::new(
        "23503",
        "update or delete on table \"clients\" violates foreign key constraint",
    );
    let error = map_database_error(&failure);
    assert_eq!(error.code(), ErrorCode::HasDependencies);
    assert!(error.message().contains("cannot be deleted"));
}

#[rstest]
fn not_null_violation_extracts_column() {
    let failure = DatabaseError::new(
        "23502",
        "null value in column \"name\" of relation \"workers\" violates not-null constraint",
    );
    let error = map_database_error(&failure);
    assert_eq!(error.code(), ErrorCode::ValidationError);
    assert_eq!(error.message(), "A required field is missing");
    assert_eq!(error.detail("field"), Some(&json!("name")));
}

#[rstest]
fn not_null_violation_without_column_has_no_field() {
    let error = map_database_error(&DatabaseError::new("23502", "not-null constraint"));
    assert!(error.detail("field").is_none());
}

#[rstest]
#[case("23514", ErrorCode::ValidationError)]
#[case("42501", ErrorCode::Forbidden)]
#[case("PGRST116", ErrorCode::NotFound)]
#[case("PGRST301", ErrorCode::SessionExpired)]
#[case("PGRST303", ErrorCode::SessionExpired)]
fn database_codes_map_to_taxonomy(#[case] code: &str, #[case] expected: ErrorCode) {
    let error = map_database_error(&DatabaseError::new(code, "backend says no"));
    assert_eq!(error.code(), expected);
}

#[rstest]
fn unknown_database_code_preserves_original_code() {
    let error = map_database_error(&DatabaseError::new("40P01", "deadlock detected"));
    assert_eq!(error.code(), ErrorCode::DatabaseError);
    assert_eq!(error.detail("originalCode"), Some(&json!("40P01")));
}

#[rstest]
#[case("invalid_credentials", ErrorCode::InvalidCredentials)]
#[case("email_not_confirmed", ErrorCode::Forbidden)]
#[case("phone_not_confirmed", ErrorCode::Forbidden)]
#[case("session_expired", ErrorCode::SessionExpired)]
#[case("refresh_token_already_used", ErrorCode::SessionExpired)]
#[case("bad_jwt", ErrorCode::SessionExpired)]
#[case("otp_expired", ErrorCode::SessionExpired)]
#[case("otp_disabled", ErrorCode::Forbidden)]
#[case("weak_password", ErrorCode::ValidationError)]
#[case("same_password", ErrorCode::ValidationError)]
#[case("over_request_rate_limit", ErrorCode::Forbidden)]
#[case("user_not_found", ErrorCode::NotFound)]
#[case("user_already_exists", ErrorCode::DuplicateEntry)]
#[case("email_exists", ErrorCode::DuplicateEntry)]
#[case("validation_failed", ErrorCode::ValidationError)]
#[case("signup_disabled", ErrorCode::Forbidden)]
#[case("provider_disabled", ErrorCode::Forbidden)]
#[case("user_banned", ErrorCode::Forbidden)]
fn auth_codes_map_through_the_table(#[case] code: &str, #[case] expected: ErrorCode) {
    let error = map_auth_error(&AuthProviderError::new(code, "provider message"));
    assert_eq!(error.code(), expected);
    assert_ne!(error.message(), "provider message");
}

#[rstest]
fn unknown_auth_code_is_not_authenticated_with_code_detail() {
    let error = map_auth_error(&AuthProviderError::new("mfa_challenge_expired", "expired"));
    assert_eq!(error.code(), ErrorCode::NotAuthenticated);
    assert_eq!(error.detail("code"), Some(&json!("mfa_challenge_expired")));
}

#[rstest]
fn auth_table_has_no_duplicate_codes() {
    let mut codes: Vec<&str> = AUTH_ERROR_TABLE.iter().map(|(code, _, _)| *code).collect();
    codes.sort_unstable();
    let before = codes.len();
    codes.dedup();
    assert_eq!(codes.len(), before);
}

#[rstest]
fn validation_failure_groups_messages_by_field() {
    let failure = ValidationFailure::new(vec![
        ValidationIssue::field("email", "Invalid email"),
        ValidationIssue::field("name", "Name is required"),
        ValidationIssue::field("email", "Email is too long"),
    ]);

    let error = map_validation_error(&failure);

    assert_eq!(error.code(), ErrorCode::ValidationError);
    assert_eq!(error.message(), "Validation failed: email, name");
    assert_eq!(
        error.detail("fieldErrors"),
        Some(&json!({
            "email": ["Invalid email", "Email is too long"],
            "name": ["Name is required"],
        }))
    );
    let issues = error.detail("issues").and_then(Value::as_array).expect("issues");
    assert_eq!(issues.len(), 3);
}

#[rstest]
fn validation_failure_uses_root_key_and_dotted_paths() {
    let failure = ValidationFailure::new(vec![
        ValidationIssue::root("Passwords do not match"),
        ValidationIssue::new(
            vec![PathSegment::from("shifts"), PathSegment::Index(1), "ends_at".into()],
            "Must follow the start",
        ),
    ]);

    let error = map_validation_error(&failure);

    let field_errors = error.detail("fieldErrors").expect("field errors");
    assert_eq!(field_errors[ROOT_FIELD_KEY], json!(["Passwords do not match"]));
    assert_eq!(field_errors["shifts.1.ends_at"], json!(["Must follow the start"]));
    assert_eq!(error.message(), "Validation failed: shifts.1.ends_at");
}

#[rstest]
fn root_only_failure_has_plain_message() {
    let failure = ValidationFailure::single(ValidationIssue::root("Nothing to update"));
    let error = map_validation_error(&failure);
    assert_eq!(error.message(), "Validation failed");
}
