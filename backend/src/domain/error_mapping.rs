//! Translation of collaborator failures onto the action error taxonomy.
//!
//! Each mapper is pure: it inspects the failure reported by the data API,
//! the identity provider, or an input validator and returns the matching
//! [`Error`]. Messages are written for end users; backend specifics survive
//! only in `details`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Value, json};

use super::error::{Error, ErrorCode, ErrorDetails};
use super::failures::{AuthProviderError, DatabaseError, DatabaseErrorKind, ValidationFailure};

/// Key used in `fieldErrors` for issues about the input as a whole.
pub const ROOT_FIELD_KEY: &str = "_root";

const DUPLICATE_FALLBACK_MESSAGE: &str = "A record with this value already exists";

static UNIQUE_KEY_RE: OnceLock<Regex> = OnceLock::new();
static COLUMN_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn unique_key_regex() -> &'static Regex {
    UNIQUE_KEY_RE.get_or_init(|| {
        // Matches `Key (email)=(a@b.c) already exists.`
        let pattern = r"Key \(([^)]+)\)=\(.*\) already exists";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("unique key regex failed to compile: {error}"))
    })
}

fn column_name_regex() -> &'static Regex {
    COLUMN_NAME_RE.get_or_init(|| {
        let pattern = r#"column "([^"]+)""#;
        Regex::new(pattern).unwrap_or_else(|error| panic!("column regex failed to compile: {error}"))
    })
}

/// Field named in a unique-violation detail line, if recoverable.
///
/// Best effort: the detail line is free text, so an unexpected format yields
/// `None` rather than a guess.
fn duplicate_field(error: &DatabaseError) -> Option<String> {
    let details = error.details.as_deref()?;
    unique_key_regex()
        .captures(details)
        .and_then(|captures| captures.get(1))
        .map(|field| field.as_str().trim().to_owned())
        .filter(|field| !field.is_empty())
}

fn missing_column(error: &DatabaseError) -> Option<String> {
    column_name_regex()
        .captures(&error.message)
        .and_then(|captures| captures.get(1))
        .map(|column| column.as_str().to_owned())
}

/// Map a data-API failure onto the taxonomy.
///
/// # Examples
/// ```
/// use staffdesk::domain::{DatabaseError, ErrorCode, map_database_error};
///
/// let failure = DatabaseError::new("23505", "duplicate key value")
///     .with_details("Key (email)=(a@b.c) already exists.");
/// let error = map_database_error(&failure);
/// assert_eq!(error.code(), ErrorCode::DuplicateEntry);
/// assert!(error.message().contains("email"));
/// ```
pub fn map_database_error(error: &DatabaseError) -> Error {
    match error.kind() {
        DatabaseErrorKind::UniqueViolation => match duplicate_field(error) {
            Some(field) => Error::new(
                ErrorCode::DuplicateEntry,
                format!("A record with this {field} already exists"),
            )
            .with_detail("field", field),
            None => Error::new(ErrorCode::DuplicateEntry, DUPLICATE_FALLBACK_MESSAGE),
        },
        DatabaseErrorKind::ForeignKeyViolation => Error::new(
            ErrorCode::HasDependencies,
            "This record cannot be deleted because other records depend on it",
        ),
        DatabaseErrorKind::NotNullViolation => {
            let base = Error::validation("A required field is missing");
            match missing_column(error) {
                Some(column) => base.with_detail("field", column),
                None => base,
            }
        }
        DatabaseErrorKind::CheckViolation => {
            Error::validation("The provided value does not meet requirements")
        }
        DatabaseErrorKind::InsufficientPrivilege => {
            Error::forbidden("You do not have permission to perform this action")
        }
        DatabaseErrorKind::NoRows => Error::not_found("The requested record was not found"),
        DatabaseErrorKind::InvalidSession => Error::new(
            ErrorCode::SessionExpired,
            "Your session has expired. Please sign in again",
        ),
        DatabaseErrorKind::Other => Error::new(ErrorCode::DatabaseError, "A database error occurred")
            .with_detail("originalCode", error.code.clone()),
    }
}

/// Identity-provider codes and the taxonomy entry each maps to.
const AUTH_ERROR_TABLE: &[(&str, ErrorCode, &str)] = &[
    ("invalid_credentials", ErrorCode::InvalidCredentials, "Invalid email or password"),
    ("invalid_grant", ErrorCode::InvalidCredentials, "Invalid email or password"),
    ("email_not_confirmed", ErrorCode::Forbidden, "Please confirm your email address before signing in"),
    ("phone_not_confirmed", ErrorCode::Forbidden, "Please confirm your phone number before signing in"),
    ("session_expired", ErrorCode::SessionExpired, "Your session has expired. Please sign in again"),
    ("session_not_found", ErrorCode::SessionExpired, "Your session has expired. Please sign in again"),
    ("refresh_token_not_found", ErrorCode::SessionExpired, "Your session has expired. Please sign in again"),
    ("refresh_token_already_used", ErrorCode::SessionExpired, "Your session has expired. Please sign in again"),
    ("bad_jwt", ErrorCode::SessionExpired, "Your session is invalid. Please sign in again"),
    ("no_authorization", ErrorCode::SessionExpired, "Your session is invalid. Please sign in again"),
    ("otp_expired", ErrorCode::SessionExpired, "The verification link has expired. Please request a new one"),
    ("otp_disabled", ErrorCode::Forbidden, "This verification method is disabled"),
    ("weak_password", ErrorCode::ValidationError, "The password is too weak"),
    ("same_password", ErrorCode::ValidationError, "The new password must differ from the current password"),
    ("over_request_rate_limit", ErrorCode::Forbidden, "Too many requests. Please try again later"),
    ("over_email_send_rate_limit", ErrorCode::Forbidden, "Too many emails sent. Please try again later"),
    ("over_sms_send_rate_limit", ErrorCode::Forbidden, "Too many messages sent. Please try again later"),
    ("user_not_found", ErrorCode::NotFound, "No account was found for these details"),
    ("user_already_exists", ErrorCode::DuplicateEntry, "An account with this email already exists"),
    ("email_exists", ErrorCode::DuplicateEntry, "An account with this email already exists"),
    ("phone_exists", ErrorCode::DuplicateEntry, "An account with this phone number already exists"),
    ("validation_failed", ErrorCode::ValidationError, "The submitted details are invalid"),
    ("provider_disabled", ErrorCode::Forbidden, "This sign-in method is disabled"),
    ("signup_disabled", ErrorCode::Forbidden, "New registrations are currently disabled"),
    ("email_provider_disabled", ErrorCode::Forbidden, "Email sign-in is disabled"),
    ("phone_provider_disabled", ErrorCode::Forbidden, "Phone sign-in is disabled"),
    ("user_banned", ErrorCode::Forbidden, "This account has been suspended"),
];

/// Map an identity-provider failure onto the taxonomy.
///
/// Unrecognised codes become [`ErrorCode::NotAuthenticated`] with the
/// provider's code preserved in `details.code`.
pub fn map_auth_error(error: &AuthProviderError) -> Error {
    let code = error.code.as_str();
    match AUTH_ERROR_TABLE.iter().find(|(known, _, _)| *known == code) {
        Some((_, mapped, message)) => Error::new(*mapped, *message),
        None => Error::not_authenticated("Authentication failed").with_detail("code", code),
    }
}

/// Map a structured validation failure onto [`ErrorCode::ValidationError`].
///
/// Messages are grouped by dotted field path under `details.fieldErrors`
/// (root issues under [`ROOT_FIELD_KEY`]); the raw issues are kept in
/// `details.issues`.
pub fn map_validation_error(failure: &ValidationFailure) -> Error {
    let mut field_errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut named_fields: Vec<String> = Vec::new();

    for issue in &failure.issues {
        let key = match issue.dotted_path() {
            Some(path) => {
                if !named_fields.contains(&path) {
                    named_fields.push(path.clone());
                }
                path
            }
            None => ROOT_FIELD_KEY.to_owned(),
        };
        field_errors
            .entry(key)
            .or_default()
            .push(issue.message.clone());
    }

    let message = if named_fields.is_empty() {
        "Validation failed".to_owned()
    } else {
        format!("Validation failed: {}", named_fields.join(", "))
    };

    let mut details = ErrorDetails::new();
    details.insert("fieldErrors".into(), json!(field_errors));
    details.insert(
        "issues".into(),
        serde_json::to_value(&failure.issues).unwrap_or(Value::Array(Vec::new())),
    );
    Error::validation(message).with_details(details)
}

#[cfg(test)]
mod tests;
