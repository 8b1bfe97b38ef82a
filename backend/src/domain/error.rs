//! Action error taxonomy.
//!
//! Every action reports failures with one of a closed set of [`ErrorCode`]s
//! so callers can branch on meaning ("is this a duplicate?") rather than on
//! backend-specific strings. These errors are transport agnostic; the HTTP
//! adapter maps them to status codes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured error details keyed by field name.
pub type ErrorDetails = Map<String, Value>;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The requested record does not exist.
    NotFound,
    /// Input failed validation or violated a data requirement.
    ValidationError,
    /// A record with the same unique value already exists.
    DuplicateEntry,
    /// The record is still referenced by other records.
    HasDependencies,
    /// The caller is not permitted to perform the operation.
    Forbidden,
    /// The operation requires a signed-in user.
    NotAuthenticated,
    /// The caller's session is no longer valid.
    SessionExpired,
    /// Sign-in credentials were rejected.
    InvalidCredentials,
    /// The backend reported an unclassified database failure.
    DatabaseError,
    /// An unexpected failure inside the application.
    InternalError,
}

impl ErrorCode {
    /// Every code in declaration order.
    pub const ALL: [Self; 10] = [
        Self::NotFound,
        Self::ValidationError,
        Self::DuplicateEntry,
        Self::HasDependencies,
        Self::Forbidden,
        Self::NotAuthenticated,
        Self::SessionExpired,
        Self::InvalidCredentials,
        Self::DatabaseError,
        Self::InternalError,
    ];

    /// Wire representation, e.g. `NOT_FOUND`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DuplicateEntry => "DUPLICATE_ENTRY",
            Self::HasDependencies => "HAS_DEPENDENCIES",
            Self::Forbidden => "FORBIDDEN",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Message used when an error is built without one.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::NotFound => "Record not found",
            Self::ValidationError => "Validation failed",
            Self::DuplicateEntry => "A record with this value already exists",
            Self::HasDependencies => "This record is referenced by other records",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::NotAuthenticated => "You must be signed in",
            Self::SessionExpired => "Your session has expired",
            Self::InvalidCredentials => "Invalid email or password",
            Self::DatabaseError => "A database error occurred",
            Self::InternalError => "An unexpected error occurred",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
/// - `code` is always one of the [`ErrorCode`] variants.
///
/// # Examples
/// ```
/// use staffdesk::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::NotFound, "missing");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<ErrorDetails>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty once trimmed.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Create a new error, panicking if validation fails.
    ///
    /// Intended for literal messages; use [`Error::try_new`] for messages
    /// derived from runtime input.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details.
    pub fn details(&self) -> Option<&ErrorDetails> {
        self.details.as_ref()
    }

    /// Look up a single detail entry.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|details| details.get(key))
    }

    /// Replace the structured details.
    ///
    /// # Examples
    /// ```
    /// use serde_json::{Map, json};
    /// use staffdesk::domain::{Error, ErrorCode};
    ///
    /// let mut details = Map::new();
    /// details.insert("field".into(), json!("name"));
    /// let err = Error::new(ErrorCode::ValidationError, "bad").with_details(details);
    /// assert_eq!(err.detail("field"), Some(&json!("name")));
    /// ```
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Insert one detail entry, creating the details map when absent.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::ValidationError`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotAuthenticated`].
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAuthenticated, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Build an [`Error`] from its parts.
///
/// A blank `message` is replaced by [`ErrorCode::default_message`].
///
/// # Examples
/// ```
/// use staffdesk::domain::{ErrorCode, create_error};
///
/// let err = create_error(ErrorCode::Forbidden, "nope", None);
/// assert!(err.details().is_none());
/// ```
pub fn create_error(
    code: ErrorCode,
    message: impl Into<String>,
    details: Option<ErrorDetails>,
) -> Error {
    let error = Error::try_new(code, message).unwrap_or_else(|_| Error {
        code,
        message: code.default_message().to_owned(),
        details: None,
    });
    match details {
        Some(details) => error.with_details(details),
        None => error,
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<ErrorDetails>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}
