//! Failure shapes raised by collaborators of an action.
//!
//! The data API, the identity provider, and the input validators each report
//! failures in their own vocabulary. These types carry those reports into the
//! domain untouched; [`crate::domain::error_mapping`] translates them onto the
//! [`crate::domain::ErrorCode`] taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Constraint or query failure reported by the data API.
///
/// `code` is a PostgreSQL SQLSTATE (`23505`) or a data-API specific code
/// (`PGRST116`). `details` carries the backend's human-readable detail line,
/// e.g. `Key (email)=(a@b.c) already exists.`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("database error {code}: {message}")]
pub struct DatabaseError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Recognised categories of [`DatabaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    CheckViolation,
    InsufficientPrivilege,
    NoRows,
    InvalidSession,
    Other,
}

impl DatabaseError {
    /// Construct an error with a code and message only.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// Attach the backend detail line.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Zero rows returned where exactly one was required.
    pub fn no_rows() -> Self {
        Self::new(
            "PGRST116",
            "JSON object requested, multiple (or no) rows returned",
        )
        .with_details("The result contains 0 rows")
    }

    /// Classify the backend code.
    pub fn kind(&self) -> DatabaseErrorKind {
        match self.code.as_str() {
            "23505" => DatabaseErrorKind::UniqueViolation,
            "23503" => DatabaseErrorKind::ForeignKeyViolation,
            "23502" => DatabaseErrorKind::NotNullViolation,
            "23514" => DatabaseErrorKind::CheckViolation,
            "42501" => DatabaseErrorKind::InsufficientPrivilege,
            "PGRST116" => DatabaseErrorKind::NoRows,
            "PGRST301" | "PGRST303" => DatabaseErrorKind::InvalidSession,
            _ => DatabaseErrorKind::Other,
        }
    }
}

/// Failure reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("auth provider error {code}: {message}")]
pub struct AuthProviderError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
}

impl AuthProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Record the HTTP status that carried the failure.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// One step of a path into a structured input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// A single validation complaint about part of an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Issue attached to a single top-level field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::from(name)], message)
    }

    /// Issue about the input as a whole.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(Vec::new(), message)
    }

    /// Dotted form of the path (`address.lines.0`); `None` for root issues.
    pub fn dotted_path(&self) -> Option<String> {
        if self.path.is_empty() {
            return None;
        }
        let segments: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        Some(segments.join("."))
    }
}

/// Structured validation failure: the list of issues found in an input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, thiserror::Error)]
#[error("input failed validation with {} issue(s)", .issues.len())]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Failure with a single issue.
    pub fn single(issue: ValidationIssue) -> Self {
        Self::new(vec![issue])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Control-flow signal asking the caller to navigate elsewhere.
///
/// Not a business failure: the action wrapper hands it back to the caller
/// unchanged instead of turning it into an error result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationSignal {
    /// Send the caller to another location.
    #[error("redirect to {location}")]
    Redirect { location: String },
    /// Render the not-found page.
    #[error("page not found")]
    NotFound,
}

impl NavigationSignal {
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("23505", DatabaseErrorKind::UniqueViolation)]
    #[case("23503", DatabaseErrorKind::ForeignKeyViolation)]
    #[case("23502", DatabaseErrorKind::NotNullViolation)]
    #[case("23514", DatabaseErrorKind::CheckViolation)]
    #[case("42501", DatabaseErrorKind::InsufficientPrivilege)]
    #[case("PGRST116", DatabaseErrorKind::NoRows)]
    #[case("PGRST301", DatabaseErrorKind::InvalidSession)]
    #[case("PGRST303", DatabaseErrorKind::InvalidSession)]
    #[case("08006", DatabaseErrorKind::Other)]
    fn database_codes_are_classified(#[case] code: &str, #[case] expected: DatabaseErrorKind) {
        assert_eq!(DatabaseError::new(code, "boom").kind(), expected);
    }

    #[rstest]
    fn dotted_path_joins_keys_and_indices() {
        let issue = ValidationIssue::new(
            vec!["shifts".into(), 2_usize.into(), "starts_at".into()],
            "Required",
        );
        assert_eq!(issue.dotted_path().as_deref(), Some("shifts.2.starts_at"));
        assert!(ValidationIssue::root("bad").dotted_path().is_none());
    }

    #[rstest]
    fn database_error_parses_backend_payload() {
        let payload = serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"clients_email_key\"",
            "details": "Key (email)=(a@b.c) already exists.",
            "hint": null,
        });
        let error: DatabaseError = serde_json::from_value(payload).expect("parse payload");
        assert_eq!(error.kind(), DatabaseErrorKind::UniqueViolation);
        assert!(error.hint.is_none());
    }
}
