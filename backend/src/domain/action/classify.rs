//! Classification of handler failures onto the error taxonomy.

use std::error::Error as StdError;

use validator::ValidationErrors;

use crate::domain::error_mapping::{map_auth_error, map_database_error, map_validation_error};
use crate::domain::ports::BackendError;
use crate::domain::{
    AuthProviderError, DatabaseError, Error, ErrorCode, NavigationSignal, ValidationFailure,
};

/// Message used when a failure carries nothing presentable.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred";

type BoxError = Box<dyn StdError + Send + Sync>;

/// Everything a handler may fail with.
///
/// Handlers return this through `?`: each recognised failure shape converts
/// into its own variant, and anything else can be wrapped with
/// [`ActionFailure::other`].
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    /// An error already expressed in the taxonomy.
    #[error(transparent)]
    Domain(#[from] Error),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthProviderError),
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// Navigation request; never converted into an error result.
    #[error(transparent)]
    Navigation(#[from] NavigationSignal),
    /// An error of no recognised shape.
    #[error("{0}")]
    Other(BoxError),
}

impl ActionFailure {
    /// Wrap an arbitrary error, classifying it first.
    ///
    /// # Examples
    /// ```
    /// use staffdesk::domain::{ActionFailure, DatabaseError};
    ///
    /// let failure = ActionFailure::other(DatabaseError::new("23503", "fk"));
    /// assert!(matches!(failure, ActionFailure::Database(_)));
    /// ```
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::classify(error.into())
    }

    /// Run the ordered guard chain over a type-erased error.
    ///
    /// The first matching guard wins; unmatched errors become
    /// [`ActionFailure::Other`].
    pub fn classify(error: BoxError) -> Self {
        let error = match error.downcast::<Self>() {
            Ok(failure) => return *failure,
            Err(error) => error,
        };
        let error = match error.downcast::<Error>() {
            Ok(domain) => return Self::Domain(*domain),
            Err(error) => error,
        };
        let error = match error.downcast::<BackendError>() {
            Ok(backend) => return Self::from(*backend),
            Err(error) => error,
        };
        let error = match error.downcast::<DatabaseError>() {
            Ok(database) => return Self::Database(*database),
            Err(error) => error,
        };
        let error = match error.downcast::<AuthProviderError>() {
            Ok(auth) => return Self::Auth(*auth),
            Err(error) => error,
        };
        let error = match error.downcast::<ValidationFailure>() {
            Ok(validation) => return Self::Validation(*validation),
            Err(error) => error,
        };
        let error = match error.downcast::<ValidationErrors>() {
            Ok(errors) => return Self::Validation(ValidationFailure::from(&*errors)),
            Err(error) => error,
        };
        match error.downcast::<NavigationSignal>() {
            Ok(signal) => Self::Navigation(*signal),
            Err(error) => Self::Other(error),
        }
    }

    /// Convert into a taxonomy error, or hand back the navigation signal.
    pub fn into_error(self) -> Result<Error, NavigationSignal> {
        match self {
            Self::Domain(error) => Ok(error),
            Self::Database(error) => Ok(map_database_error(&error)),
            Self::Auth(error) => Ok(map_auth_error(&error)),
            Self::Validation(failure) => Ok(map_validation_error(&failure)),
            Self::Navigation(signal) => Err(signal),
            Self::Other(error) => Ok(Error::try_new(ErrorCode::InternalError, error.to_string())
                .unwrap_or_else(|_| Error::internal(GENERIC_FAILURE_MESSAGE))),
        }
    }
}

impl From<BackendError> for ActionFailure {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Database(error) => Self::Database(error),
            BackendError::Auth(error) => Self::Auth(error),
            other @ (BackendError::Transport { .. } | BackendError::Decode { .. }) => {
                Self::Other(Box::new(other))
            }
        }
    }
}

impl From<ValidationErrors> for ActionFailure {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(ValidationFailure::from(&value))
    }
}

#[cfg(test)]
mod tests {
    //! Guard-chain ordering and fallbacks.
    use super::*;
    use rstest::rstest;
    use std::fmt;

    #[derive(Debug)]
    struct Blank;

    impl fmt::Display for Blank {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("  ")
        }
    }

    impl StdError for Blank {}

    #[rstest]
    fn boxed_database_errors_are_recognised() {
        let failure = ActionFailure::other(DatabaseError::new("23505", "dup"));
        assert!(matches!(failure, ActionFailure::Database(_)));
    }

    #[rstest]
    fn boxed_backend_errors_unwrap_their_payload() {
        let backend = BackendError::from(AuthProviderError::new("bad_jwt", "expired"));
        let failure = ActionFailure::other(backend);
        assert!(matches!(failure, ActionFailure::Auth(_)));
    }

    #[rstest]
    fn boxed_navigation_is_recognised() {
        let failure = ActionFailure::other(NavigationSignal::redirect("/login"));
        assert_eq!(
            failure.into_error(),
            Err(NavigationSignal::redirect("/login"))
        );
    }

    #[rstest]
    fn message_errors_become_internal_errors_with_their_message() {
        let error = ActionFailure::other("shift template missing")
            .into_error()
            .expect("taxonomy error");
        assert_eq!(error.code(), ErrorCode::InternalError);
        assert_eq!(error.message(), "shift template missing");
    }

    #[rstest]
    fn blank_messages_fall_back_to_generic_text() {
        let error = ActionFailure::other(Blank).into_error().expect("taxonomy error");
        assert_eq!(error.message(), GENERIC_FAILURE_MESSAGE);
    }

    #[rstest]
    fn transport_failures_are_internal() {
        let error = ActionFailure::from(BackendError::transport("connection reset"))
            .into_error()
            .expect("taxonomy error");
        assert_eq!(error.code(), ErrorCode::InternalError);
    }

    #[rstest]
    fn domain_errors_pass_through_unchanged() {
        let original = Error::forbidden("Only managers may publish rosters");
        let error = ActionFailure::from(original.clone()).into_error().expect("taxonomy error");
        assert_eq!(error, original);
    }
}
