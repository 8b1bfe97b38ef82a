//! DTOs for decoding data-API and identity-provider responses.
//!
//! Responses are decoded into these transport shapes first and mapped into
//! domain types in one pass.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{AuthProviderError, AuthenticatedUser, DatabaseError, UserId};
use crate::domain::ports::AuthSession;

/// Error body returned by the data API.
#[derive(Debug, Deserialize)]
pub(super) struct RestErrorDto {
    pub(super) code: Option<String>,
    pub(super) message: Option<String>,
    pub(super) details: Option<String>,
    pub(super) hint: Option<String>,
}

impl RestErrorDto {
    pub(super) fn into_domain(self) -> Option<DatabaseError> {
        let code = self.code.filter(|code| !code.is_empty())?;
        Some(DatabaseError {
            code,
            message: self.message.unwrap_or_default(),
            details: self.details,
            hint: self.hint,
        })
    }
}

/// Error body returned by the identity provider.
///
/// Current releases send `error_code`/`msg`; older ones send
/// `error`/`error_description`.
#[derive(Debug, Deserialize)]
pub(super) struct AuthErrorDto {
    pub(super) error_code: Option<String>,
    pub(super) msg: Option<String>,
    pub(super) error: Option<String>,
    pub(super) error_description: Option<String>,
    pub(super) message: Option<String>,
}

impl AuthErrorDto {
    pub(super) fn into_domain(self, status: u16) -> AuthProviderError {
        let code = self
            .error_code
            .or(self.error)
            .unwrap_or_else(|| "unexpected_failure".to_owned());
        let message = self
            .msg
            .or(self.error_description)
            .or(self.message)
            .unwrap_or_else(|| format!("identity provider responded with status {status}"));
        AuthProviderError::new(code, message).with_status(status)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: String,
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) user_metadata: Map<String, Value>,
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<AuthenticatedUser, String> {
        let id = UserId::new(&self.id).map_err(|error| format!("invalid user id: {error}"))?;
        let user = AuthenticatedUser::new(id, self.email);
        Ok(match self.user_metadata.get("name").and_then(Value::as_str) {
            Some(name) => user.with_name(name),
            None => user,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: Option<String>,
    pub(super) expires_in: Option<u64>,
    pub(super) user: UserDto,
}

impl SessionDto {
    pub(super) fn into_domain(self) -> Result<AuthSession, String> {
        Ok(AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            user: self.user.into_domain()?,
        })
    }
}

/// Sign-up responses carry a session when the account is active, and the
/// bare user when an email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpDto {
    Session(SessionDto),
    User(UserDto),
}

#[derive(Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Serialize)]
pub(super) struct SignUpRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecoverRequestDto<'a> {
    pub(super) email: &'a str,
}

#[derive(Serialize)]
pub(super) struct PasswordChangeDto<'a> {
    pub(super) password: &'a str,
}
