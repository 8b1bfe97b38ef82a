//! Port for the hosted identity provider.
//!
//! Every call runs against the session identified by the client's request
//! scope. Failures are reported in the provider's own vocabulary
//! ([`AuthProviderError`]) and mapped onto the taxonomy by the caller.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{AuthProviderError, AuthenticatedUser};

/// Tokens issued after a successful sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: AuthenticatedUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

/// Outcome of a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is active and a session was issued.
    SignedIn(AuthSession),
    /// The provider sent a confirmation email; no session yet.
    ConfirmationRequired { user: AuthenticatedUser },
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the user behind the current session, if any.
    async fn get_user(&self) -> Result<Option<AuthenticatedUser>, AuthProviderError>;

    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError>;

    /// Register a new account.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError>;

    /// Send a password-reset email.
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthProviderError>;

    /// Change the password of the signed-in user.
    async fn update_password(&self, password: &str)
    -> Result<AuthenticatedUser, AuthProviderError>;

    /// Revoke the current session.
    async fn sign_out(&self) -> Result<(), AuthProviderError>;
}
