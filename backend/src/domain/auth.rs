//! Sign-in, registration and password actions.
//!
//! The identity provider does the real work (hashing, sessions, email
//! delivery); these actions validate the form input, call the provider
//! through the request's backend client, and let its failures flow through
//! the taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use zeroize::Zeroizing;

use super::action::{Action, ActionContext, ActionFailure, ActionOptions, ActionRuntime};
use super::ports::{AuthSession, SignUpOutcome};
use super::{AuthenticatedUser, NavigationSignal};

/// Where callers are sent after signing out.
pub const SIGNED_OUT_LOCATION: &str = "/login";

#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct SignInInput {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl fmt::Debug for SignInInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_registration", skip_on_field_errors = false))]
pub struct RegisterInput {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub confirm_password: String,
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn validate_registration(input: &RegisterInput) -> Result<(), ValidationError> {
    passwords_match(&input.password, &input.confirm_password)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(url(message = "Enter a valid URL"))]
    #[serde(default)]
    pub redirect_to: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_password_update", skip_on_field_errors = false))]
pub struct PasswordUpdateInput {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordUpdateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordUpdateInput").finish_non_exhaustive()
    }
}

fn validate_password_update(input: &PasswordUpdateInput) -> Result<(), ValidationError> {
    passwords_match(&input.password, &input.confirm_password)
}

fn passwords_match(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password == confirmation {
        return Ok(());
    }
    let mut error = ValidationError::new("password_mismatch");
    error.message = Some("Passwords do not match".into());
    Err(error)
}

/// Outcome of a registration.
///
/// The session, when the provider issued one, is kept off the wire; the
/// HTTP adapter stores it in the caller's cookie instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user: AuthenticatedUser,
    pub confirmation_required: bool,
    #[serde(skip)]
    pub session: Option<AuthSession>,
}

/// The account actions.
#[derive(Clone)]
pub struct AuthActions {
    pub sign_in: Action<SignInInput, AuthSession>,
    pub register: Action<RegisterInput, Registration>,
    pub request_password_reset: Action<PasswordResetRequest, ()>,
    pub update_password: Action<PasswordUpdateInput, AuthenticatedUser>,
    pub sign_out: Action<(), ()>,
    pub current_user: Action<(), AuthenticatedUser>,
}

impl AuthActions {
    pub fn new(runtime: &ActionRuntime) -> Self {
        Self {
            sign_in: runtime.create_action(
                "sign_in",
                |input: SignInInput, context: ActionContext| sign_in(input, context),
                ActionOptions::default().public().validated(),
            ),
            register: runtime.create_action(
                "register",
                |input: RegisterInput, context: ActionContext| register(input, context),
                ActionOptions::default().public().validated(),
            ),
            request_password_reset: runtime.create_action(
                "request_password_reset",
                |input: PasswordResetRequest, context: ActionContext| {
                    request_password_reset(input, context)
                },
                ActionOptions::default().public().validated(),
            ),
            update_password: runtime.create_action(
                "update_password",
                |input: PasswordUpdateInput, context: ActionContext| {
                    update_password(input, context)
                },
                ActionOptions::default().validated(),
            ),
            sign_out: runtime.create_action(
                "sign_out",
                |_input: (), context: ActionContext| sign_out(context),
                ActionOptions::default().public(),
            ),
            current_user: runtime.create_action(
                "current_user",
                |_input: (), context: ActionContext| current_user(context),
                ActionOptions::default(),
            ),
        }
    }
}

async fn sign_in(input: SignInInput, context: ActionContext) -> Result<AuthSession, ActionFailure> {
    let password = Zeroizing::new(input.password);
    let session = context
        .client()
        .sign_in_with_password(input.email.trim(), &password)
        .await?;
    tracing::info!(user_id = %session.user.id(), "signed in");
    Ok(session)
}

async fn register(input: RegisterInput, context: ActionContext) -> Result<Registration, ActionFailure> {
    let password = Zeroizing::new(input.password);
    let _confirmation = Zeroizing::new(input.confirm_password);
    let name = input.name.as_deref().map(str::trim);
    let outcome = context
        .client()
        .sign_up(input.email.trim(), &password, name)
        .await?;
    Ok(match outcome {
        SignUpOutcome::SignedIn(session) => Registration {
            user: session.user.clone(),
            confirmation_required: false,
            session: Some(session),
        },
        SignUpOutcome::ConfirmationRequired { user } => Registration {
            user,
            confirmation_required: true,
            session: None,
        },
    })
}

async fn request_password_reset(
    input: PasswordResetRequest,
    context: ActionContext,
) -> Result<(), ActionFailure> {
    context
        .client()
        .reset_password_for_email(input.email.trim(), input.redirect_to.as_deref())
        .await?;
    Ok(())
}

async fn update_password(
    input: PasswordUpdateInput,
    context: ActionContext,
) -> Result<AuthenticatedUser, ActionFailure> {
    let password = Zeroizing::new(input.password);
    let _confirmation = Zeroizing::new(input.confirm_password);
    let user = context.client().update_password(&password).await?;
    tracing::info!(user_id = %user.id(), "password updated");
    Ok(user)
}

async fn current_user(context: ActionContext) -> Result<AuthenticatedUser, ActionFailure> {
    Ok(context.require_user()?.clone())
}

/// Revoke the session, then send the caller to the sign-in page.
///
/// A failed revocation is logged and the redirect still happens: the
/// caller's cookie is dropped either way.
async fn sign_out(context: ActionContext) -> Result<(), ActionFailure> {
    if let Err(error) = context.client().sign_out().await {
        tracing::warn!(%error, "sign-out request failed");
    }
    Err(NavigationSignal::redirect(SIGNED_OUT_LOCATION).into())
}
