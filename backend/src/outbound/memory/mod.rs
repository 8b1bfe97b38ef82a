//! In-memory stand-in for the hosted data API and identity provider.
//!
//! Used by the development server when no backend URL is configured and by
//! the integration tests. It reproduces the failure vocabulary of the hosted
//! services: constraint violations carry the PostgreSQL SQLSTATE and detail
//! line, missing rows raise `PGRST116`, and identity failures use the
//! provider's error codes. Constraints are derived from [`Resource`].

mod client;
mod constraints;
mod eval;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::domain::ports::{
    BackendClient, BackendClientFactory, BackendError, Record, RequestScope,
};
use crate::domain::{AuthenticatedUser, Resource, UserId};

pub use client::MemoryClient;

/// Port operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOperation {
    Acquire,
    Select,
    SelectSingle,
    Count,
    Insert,
    Update,
    Delete,
    GetUser,
    SignIn,
    SignUp,
    ResetPassword,
    UpdatePassword,
    SignOut,
}

/// A password-reset email the provider would have sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetMail {
    pub email: String,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone)]
struct Account {
    user: AuthenticatedUser,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Record>>,
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    password_resets: Vec<PasswordResetMail>,
    failures: HashMap<MemoryOperation, BackendError>,
    require_confirmation: bool,
}

impl MemoryState {
    fn take_failure(&mut self, operation: MemoryOperation) -> Option<BackendError> {
        self.failures.remove(&operation)
    }

    fn account_for_token(&self, token: &str) -> Option<&Account> {
        self.sessions
            .get(token)
            .and_then(|email| self.accounts.get(email))
    }

    fn issue_session(&mut self, email: &str) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), email.to_owned());
        token
    }
}

/// Shared in-memory backend; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold new accounts until their email is confirmed.
    #[must_use]
    pub fn require_email_confirmation(self) -> Self {
        self.state().require_confirmation = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert rows without checking constraints.
    pub fn seed(&self, resource: Resource, rows: impl IntoIterator<Item = Record>) {
        self.state()
            .tables
            .entry(resource.table().to_owned())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of every stored row of `resource`.
    pub fn rows(&self, resource: Resource) -> Vec<Record> {
        self.state()
            .tables
            .get(resource.table())
            .cloned()
            .unwrap_or_default()
    }

    /// Create a confirmed account.
    pub fn register_account(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> AuthenticatedUser {
        let email = normalise_email(email);
        let mut user = AuthenticatedUser::new(UserId::random(), Some(email.clone()));
        if let Some(name) = name {
            user = user.with_name(name);
        }
        self.state().accounts.insert(
            email,
            Account {
                user: user.clone(),
                password: password.to_owned(),
                confirmed: true,
            },
        );
        user
    }

    /// Mark a pending account as confirmed.
    pub fn confirm_account(&self, email: &str) -> bool {
        match self.state().accounts.get_mut(&normalise_email(email)) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Issue an access token for an existing account.
    pub fn session_for(&self, email: &str) -> Option<String> {
        let email = normalise_email(email);
        let mut state = self.state();
        state.accounts.contains_key(&email).then(|| state.issue_session(&email))
    }

    /// Whether `token` identifies a live session.
    pub fn has_session(&self, token: &str) -> bool {
        self.state().sessions.contains_key(token)
    }

    pub fn password_reset_mails(&self) -> Vec<PasswordResetMail> {
        self.state().password_resets.clone()
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: MemoryOperation, error: impl Into<BackendError>) {
        self.state().failures.insert(operation, error.into());
    }
}

impl BackendClientFactory for InMemoryBackend {
    fn acquire(&self, scope: &RequestScope) -> Result<Box<dyn BackendClient>, BackendError> {
        if let Some(error) = self.state().take_failure(MemoryOperation::Acquire) {
            return Err(error);
        }
        Ok(Box::new(MemoryClient::new(
            self.clone(),
            scope.access_token().map(str::to_owned),
        )))
    }
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Build a row from a JSON object literal; other values yield an empty row.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
