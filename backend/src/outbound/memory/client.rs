//! Request-scoped client over [`InMemoryBackend`] state.

use std::str::FromStr;

use async_trait::async_trait;

use super::constraints::{check_delete, check_row};
use super::eval::{evaluate, matches_all};
use super::{
    Account, InMemoryBackend, MemoryOperation, MemoryState, PasswordResetMail, normalise_email,
};
use crate::domain::ports::{
    AuthProvider, AuthSession, BackendClient, BackendError, Record, SignUpOutcome,
};
use crate::domain::query::TableQuery;
use crate::domain::{AuthProviderError, AuthenticatedUser, DatabaseError, Resource, UserId};

const SESSION_LIFETIME_SECONDS: u64 = 3600;
const MIN_PASSWORD_LENGTH: usize = 6;

/// Client bound to one caller's access token.
pub struct MemoryClient {
    backend: InMemoryBackend,
    access_token: Option<String>,
}

impl MemoryClient {
    pub(super) fn new(backend: InMemoryBackend, access_token: Option<String>) -> Self {
        Self {
            backend,
            access_token,
        }
    }

    /// Lock the state for a table operation, applying injected failures and
    /// the row-level-security session check.
    fn table_state(
        &self,
        operation: MemoryOperation,
        table: &str,
    ) -> Result<(std::sync::MutexGuard<'_, MemoryState>, Resource), BackendError> {
        let mut state = self.backend.state();
        if let Some(error) = state.take_failure(operation) {
            return Err(error);
        }
        match self.access_token.as_deref() {
            None => {
                return Err(DatabaseError::new(
                    "42501",
                    format!("permission denied for table {table}"),
                )
                .into());
            }
            Some(token) if state.account_for_token(token).is_none() => {
                return Err(DatabaseError::new("PGRST301", "JWT expired").into());
            }
            Some(_) => {}
        }
        let resource = Resource::from_str(table).map_err(|_| {
            DatabaseError::new(
                "42P01",
                format!("relation \"public.{table}\" does not exist"),
            )
        })?;
        Ok((state, resource))
    }

    fn auth_state(
        &self,
        operation: MemoryOperation,
    ) -> Result<std::sync::MutexGuard<'_, MemoryState>, AuthProviderError> {
        let mut state = self.backend.state();
        match state.take_failure(operation) {
            Some(error) => Err(into_auth_error(error)),
            None => Ok(state),
        }
    }
}

fn into_auth_error(error: BackendError) -> AuthProviderError {
    match error {
        BackendError::Auth(error) => error,
        other => AuthProviderError::new("request_failed", other.to_string()),
    }
}

fn single(mut rows: Vec<Record>) -> Result<Record, BackendError> {
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(DatabaseError::no_rows().into()),
        count => Err(DatabaseError::new(
            "PGRST116",
            "JSON object requested, multiple (or no) rows returned",
        )
        .with_details(format!("The result contains {count} rows"))
        .into()),
    }
}

#[async_trait]
impl BackendClient for MemoryClient {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Record>, BackendError> {
        let (state, resource) = self.table_state(MemoryOperation::Select, query.table())?;
        let rows = state
            .tables
            .get(resource.table())
            .map(|rows| evaluate(rows, query))
            .unwrap_or_default();
        Ok(rows)
    }

    async fn select_single(&self, query: &TableQuery) -> Result<Record, BackendError> {
        let (state, resource) = self.table_state(MemoryOperation::SelectSingle, query.table())?;
        let rows = state
            .tables
            .get(resource.table())
            .map(|rows| evaluate(rows, query))
            .unwrap_or_default();
        single(rows)
    }

    async fn count(&self, query: &TableQuery) -> Result<u64, BackendError> {
        let (state, resource) = self.table_state(MemoryOperation::Count, query.table())?;
        let total = state
            .tables
            .get(resource.table())
            .map(|rows| rows.iter().filter(|row| matches_all(row, query.filters())).count())
            .unwrap_or_default();
        Ok(total as u64)
    }

    async fn insert(&self, table: &str, row: Record) -> Result<Record, BackendError> {
        let (mut state, resource) = self.table_state(MemoryOperation::Insert, table)?;
        check_row(&state.tables, resource, &row)?;
        state
            .tables
            .entry(resource.table().to_owned())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, query: &TableQuery, patch: Record) -> Result<Record, BackendError> {
        let (mut state, resource) = self.table_state(MemoryOperation::Update, query.table())?;
        let rows = state.tables.get(resource.table()).cloned().unwrap_or_default();
        let positions: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_all(row, query.filters()))
            .map(|(position, _)| position)
            .collect();
        let [position] = positions.as_slice() else {
            let matched = positions.iter().map(|index| rows[*index].clone()).collect();
            return single(matched);
        };

        let mut updated = rows[*position].clone();
        updated.extend(patch);
        check_row(&state.tables, resource, &updated)?;
        if let Some(stored) = state
            .tables
            .get_mut(resource.table())
            .and_then(|rows| rows.get_mut(*position))
        {
            *stored = updated.clone();
        }
        Ok(updated)
    }

    async fn delete(&self, query: &TableQuery) -> Result<(), BackendError> {
        let (mut state, resource) = self.table_state(MemoryOperation::Delete, query.table())?;
        let doomed: Vec<Record> = state
            .tables
            .get(resource.table())
            .map(|rows| evaluate(rows, &query.filters_only()))
            .unwrap_or_default();
        check_delete(&state.tables, resource, &doomed)?;
        if let Some(rows) = state.tables.get_mut(resource.table()) {
            rows.retain(|row| !matches_all(row, query.filters()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryClient {
    async fn get_user(&self) -> Result<Option<AuthenticatedUser>, AuthProviderError> {
        let state = self.auth_state(MemoryOperation::GetUser)?;
        Ok(self
            .access_token
            .as_deref()
            .and_then(|token| state.account_for_token(token))
            .map(|account| account.user.clone()))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        let mut state = self.auth_state(MemoryOperation::SignIn)?;
        let email = normalise_email(email);
        let account = state
            .accounts
            .get(&email)
            .filter(|account| account.password == password)
            .cloned()
            .ok_or_else(|| {
                AuthProviderError::new("invalid_credentials", "Invalid login credentials")
                    .with_status(400)
            })?;
        if !account.confirmed {
            return Err(
                AuthProviderError::new("email_not_confirmed", "Email not confirmed").with_status(400),
            );
        }
        let access_token = state.issue_session(&email);
        Ok(AuthSession {
            access_token,
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            expires_in: Some(SESSION_LIFETIME_SECONDS),
            user: account.user,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError> {
        let mut state = self.auth_state(MemoryOperation::SignUp)?;
        let email = normalise_email(email);
        if state.accounts.contains_key(&email) {
            return Err(
                AuthProviderError::new("user_already_exists", "User already registered")
                    .with_status(422),
            );
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthProviderError::new(
                "weak_password",
                format!("Password should be at least {MIN_PASSWORD_LENGTH} characters."),
            )
            .with_status(422));
        }

        let mut user = AuthenticatedUser::new(UserId::random(), Some(email.clone()));
        if let Some(name) = name {
            user = user.with_name(name);
        }
        let confirmed = !state.require_confirmation;
        state.accounts.insert(
            email.clone(),
            Account {
                user: user.clone(),
                password: password.to_owned(),
                confirmed,
            },
        );
        if !confirmed {
            return Ok(SignUpOutcome::ConfirmationRequired { user });
        }
        let access_token = state.issue_session(&email);
        Ok(SignUpOutcome::SignedIn(AuthSession {
            access_token,
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            expires_in: Some(SESSION_LIFETIME_SECONDS),
            user,
        }))
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthProviderError> {
        let mut state = self.auth_state(MemoryOperation::ResetPassword)?;
        let email = normalise_email(email);
        // Unknown addresses succeed silently.
        if state.accounts.contains_key(&email) {
            state.password_resets.push(PasswordResetMail {
                email,
                redirect_to: redirect_to.map(str::to_owned),
            });
        }
        Ok(())
    }

    async fn update_password(
        &self,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthProviderError> {
        let mut state = self.auth_state(MemoryOperation::UpdatePassword)?;
        let email = self
            .access_token
            .as_deref()
            .and_then(|token| state.sessions.get(token).cloned())
            .ok_or_else(|| {
                AuthProviderError::new("session_not_found", "Session from session_id claim in JWT does not exist")
                    .with_status(403)
            })?;
        let account = state.accounts.get_mut(&email).ok_or_else(|| {
            AuthProviderError::new("user_not_found", "User not found").with_status(404)
        })?;
        if account.password == password {
            return Err(AuthProviderError::new(
                "same_password",
                "New password should be different from the old password.",
            )
            .with_status(422));
        }
        account.password = password.to_owned();
        Ok(account.user.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        let mut state = self.auth_state(MemoryOperation::SignOut)?;
        if let Some(token) = self.access_token.as_deref() {
            state.sessions.remove(token);
        }
        Ok(())
    }
}
