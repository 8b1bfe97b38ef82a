//! Port for the hosted data API.
//!
//! A [`BackendClient`] is scoped to one request: it carries the caller's
//! session so row-level security applies to every query it runs. Clients
//! are handed out by a [`BackendClientFactory`].

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::AuthProvider;
use crate::domain::query::TableQuery;
use crate::domain::{AuthProviderError, DatabaseError};

/// One row as returned by the data API.
pub type Record = Map<String, Value>;

/// Failures raised by backend adapters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The data API rejected the query.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// The identity provider rejected the request.
    #[error(transparent)]
    Auth(#[from] AuthProviderError),
    /// The backend could not be reached.
    #[error("backend transport failed: {message}")]
    Transport { message: String },
    /// The backend answered with a body we could not decode.
    #[error("backend response could not be decoded: {message}")]
    Decode { message: String },
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Credentials identifying the caller of one request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestScope {
    access_token: Option<String>,
}

impl RequestScope {
    /// Scope without a session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Scope bound to a session access token.
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Data-API operations available to actions.
#[async_trait]
pub trait BackendClient: AuthProvider {
    /// Rows matching `query`.
    async fn select(&self, query: &TableQuery) -> Result<Vec<Record>, BackendError>;

    /// Exactly one row matching `query`.
    ///
    /// Zero rows is reported as [`DatabaseError::no_rows`].
    async fn select_single(&self, query: &TableQuery) -> Result<Record, BackendError>;

    /// Number of rows matching the filters of `query`; ordering and range
    /// are ignored.
    async fn count(&self, query: &TableQuery) -> Result<u64, BackendError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Record) -> Result<Record, BackendError>;

    /// Apply `patch` to the single row matching `query` and return it.
    async fn update(&self, query: &TableQuery, patch: Record) -> Result<Record, BackendError>;

    /// Delete the rows matching `query`.
    async fn delete(&self, query: &TableQuery) -> Result<(), BackendError>;
}

/// Creates request-scoped backend clients.
pub trait BackendClientFactory: Send + Sync {
    fn acquire(&self, scope: &RequestScope) -> Result<Box<dyn BackendClient>, BackendError>;
}
