//! Port for invalidating cached dashboard views after a mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;

/// Scope of a revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevalidateKind {
    /// Only the page at the path.
    Page,
    /// The layout at the path and every page beneath it.
    Layout,
}

/// A cached view to invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidatePath {
    pub path: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RevalidateKind>,
}

impl RevalidatePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: None,
        }
    }

    pub fn layout(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: Some(RevalidateKind::Layout),
        }
    }
}

impl From<&str> for RevalidatePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

define_port_error! {
    /// Errors raised while asking the frontend to drop cached views.
    pub enum RevalidationError {
        /// The revalidation endpoint could not be reached.
        Transport { message: String } => "revalidation request failed: {message}",
        /// The endpoint answered with a non-success status.
        Rejected { status: u16 } => "revalidation rejected with status {status}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn revalidate(&self, path: &RevalidatePath) -> Result<(), RevalidationError>;
}

/// Revalidator for deployments without a cache to invalidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRevalidator;

#[async_trait]
impl Revalidator for NoopRevalidator {
    async fn revalidate(&self, path: &RevalidatePath) -> Result<(), RevalidationError> {
        tracing::debug!(path = %path.path, "revalidation skipped");
        Ok(())
    }
}
