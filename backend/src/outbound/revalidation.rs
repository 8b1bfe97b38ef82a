//! HTTP revalidation adapter.
//!
//! Posts `{ "path": ..., "type": ... }` to the frontend's revalidation hook
//! with a shared secret header. Any non-success status is a rejection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::domain::ports::{RevalidatePath, RevalidationError, Revalidator};

/// Header carrying the shared revalidation secret.
pub const REVALIDATE_SECRET_HEADER: &str = "x-revalidate-secret";

/// Revalidator calling a frontend webhook.
pub struct HttpRevalidator {
    client: Client,
    endpoint: Url,
    secret: String,
}

impl HttpRevalidator {
    /// Build a revalidator posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            secret: secret.into(),
        })
    }
}

#[async_trait]
impl Revalidator for HttpRevalidator {
    async fn revalidate(&self, path: &RevalidatePath) -> Result<(), RevalidationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(REVALIDATE_SECRET_HEADER, self.secret.as_str())
            .json(path)
            .send()
            .await
            .map_err(|error| RevalidationError::transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RevalidationError::rejected(status.as_u16()));
        }
        tracing::debug!(path = %path.path, "revalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::RevalidateKind;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::page(RevalidatePath::new("/dashboard/clients"), json!({"path": "/dashboard/clients"}))]
    #[case::layout(
        RevalidatePath::layout("/dashboard"),
        json!({"path": "/dashboard", "type": "layout"})
    )]
    fn payload_matches_the_webhook_contract(
        #[case] path: RevalidatePath,
        #[case] expected: serde_json::Value,
    ) {
        assert_eq!(serde_json::to_value(&path).expect("serialise"), expected);
    }

    #[rstest]
    fn payload_kind_round_trips_through_the_type_key() {
        let decoded: RevalidatePath =
            serde_json::from_value(json!({"path": "/", "type": "page"})).expect("decode");
        assert_eq!(decoded.kind, Some(RevalidateKind::Page));
    }
}
