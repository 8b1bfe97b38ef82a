//! Dashboard overview counts.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::action::{Action, ActionContext, ActionFailure, ActionOptions, ActionRuntime};
use super::ports::{BackendClient, BackendError};
use super::query::{DEFAULT_SOFT_DELETE_COLUMN, FilterableQuery, TableQuery};
use super::resources::Resource;

/// Active and archived row counts of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCount {
    pub resource: Resource,
    pub active: u64,
    pub archived: u64,
}

/// Counts for every resource, in [`Resource::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub resources: Vec<ResourceCount>,
}

impl DashboardSummary {
    pub fn count_for(&self, resource: Resource) -> Option<&ResourceCount> {
        self.resources.iter().find(|count| count.resource == resource)
    }
}

async fn count_resource(
    client: &dyn BackendClient,
    resource: Resource,
) -> Result<ResourceCount, BackendError> {
    let active = TableQuery::new(resource.table()).is_null(DEFAULT_SOFT_DELETE_COLUMN);
    let archived = TableQuery::new(resource.table()).not_null(DEFAULT_SOFT_DELETE_COLUMN);
    let (active, archived) = tokio::try_join!(client.count(&active), client.count(&archived))?;
    Ok(ResourceCount {
        resource,
        active,
        archived,
    })
}

async fn summarise(_input: (), context: ActionContext) -> Result<DashboardSummary, ActionFailure> {
    let client = context.client();
    let resources = try_join_all(
        Resource::ALL
            .into_iter()
            .map(|resource| count_resource(client, resource)),
    )
    .await?;
    Ok(DashboardSummary { resources })
}

/// Action producing the [`DashboardSummary`].
pub fn dashboard_summary_action(runtime: &ActionRuntime) -> Action<(), DashboardSummary> {
    runtime.create_action("dashboard_summary", summarise, ActionOptions::default())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{NoopRevalidator, RequestScope};
    use crate::outbound::memory::{InMemoryBackend, MemoryOperation, record};

    struct Harness {
        backend: InMemoryBackend,
        action: Action<(), DashboardSummary>,
        scope: RequestScope,
    }

    #[fixture]
    fn harness() -> Harness {
        let backend = InMemoryBackend::new();
        backend.register_account("lead@example.com", "correct horse", None);
        let token = backend
            .session_for("lead@example.com")
            .expect("account exists");
        let runtime = ActionRuntime::new(Arc::new(backend.clone()), Arc::new(NoopRevalidator));
        Harness {
            action: dashboard_summary_action(&runtime),
            backend,
            scope: RequestScope::with_access_token(token),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn counts_active_and_archived_rows(harness: Harness) {
        harness.backend.seed(
            Resource::Workers,
            [
                record(json!({"id": "w1", "deleted_at": null})),
                record(json!({"id": "w2", "deleted_at": null})),
                record(json!({"id": "w3", "deleted_at": "2026-01-04T09:00:00Z"})),
            ],
        );

        let result = harness
            .action
            .run(&harness.scope, ())
            .await
            .expect("no navigation");
        let summary = result.into_result().expect("summary");

        assert_eq!(summary.resources.len(), Resource::ALL.len());
        assert_eq!(
            summary.count_for(Resource::Workers),
            Some(&ResourceCount {
                resource: Resource::Workers,
                active: 2,
                archived: 1,
            })
        );
        let clients = summary.count_for(Resource::Clients).expect("clients row");
        assert_eq!((clients.active, clients.archived), (0, 0));
    }

    #[rstest]
    #[tokio::test]
    async fn a_failed_count_fails_the_summary(harness: Harness) {
        harness
            .backend
            .fail_next(MemoryOperation::Count, BackendError::transport("socket closed"));

        let result = harness
            .action
            .run(&harness.scope, ())
            .await
            .expect("no navigation");
        assert_eq!(
            result.error().map(crate::domain::Error::code),
            Some(ErrorCode::InternalError)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn anonymous_callers_are_rejected(harness: Harness) {
        let result = harness
            .action
            .run(&RequestScope::anonymous(), ())
            .await
            .expect("no navigation");
        assert_eq!(
            result.error().map(crate::domain::Error::code),
            Some(ErrorCode::NotAuthenticated)
        );
    }
}
