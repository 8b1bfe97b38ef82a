//! Action execution wrapper.
//!
//! An [`Action`] wraps a business handler with the steps every dashboard
//! operation shares: a request-scoped backend client, the sign-in check,
//! input validation, failure classification, and cache revalidation after a
//! successful mutation. Callers always receive an [`ActionResult`]; the only
//! thing that escapes as `Err` is a [`NavigationSignal`].

mod classify;

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::Instrument;
use validator::Validate;

pub use classify::{ActionFailure, GENERIC_FAILURE_MESSAGE};

use super::error_mapping::map_validation_error;
use super::ports::{BackendClient, BackendClientFactory, RequestScope, RevalidatePath, Revalidator};
use super::schema::{InputSchema, ValidatorSchema};
use super::{ActionResult, AuthenticatedUser, Error, ErrorCode, NavigationSignal};

/// Message returned when a signed-in user is required but absent.
pub const NOT_SIGNED_IN_MESSAGE: &str = "You must be signed in to perform this action";

/// Per-invocation state handed to a handler.
///
/// Created fresh for each call and moved into the handler; the client is
/// never shared with another invocation.
pub struct ActionContext {
    client: Box<dyn BackendClient>,
    user: Option<AuthenticatedUser>,
}

impl ActionContext {
    pub fn new(client: Box<dyn BackendClient>, user: Option<AuthenticatedUser>) -> Self {
        Self { client, user }
    }

    /// Backend client scoped to this invocation.
    pub fn client(&self) -> &dyn BackendClient {
        self.client.as_ref()
    }

    /// Signed-in user; `None` for actions that do not require sign-in.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    /// Signed-in user, failing with `NOT_AUTHENTICATED` when absent.
    pub fn require_user(&self) -> Result<&AuthenticatedUser, ActionFailure> {
        self.user
            .as_ref()
            .ok_or_else(|| ActionFailure::Domain(not_signed_in()))
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Business logic run by an [`Action`].
///
/// Implemented for every `Fn(I, ActionContext) -> impl Future<Output =
/// Result<O, ActionFailure>>`, so plain async closures and functions work.
#[async_trait]
pub trait ActionHandler<I, O>: Send + Sync {
    async fn handle(&self, input: I, context: ActionContext) -> Result<O, ActionFailure>;
}

#[async_trait]
impl<I, O, F, Fut> ActionHandler<I, O> for F
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I, ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, ActionFailure>> + Send,
{
    async fn handle(&self, input: I, context: ActionContext) -> Result<O, ActionFailure> {
        (self)(input, context).await
    }
}

/// Per-action configuration.
pub struct ActionOptions<I> {
    schema: Option<Arc<dyn InputSchema<I>>>,
    require_auth: bool,
    revalidate_paths: Vec<RevalidatePath>,
}

impl<I> Default for ActionOptions<I> {
    fn default() -> Self {
        Self {
            schema: None,
            require_auth: true,
            revalidate_paths: Vec::new(),
        }
    }
}

impl<I> Clone for ActionOptions<I> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            require_auth: self.require_auth,
            revalidate_paths: self.revalidate_paths.clone(),
        }
    }
}

impl<I> ActionOptions<I> {
    /// Validate input against `schema` before the handler runs.
    #[must_use]
    pub fn with_schema(mut self, schema: impl InputSchema<I> + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Allow callers without a session.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.require_auth = false;
        self
    }

    /// Invalidate `path` after every successful run.
    #[must_use]
    pub fn revalidate(mut self, path: impl Into<RevalidatePath>) -> Self {
        self.revalidate_paths.push(path.into());
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.require_auth
    }

    pub fn revalidate_paths(&self) -> &[RevalidatePath] {
        &self.revalidate_paths
    }
}

impl<I: Validate + 'static> ActionOptions<I> {
    /// Validate input with its `validator::Validate` implementation.
    #[must_use]
    pub fn validated(self) -> Self {
        self.with_schema(ValidatorSchema::<I>::new())
    }
}

/// Collaborators shared by every action: where clients come from and where
/// revalidations go.
#[derive(Clone)]
pub struct ActionRuntime {
    clients: Arc<dyn BackendClientFactory>,
    revalidator: Arc<dyn Revalidator>,
}

impl ActionRuntime {
    pub fn new(clients: Arc<dyn BackendClientFactory>, revalidator: Arc<dyn Revalidator>) -> Self {
        Self {
            clients,
            revalidator,
        }
    }

    /// Wrap `handler` into an [`Action`] bound to this runtime.
    pub fn create_action<I, O, H>(
        &self,
        name: &'static str,
        handler: H,
        options: ActionOptions<I>,
    ) -> Action<I, O>
    where
        H: ActionHandler<I, O> + 'static,
    {
        Action::new(self.clone(), name, handler, options)
    }
}

impl fmt::Debug for ActionRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRuntime").finish_non_exhaustive()
    }
}

/// A handler wrapped with authentication, validation and error
/// normalisation.
pub struct Action<I, O> {
    name: &'static str,
    runtime: ActionRuntime,
    handler: Arc<dyn ActionHandler<I, O>>,
    options: ActionOptions<I>,
}

impl<I, O> Clone for Action<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            runtime: self.runtime.clone(),
            handler: Arc::clone(&self.handler),
            options: self.options.clone(),
        }
    }
}

impl<I, O> Action<I, O> {
    pub fn new<H>(
        runtime: ActionRuntime,
        name: &'static str,
        handler: H,
        options: ActionOptions<I>,
    ) -> Self
    where
        H: ActionHandler<I, O> + 'static,
    {
        Self {
            name,
            runtime,
            handler: Arc::new(handler),
            options,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &ActionOptions<I> {
        &self.options
    }

    /// Run the action for the caller identified by `scope`.
    ///
    /// Every failure is returned as [`ActionResult::Failure`]; only a
    /// navigation request from the handler is returned as `Err`.
    pub async fn run(
        &self,
        scope: &RequestScope,
        input: I,
    ) -> Result<ActionResult<O>, NavigationSignal> {
        let span = tracing::info_span!("action", action = self.name);
        self.execute(scope, input).instrument(span).await
    }

    async fn execute(
        &self,
        scope: &RequestScope,
        input: I,
    ) -> Result<ActionResult<O>, NavigationSignal> {
        let client = match self.runtime.clients.acquire(scope) {
            Ok(client) => client,
            Err(error) => return self.fail(ActionFailure::from(error)),
        };

        let user = if self.options.require_auth {
            match client.get_user().await {
                Ok(Some(user)) => Some(user),
                Ok(None) => {
                    tracing::debug!("no signed-in user");
                    return Ok(ActionResult::from_error(not_signed_in()));
                }
                Err(error) => {
                    tracing::debug!(%error, "user lookup failed");
                    return Ok(ActionResult::from_error(not_signed_in()));
                }
            }
        } else {
            None
        };

        let input = match &self.options.schema {
            Some(schema) => match schema.validate(input) {
                Ok(validated) => validated,
                Err(failure) => {
                    tracing::debug!(issues = failure.issues.len(), "input rejected");
                    return Ok(ActionResult::from_error(map_validation_error(&failure)));
                }
            },
            None => input,
        };

        let context = ActionContext::new(client, user);
        let outcome = AssertUnwindSafe(self.handler.handle(input, context))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(data)) => {
                self.revalidate().await;
                Ok(ActionResult::success(data))
            }
            Ok(Err(failure)) => self.fail(failure),
            Err(_) => {
                tracing::error!("action handler panicked");
                Ok(ActionResult::from_error(Error::internal(GENERIC_FAILURE_MESSAGE)))
            }
        }
    }

    fn fail(&self, failure: ActionFailure) -> Result<ActionResult<O>, NavigationSignal> {
        match failure.into_error() {
            Ok(error) => {
                match error.code() {
                    ErrorCode::InternalError | ErrorCode::DatabaseError => {
                        tracing::error!(code = %error.code(), message = error.message(), "action failed");
                    }
                    code => tracing::info!(%code, "action failed"),
                }
                Ok(ActionResult::from_error(error))
            }
            Err(signal) => {
                tracing::debug!(%signal, "action requested navigation");
                Err(signal)
            }
        }
    }

    async fn revalidate(&self) {
        for path in &self.options.revalidate_paths {
            if let Err(error) = self.runtime.revalidator.revalidate(path).await {
                tracing::warn!(path = %path.path, %error, "revalidation failed");
            }
        }
    }
}

fn not_signed_in() -> Error {
    Error::not_authenticated(NOT_SIGNED_IN_MESSAGE)
}
