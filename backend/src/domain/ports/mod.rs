//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Actions reach the hosted backend and the frontend cache only through
//! these traits, so adapters can be swapped for in-memory doubles in tests.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_provider;
mod backend_client;
mod revalidator;

pub use auth_provider::{AuthProvider, AuthSession, SignUpOutcome};
pub use backend_client::{
    BackendClient, BackendClientFactory, BackendError, Record, RequestScope,
};
#[cfg(test)]
pub use revalidator::MockRevalidator;
pub use revalidator::{
    NoopRevalidator, RevalidateKind, RevalidatePath, RevalidationError, Revalidator,
};
