//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **postgrest**: reqwest client for the hosted data API and its identity
//!   provider
//! - **memory**: in-process backend with the same failure vocabulary, used
//!   for local development and tests
//! - **revalidation**: webhook asking the frontend to drop cached views
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod postgrest;
pub mod revalidation;
