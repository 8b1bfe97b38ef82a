//! Staff dashboard backend: actions over a hosted data API and identity
//! provider, exposed through a JSON HTTP adapter.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

pub use middleware::trace::{TRACE_ID_HEADER, Trace, TraceId};
