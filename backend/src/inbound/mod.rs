//! Inbound adapters that translate external requests into action runs while
//! keeping framework details at the edge.

pub mod http;
