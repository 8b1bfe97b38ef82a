//! Adapter for the hosted data API (PostgREST) and its identity provider.

mod client;
mod dto;
mod params;

pub use client::{PostgrestClient, PostgrestClientFactory, PostgrestEndpoints};
