//! HTTP middleware stack: admin bearer auth, CORS and per-request tracing.

pub mod auth;
pub mod cors;
pub mod trace;
