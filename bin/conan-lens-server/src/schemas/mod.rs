//! Query and response types of the HTTP API that are not catalog responses.

pub mod packages;
pub mod service;
