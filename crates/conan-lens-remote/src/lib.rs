//! HTTP access to Conan v2 remotes.
//!
//! [`ConanRemoteClient`] implements [`conan_lens_core::PackageRegistry`] for one
//! remote, logging in once when credentials are configured.

pub mod api;
pub mod client;

pub use client::{ClientBuilder, ConanRemoteClient};
