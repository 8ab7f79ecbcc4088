//! Request-level error taxonomy.

use thiserror::Error;

use crate::registry::RegistryError;

/// Every way a catalog request can fail.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request was rejected before reaching the registry.
    #[error("{0}")]
    Validation(String),

    /// A fully-qualified lookup matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// The registry failed while serving the request.
    #[error("upstream error on remote '{remote}' ({context}): {source}")]
    Upstream {
        remote: String,
        context: String,
        #[source]
        source: RegistryError,
    },

    /// The registry has not finished initializing.
    #[error("{0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn upstream(remote: &str, context: impl Into<String>, source: RegistryError) -> Self {
        CatalogError::Upstream {
            remote: remote.to_owned(),
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
