//! The upstream registry collaborator.
//!
//! The catalog never talks to a remote directly. It is handed a
//! [`PackageRegistry`] and asks it three things: which references match a
//! pattern, what configuration each binary of a reference carries, and which
//! recipe revision of a reference is the latest.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ConfigurationMap, RecipeEntry};
use crate::pattern::ListPattern;
use crate::reference::ReferenceRecord;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One configured upstream remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("authentication with remote '{0}' failed")]
    Authentication(String),

    #[error("remote answered {status} for {url}")]
    Status { status: u16, url: String },

    /// The remote or the snapshot returned data that could not be decoded.
    #[error("malformed index: {0}")]
    MalformedIndex(String),

    #[error("remote '{0}' is not configured")]
    UnknownRemote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::MalformedIndex(e.to_string())
    }
}

#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Every remote this registry can serve.
    fn remotes(&self) -> Vec<Remote>;

    fn remote(&self, name: &str) -> Option<Remote> {
        self.remotes().into_iter().find(|remote| remote.name == name)
    }

    /// References matching `pattern` on `remote`. When the pattern has a
    /// package section each entry also lists the matching binary ids.
    async fn enumerate_references(
        &self,
        pattern: &ListPattern,
        remote: &Remote,
    ) -> Result<Vec<RecipeEntry>, RegistryError>;

    /// Configuration of every binary of `reference`. Binaries the remote
    /// knows nothing about are simply missing from the map.
    async fn fetch_binary_configurations(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> Result<ConfigurationMap, RegistryError>;

    /// `reference` pinned to its latest recipe revision, or `None` when the
    /// remote has no such recipe.
    async fn resolve_latest_recipe_revision(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> Result<Option<ReferenceRecord>, RegistryError>;
}
