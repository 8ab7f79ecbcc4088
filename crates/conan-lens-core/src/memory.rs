//! A registry held entirely in memory.
//!
//! Used by tests and by the server's offline mode, where it is loaded from a
//! JSON snapshot:
//!
//! ```json
//! {
//!   "remotes": [{
//!     "name": "conancenter",
//!     "url": "https://center2.conan.io",
//!     "recipes": [
//!       { "reference": { "name": "zlib", "version": "1.3", "revision": "r1" },
//!         "packages": [{ "package_id": "p1" }] }
//!     ],
//!     "configurations": {
//!       "zlib/1.3#r1": { "p1": { "settings": { "os": "Linux" } } }
//!     }
//!   }]
//! }
//! ```
//!
//! Configurations are keyed by [`ReferenceRecord::full_path`].

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{BinaryConfiguration, ConfigurationMap, RecipeEntry};
use crate::pattern::{ListPattern, RevisionSelector};
use crate::reference::ReferenceRecord;
use crate::registry::{PackageRegistry, RegistryError, Remote};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRegistry {
    #[serde(default)]
    remotes: Vec<MemoryRemote>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryRemote {
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    recipes: Vec<RecipeEntry>,
    #[serde(default)]
    configurations: HashMap<String, ConfigurationMap>,
}

type VariantKey<'a> = (&'a str, &'a str, Option<&'a str>, Option<&'a str>);

fn variant_key(reference: &ReferenceRecord) -> VariantKey<'_> {
    (
        &reference.name,
        &reference.version,
        reference.user.as_deref(),
        reference.channel.as_deref(),
    )
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON snapshot from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&json)?;
        debug!(path = %path.display(), remotes = registry.remotes.len(), "snapshot loaded");
        Ok(registry)
    }

    pub fn with_remote(mut self, remote: Remote) -> Self {
        self.remote_mut(&remote.name).url = remote.url;
        self
    }

    pub fn with_recipe(mut self, remote: &str, entry: RecipeEntry) -> Self {
        self.remote_mut(remote).recipes.push(entry);
        self
    }

    pub fn with_configuration(
        mut self,
        remote: &str,
        reference: &ReferenceRecord,
        package_id: impl Into<String>,
        configuration: BinaryConfiguration,
    ) -> Self {
        self.remote_mut(remote)
            .configurations
            .entry(reference.full_path())
            .or_default()
            .insert(package_id.into(), configuration);
        self
    }

    fn remote_mut(&mut self, name: &str) -> &mut MemoryRemote {
        let index = match self.remotes.iter().position(|r| r.name == name) {
            Some(index) => index,
            None => {
                self.remotes.push(MemoryRemote {
                    name: name.to_owned(),
                    url: String::new(),
                    recipes: Vec::new(),
                    configurations: HashMap::new(),
                });
                self.remotes.len() - 1
            }
        };
        &mut self.remotes[index]
    }

    fn lookup(&self, remote: &Remote) -> Result<&MemoryRemote, RegistryError> {
        self.remotes
            .iter()
            .find(|r| r.name == remote.name)
            .ok_or_else(|| RegistryError::UnknownRemote(remote.name.clone()))
    }
}

#[async_trait]
impl PackageRegistry for MemoryRegistry {
    fn remotes(&self) -> Vec<Remote> {
        self.remotes
            .iter()
            .map(|r| Remote::new(&r.name, &r.url))
            .collect()
    }

    async fn enumerate_references(
        &self,
        pattern: &ListPattern,
        remote: &Remote,
    ) -> Result<Vec<RecipeEntry>, RegistryError> {
        let remote = self.lookup(remote)?;
        let selector = pattern.revision();

        let matched: Vec<&RecipeEntry> = remote
            .recipes
            .iter()
            .filter(|entry| pattern.matches_recipe(&entry.reference))
            .filter(|entry| selector.matches(entry.reference.revision.as_deref()))
            .collect();

        // Unpinned and `latest` patterns keep one revision per variant.
        let matched = match selector {
            RevisionSelector::Matching(_) => matched,
            RevisionSelector::Unpinned | RevisionSelector::Latest => {
                let mut latest: HashMap<VariantKey<'_>, &RecipeEntry> = HashMap::new();
                for entry in matched.iter().copied() {
                    let slot = latest.entry(variant_key(&entry.reference)).or_insert(entry);
                    if entry.reference.revision > slot.reference.revision {
                        *slot = entry;
                    }
                }
                matched
                    .into_iter()
                    .filter(|entry| {
                        latest
                            .get(&variant_key(&entry.reference))
                            .is_some_and(|chosen| std::ptr::eq(*chosen, *entry))
                    })
                    .collect()
            }
        };
        let unpinned = matches!(selector, RevisionSelector::Unpinned) && !pattern.includes_packages();

        let entries = matched
            .into_iter()
            .map(|entry| RecipeEntry {
                reference: if unpinned {
                    ReferenceRecord {
                        revision: None,
                        ..entry.reference.clone()
                    }
                } else {
                    entry.reference.clone()
                },
                packages: entry
                    .packages
                    .iter()
                    .filter(|package| pattern.matches_package(&package.package_id))
                    .cloned()
                    .collect(),
            })
            .collect();
        Ok(entries)
    }

    async fn fetch_binary_configurations(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> Result<ConfigurationMap, RegistryError> {
        let remote = self.lookup(remote)?;
        Ok(remote
            .configurations
            .get(&reference.full_path())
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_latest_recipe_revision(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> Result<Option<ReferenceRecord>, RegistryError> {
        let remote = self.lookup(remote)?;
        let wanted = variant_key(reference);
        let latest = remote
            .recipes
            .iter()
            .map(|entry| &entry.reference)
            .filter(|candidate| variant_key(candidate) == wanted)
            .max_by(|a, b| a.revision.cmp(&b.revision));
        Ok(latest.cloned())
    }
}
