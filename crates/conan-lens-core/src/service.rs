//! Request-level operations over a [`PackageRegistry`].
//!
//! [`Catalog`] validates the remote, asks the registry for references,
//! configurations and latest revisions, then runs the grouping, join, filter
//! and pagination stages and assembles the response. It keeps nothing
//! between requests.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::assemble::{
    AppliedFilters, PackageBinariesResponse, PackageDetail, PackageFilterOptionsResponse,
    PackageVersionsResponse, PackagesListResponse,
};
use crate::error::{CatalogError, Result};
use crate::filter::{BinaryFilter, FilterOptions, ReferenceFilter};
use crate::grouping::{group_versions, matches_query, summarize_packages};
use crate::join::join_binaries;
use crate::model::{ConfigurationMap, RecipeEntry};
use crate::paginate::Pagination;
use crate::pattern::ListPattern;
use crate::reference::ReferenceRecord;
use crate::registry::{PackageRegistry, Remote};
use crate::revision::{ResolvedRevisions, RevisionInfo};

#[derive(Debug, Clone, Default)]
pub struct ListPackagesRequest {
    pub remote: String,
    /// Substring of the package name; empty lists everything.
    pub query: String,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default)]
pub struct BinaryConfigurationRequest {
    pub remote: String,
    pub name: String,
    pub version: String,
    pub user: Option<String>,
    pub channel: Option<String>,
    pub package_id: Option<String>,
    pub recipe_revision: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListBinariesRequest {
    pub remote: String,
    pub name: String,
    pub version: String,
    /// `revision` is the explicitly requested recipe revision, if any.
    pub references: ReferenceFilter,
    pub binaries: BinaryFilter,
}

/// Whether an allowed remote is known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemoteStatus {
    pub name: String,
    pub url: Option<String>,
    pub available: bool,
}

pub struct Catalog {
    registry: Arc<dyn PackageRegistry>,
    allowed_remotes: Vec<String>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("allowed_remotes", &self.allowed_remotes)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    pub fn new(registry: Arc<dyn PackageRegistry>, allowed_remotes: Vec<String>) -> Self {
        Self {
            registry,
            allowed_remotes,
        }
    }

    pub fn allowed_remotes(&self) -> &[String] {
        &self.allowed_remotes
    }

    pub fn default_remote(&self) -> Option<&str> {
        self.allowed_remotes.first().map(String::as_str)
    }

    pub fn registry_remotes(&self) -> Vec<Remote> {
        self.registry.remotes()
    }

    /// The allowed remotes, in order, each with its registry URL if known.
    pub fn supported_remotes(&self) -> Vec<RemoteStatus> {
        self.allowed_remotes
            .iter()
            .map(|name| match self.registry.remote(name) {
                Some(remote) => RemoteStatus {
                    name: remote.name,
                    url: Some(remote.url),
                    available: true,
                },
                None => RemoteStatus {
                    name: name.clone(),
                    url: None,
                    available: false,
                },
            })
            .collect()
    }

    pub fn validate_remote(&self, name: &str) -> Result<Remote> {
        if name.is_empty() {
            return Err(CatalogError::Validation("Remote name is required".into()));
        }
        if !self.allowed_remotes.iter().any(|allowed| allowed == name) {
            return Err(CatalogError::Validation(format!(
                "Unsupported remote '{name}'. Available remotes: {}",
                self.allowed_remotes.join(", ")
            )));
        }
        self.registry.remote(name).ok_or_else(|| {
            CatalogError::NotFound(format!("Remote '{name}' not found in registry configuration"))
        })
    }

    async fn enumerate(&self, pattern: &ListPattern, remote: &Remote) -> Result<Vec<RecipeEntry>> {
        debug!(remote = %remote.name, %pattern, "enumerating references");
        self.registry
            .enumerate_references(pattern, remote)
            .await
            .map_err(|e| CatalogError::upstream(&remote.name, format!("searching '{pattern}'"), e))
    }

    /// Configurations of one reference; a failed fetch degrades to no
    /// configurations at all.
    async fn configurations_or_empty(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> ConfigurationMap {
        match self
            .registry
            .fetch_binary_configurations(reference, remote)
            .await
        {
            Ok(configurations) => configurations,
            Err(e) => {
                warn!(
                    remote = %remote.name,
                    reference = %reference.full_path(),
                    error = %e,
                    "could not fetch binary configurations"
                );
                ConfigurationMap::new()
            }
        }
    }

    /// References of exactly `name/version`, every variant and revision.
    async fn version_entries(
        &self,
        name: &str,
        version: &str,
        remote: &Remote,
    ) -> Result<Vec<RecipeEntry>> {
        let mut entries = self
            .enumerate(&ListPattern::binaries_of(name, version), remote)
            .await?;
        entries.retain(|entry| entry.reference.name == name && entry.reference.version == version);
        Ok(entries)
    }

    pub async fn list_packages(&self, request: ListPackagesRequest) -> Result<PackagesListResponse> {
        let remote = self.validate_remote(&request.remote)?;
        let pattern = ListPattern::recipes_containing(&request.query);
        let entries = self.enumerate(&pattern, &remote).await?;

        let mut summaries = summarize_packages(entries.iter().map(|entry| &entry.reference));
        summaries.retain(|summary| matches_query(&summary.name, &request.query));
        Ok(request.pagination.paginate(&summaries).into())
    }

    pub async fn list_versions(&self, remote: &str, name: &str) -> Result<PackageVersionsResponse> {
        let remote = self.validate_remote(remote)?;
        let entries = self.enumerate(&ListPattern::versions_of(name), &remote).await?;
        Ok(PackageVersionsResponse::new(name, group_versions(name, &entries)))
    }

    pub async fn binary_configuration(
        &self,
        request: BinaryConfigurationRequest,
    ) -> Result<PackageDetail> {
        let remote = self.validate_remote(&request.remote)?;
        let package_id = request
            .package_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                CatalogError::Validation(
                    "package_id parameter is required for package configuration".into(),
                )
            })?;

        let reference = ReferenceRecord::new(&request.name, &request.version)
            .with_user_channel(request.user, request.channel);
        let reference = match request.recipe_revision.filter(|r| !r.is_empty()) {
            Some(revision) => reference.with_revision(revision),
            None => self
                .registry
                .resolve_latest_recipe_revision(&reference, &remote)
                .await
                .map_err(|e| {
                    CatalogError::upstream(&remote.name, format!("resolving {reference}"), e)
                })?
                .ok_or_else(|| CatalogError::NotFound(format!("Package {reference} not found")))?,
        };

        let configurations = self
            .registry
            .fetch_binary_configurations(&reference, &remote)
            .await
            .map_err(|e| {
                CatalogError::upstream(
                    &remote.name,
                    format!("fetching configurations of {}", reference.full_path()),
                    e,
                )
            })?;
        if !configurations.contains_key(&package_id) {
            return Err(CatalogError::NotFound(format!(
                "Package binary with ID '{package_id}' not found"
            )));
        }

        let entry = RecipeEntry::new(reference).with_packages([package_id]);
        let binary = join_binaries(&entry, &configurations)
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound("Package binary not found".into()))?;
        Ok(PackageDetail::new(request.name, request.version, binary))
    }

    pub async fn list_binaries(&self, request: ListBinariesRequest) -> Result<PackageBinariesResponse> {
        let remote = self.validate_remote(&request.remote)?;
        let entries = self
            .version_entries(&request.name, &request.version, &remote)
            .await?;
        if entries.is_empty() {
            let requested = AppliedFilters::new(&request.references, &request.binaries);
            return Ok(PackageBinariesResponse::empty(
                request.name,
                request.version,
                requested,
            ));
        }

        let revision_info = RevisionInfo::collect(entries.iter().map(|entry| &entry.reference));
        let revisions = ResolvedRevisions::from_revisions(revision_info.recipe_revisions.iter().cloned());
        let reference_filter = ReferenceFilter {
            revision: revisions
                .target(request.references.revision.as_deref())
                .map(str::to_owned),
            ..request.references
        };
        let kept = reference_filter.retain(entries);

        let configurations = join_all(
            kept.iter()
                .map(|entry| self.configurations_or_empty(&entry.reference, &remote)),
        )
        .await;
        let binaries = kept
            .iter()
            .zip(&configurations)
            .flat_map(|(entry, configurations)| join_binaries(entry, configurations))
            .collect();
        let binaries = request.binaries.apply(binaries);

        let applied = AppliedFilters::new(&reference_filter, &request.binaries);
        Ok(PackageBinariesResponse::new(
            request.name,
            request.version,
            binaries,
            revision_info,
            applied,
        ))
    }

    pub async fn filter_options(
        &self,
        remote: &str,
        name: &str,
        version: &str,
    ) -> Result<PackageFilterOptionsResponse> {
        let remote = self.validate_remote(remote)?;
        let entries = self.version_entries(name, version, &remote).await?;

        let configurations = join_all(
            entries
                .iter()
                .map(|entry| self.configurations_or_empty(&entry.reference, &remote)),
        )
        .await;

        let mut options = FilterOptions::default();
        for configuration in configurations.iter().flat_map(|map| map.values()) {
            options.observe(&configuration.settings);
        }
        Ok(PackageFilterOptionsResponse::new(name, version, options))
    }
}
