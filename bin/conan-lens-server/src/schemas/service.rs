//! Service-level responses: root info, health and repositories.

use serde::Serialize;
use utoipa::ToSchema;

/// `GET /`
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    /// Whether the registry has finished initialising.
    pub registry_available: bool,
    pub available_remotes: Vec<String>,
    pub default_remote: Option<String>,
    /// Remotes the installed registry knows about; `0` until it is ready.
    pub configured_remotes: usize,
}

/// `GET /health`
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub registry: String,
    pub remotes: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryInfo {
    pub name: String,
    /// Remote URL, or `"Not configured"`.
    pub url: String,
    pub available: bool,
    pub description: String,
    pub is_default: bool,
}

/// `GET /repositories`
#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoriesResponse {
    pub repositories: Vec<RepositoryInfo>,
    pub default: Option<String>,
}

/// `POST /admin/registry/reload`
#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    pub status: String,
    pub remotes: usize,
}
