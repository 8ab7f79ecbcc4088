//! Package browsing routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use conan_lens_core::{
    AppliedFilters, BinaryRecord, FilterDimensions, PackageBinariesResponse, PackageDetail,
    PackageFilterOptionsResponse, PackageSummary, PackageVersionsResponse, PackagesListResponse,
    RevisionInfo, Variant, VersionGroup,
};
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::packages::{BinariesQuery, ConfigurationQuery, ListPackagesQuery, RemoteQuery};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_packages, list_versions, get_configuration, get_filter_options, list_binaries),
    components(schemas(
        ListPackagesQuery,
        RemoteQuery,
        ConfigurationQuery,
        BinariesQuery,
        PackagesListResponse,
        PackageSummary,
        PackageVersionsResponse,
        VersionGroup,
        Variant,
        PackageDetail,
        PackageFilterOptionsResponse,
        FilterDimensions,
        PackageBinariesResponse,
        BinaryRecord,
        RevisionInfo,
        AppliedFilters
    ))
)]
pub struct PackagesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/packages", get(list_packages))
        .route("/packages/{name}", get(list_versions))
        .route("/packages/{name}/{version}/configuration", get(get_configuration))
        .route("/packages/{name}/{version}/filter-options", get(get_filter_options))
        .route("/packages/{name}/{version}/binaries", get(list_binaries))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// One page of packages, sorted by name.
#[utoipa::path(
    get,
    path = "/packages",
    tag = "packages",
    params(ListPackagesQuery),
    responses(
        (status = 200, description = "Page of package summaries", body = PackagesListResponse),
        (status = 400, description = "Missing or unsupported remote, or bad paging"),
        (status = 502, description = "The remote failed"),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPackagesQuery>,
) -> Result<Json<PackagesListResponse>, ServerError> {
    query.validate()?;
    let catalog = state.registry.catalog()?;
    info!(remote = %query.remote_name, q = ?query.q, page = query.page, "listing packages");
    Ok(Json(catalog.list_packages(query.into_request()?).await?))
}

/// Every version of a package, with its user/channel variants.
#[utoipa::path(
    get,
    path = "/packages/{name}",
    tag = "packages",
    params(("name" = String, Path, description = "Package name"), RemoteQuery),
    responses(
        (status = 200, description = "Versions of the package", body = PackageVersionsResponse),
        (status = 400, description = "Missing or unsupported remote"),
        (status = 502, description = "The remote failed"),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<RemoteQuery>,
) -> Result<Json<PackageVersionsResponse>, ServerError> {
    let catalog = state.registry.catalog()?;
    Ok(Json(catalog.list_versions(&query.remote_name, &name).await?))
}

/// Settings, options and requirements of one binary.
#[utoipa::path(
    get,
    path = "/packages/{name}/{version}/configuration",
    tag = "packages",
    params(
        ("name" = String, Path, description = "Package name"),
        ("version" = String, Path, description = "Package version"),
        ConfigurationQuery
    ),
    responses(
        (status = 200, description = "Binary configuration", body = PackageDetail),
        (status = 400, description = "Missing remote or package_id"),
        (status = 404, description = "No such recipe or binary"),
        (status = 502, description = "The remote failed"),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn get_configuration(
    State(state): State<Arc<AppState>>,
    Path((name, version)): Path<(String, String)>,
    Query(query): Query<ConfigurationQuery>,
) -> Result<Json<PackageDetail>, ServerError> {
    let catalog = state.registry.catalog()?;
    let request = query.into_request(name, version);
    Ok(Json(catalog.binary_configuration(request).await?))
}

/// Distinct os/arch/compiler/build_type values across the binaries of a version.
#[utoipa::path(
    get,
    path = "/packages/{name}/{version}/filter-options",
    tag = "packages",
    params(
        ("name" = String, Path, description = "Package name"),
        ("version" = String, Path, description = "Package version"),
        RemoteQuery
    ),
    responses(
        (status = 200, description = "Filter values", body = PackageFilterOptionsResponse),
        (status = 400, description = "Missing or unsupported remote"),
        (status = 502, description = "The remote failed"),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn get_filter_options(
    State(state): State<Arc<AppState>>,
    Path((name, version)): Path<(String, String)>,
    Query(query): Query<RemoteQuery>,
) -> Result<Json<PackageFilterOptionsResponse>, ServerError> {
    let catalog = state.registry.catalog()?;
    Ok(Json(catalog.filter_options(&query.remote_name, &name, &version).await?))
}

/// Binaries of a version, narrowed by revision, variant and settings.
#[utoipa::path(
    get,
    path = "/packages/{name}/{version}/binaries",
    tag = "packages",
    params(
        ("name" = String, Path, description = "Package name"),
        ("version" = String, Path, description = "Package version"),
        BinariesQuery
    ),
    responses(
        (status = 200, description = "Matching binaries", body = PackageBinariesResponse),
        (status = 400, description = "Missing or unsupported remote"),
        (status = 502, description = "The remote failed"),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn list_binaries(
    State(state): State<Arc<AppState>>,
    Path((name, version)): Path<(String, String)>,
    Query(query): Query<BinariesQuery>,
) -> Result<Json<PackageBinariesResponse>, ServerError> {
    let catalog = state.registry.catalog()?;
    let request = query.into_request(name, version);
    Ok(Json(catalog.list_binaries(request).await?))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
