//! Service info and health endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::service::{HealthStatus, ServiceInfo};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_root, get_health), components(schemas(ServiceInfo, HealthStatus)))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
}

/// Service information. Answers while the registry is still initialising.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    )
)]
pub async fn get_root(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    let catalog = state.registry.current();
    Json(ServiceInfo {
        message: "Conan Lens API".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        registry_available: catalog.is_some(),
        available_remotes: vec![state.config.remote_name.clone()],
        default_remote: Some(state.config.remote_name.clone()),
        configured_remotes: catalog.map_or(0, |c| c.registry_remotes().len()),
    })
}

/// Heartbeat endpoint; 503 until the registry is installed.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Registry is available", body = HealthStatus),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthStatus>, ServerError> {
    let catalog = state.registry.catalog()?;
    Ok(Json(HealthStatus {
        status: "healthy".to_owned(),
        registry: "available".to_owned(),
        remotes: catalog.registry_remotes().len(),
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
