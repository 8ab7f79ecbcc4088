//! Routes nested under `/admin`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router, middleware};
use tracing::info;
use utoipa::OpenApi;

use crate::bootstrap;
use crate::error::ServerError;
use crate::middleware::auth;
use crate::schemas::service::ReloadResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(reload_registry), components(schemas(ReloadResponse)))]
pub struct AdminApi;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/registry/reload", post(reload_registry))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .with_state(state)
}

/// Rebuild the registry from the current configuration and swap it in.
/// Requests already running keep the previous one.
#[utoipa::path(
    post,
    path = "/admin/registry/reload",
    tag = "admin",
    responses(
        (status = 200, description = "Registry rebuilt", body = ReloadResponse),
        (status = 401, description = "Unauthorised (admin token required)"),
        (status = 500, description = "Rebuilding failed; the previous registry stays installed"),
    )
)]
pub async fn reload_registry(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ServerError> {
    info!("reloading registry");
    bootstrap::reinitialize(&state).await?;
    let catalog = state.registry.catalog()?;
    Ok(Json(ReloadResponse {
        status: "reloaded".to_owned(),
        remotes: catalog.registry_remotes().len(),
    }))
}
