//! The remotes clients may browse.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::service::{RepositoriesResponse, RepositoryInfo};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_repositories),
    components(schemas(RepositoriesResponse, RepositoryInfo))
)]
pub struct RepositoriesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/repositories", get(list_repositories))
}

#[utoipa::path(
    get,
    path = "/repositories",
    tag = "repositories",
    responses(
        (status = 200, description = "Allowed remotes", body = RepositoriesResponse),
        (status = 503, description = "Registry is not initialised yet"),
    )
)]
pub async fn list_repositories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RepositoriesResponse>, ServerError> {
    let catalog = state.registry.catalog()?;
    let default = catalog.default_remote().map(str::to_owned);

    let repositories = catalog
        .supported_remotes()
        .into_iter()
        .map(|remote| {
            let mut description = format!("Conan remote: {}", remote.name);
            if !remote.available {
                description.push_str(" (Not configured)");
            }
            RepositoryInfo {
                is_default: default.as_deref() == Some(remote.name.as_str()),
                url: remote.url.unwrap_or_else(|| "Not configured".to_owned()),
                available: remote.available,
                description,
                name: remote.name,
            }
        })
        .collect();

    Ok(Json(RepositoriesResponse {
        repositories,
        default,
    }))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use crate::routes::testing::{app_with, get_json};
    use conan_lens_core::{MemoryRegistry, Remote};

    #[tokio::test]
    async fn lists_the_allowed_remote() {
        let registry = MemoryRegistry::new().with_remote(Remote::new("conancenter", "https://center2.conan.io"));
        let (status, body) = get_json(app_with(registry), "/repositories").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default"], "conancenter");
        let repo = &body["repositories"][0];
        assert_eq!(repo["url"], "https://center2.conan.io");
        assert_eq!(repo["available"], true);
        assert_eq!(repo["is_default"], true);
        assert_eq!(repo["description"], "Conan remote: conancenter");
    }

    #[tokio::test]
    async fn remote_missing_from_the_registry_is_not_configured() {
        let registry = MemoryRegistry::new().with_remote(Remote::new("other", "https://example.com"));
        let (_, body) = get_json(app_with(registry), "/repositories").await;
        let repo = &body["repositories"][0];
        assert_eq!(repo["url"], "Not configured");
        assert_eq!(repo["available"], false);
        assert_eq!(repo["description"], "Conan remote: conancenter (Not configured)");
    }
}
