//! Building and installing the registry behind the catalog.
//!
//! Startup and `POST /admin/registry/reload` share [`reinitialize`]: a new
//! [`Catalog`] is built from the configuration and swapped into the
//! [`RegistryHandle`](crate::state::RegistryHandle).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use conan_lens_core::{Catalog, MemoryRegistry, PackageRegistry, Remote};
use conan_lens_remote::ConanRemoteClient;
use tracing::{error, info};

use crate::config::Config;
use crate::state::AppState;

/// Build a catalog from a snapshot file or the configured remote.
pub async fn build_catalog(config: &Config) -> anyhow::Result<Catalog> {
    let registry: Arc<dyn PackageRegistry> = match &config.index_file {
        Some(path) => {
            let snapshot = path.clone();
            let registry = tokio::task::spawn_blocking(move || MemoryRegistry::load(snapshot))
                .await?
                .with_context(|| format!("loading index snapshot '{path}'"))?;
            info!(path = %path, "serving from index snapshot");
            Arc::new(registry)
        }
        None => {
            let remote = Remote::new(&config.remote_name, &config.remote_url);
            let mut builder = ConanRemoteClient::builder(remote)
                .set_timeout(Duration::from_secs(config.http_timeout_secs));
            if let Some((user, password)) = config.remote_credentials() {
                builder = builder.set_credentials(user, password);
            }
            let client = builder
                .connect()
                .await
                .with_context(|| format!("connecting to remote '{}'", config.remote_name))?;
            info!(remote = %config.remote_name, url = %config.remote_url, "remote client ready");
            Arc::new(client)
        }
    };
    Ok(Catalog::new(registry, vec![config.remote_name.clone()]))
}

/// Build a fresh catalog and install it. The previous one stays installed
/// when building fails.
pub async fn reinitialize(state: &AppState) -> anyhow::Result<()> {
    let catalog = build_catalog(&state.config).await?;
    let remotes = catalog.registry_remotes().len();
    state.registry.install(catalog);
    info!(remotes, "registry installed");
    Ok(())
}

/// Initialise the registry in the background; catalog routes answer 503
/// until it is installed.
pub fn spawn_initialization(state: Arc<AppState>) {
    tokio::spawn(async move {
        if let Err(e) = reinitialize(&state).await {
            error!(error = ?e, "registry initialization failed; catalog routes stay unavailable");
        }
    });
}

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot_config(path: &str) -> Config {
        Config {
            index_file: Some(path.to_owned()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn snapshot_mode_installs_a_memory_registry() {
        let path = std::env::temp_dir().join(format!("conan-lens-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"remotes": [{"name": "conancenter", "url": "https://center2.conan.io", "recipes": []}]}"#,
        )
        .unwrap();

        let state = AppState::new(snapshot_config(&path.to_string_lossy()));
        reinitialize(&state).await.unwrap();
        let catalog = state.registry.catalog().unwrap();
        assert_eq!(catalog.registry_remotes()[0].name, "conancenter");

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_handle_empty() {
        let state = AppState::new(snapshot_config("/nonexistent/conan-lens-index.json"));
        let err = reinitialize(&state).await.unwrap_err();
        assert!(err.to_string().contains("loading index snapshot"));
        assert!(state.registry.current().is_none());
    }
}
