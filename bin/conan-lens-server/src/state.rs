//! Shared application state injected into every Axum handler.

use std::sync::{Arc, RwLock};

use conan_lens_core::{Catalog, CatalogError};

use crate::config::Config;

/// The installed [`Catalog`], empty until initialisation completes.
///
/// Handlers take one `Arc` snapshot per request; a reload swaps the `Arc`
/// and in-flight requests keep the catalog they started with.
#[derive(Default)]
pub struct RegistryHandle {
    catalog: RwLock<Option<Arc<Catalog>>>,
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RegistryHandle(ready: {})", self.current().is_some())
    }
}

impl RegistryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, catalog: Catalog) {
        let catalog = Arc::new(catalog);
        match self.catalog.write() {
            Ok(mut slot) => *slot = Some(catalog),
            Err(poisoned) => *poisoned.into_inner() = Some(catalog),
        }
    }

    pub fn current(&self) -> Option<Arc<Catalog>> {
        match self.catalog.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The installed catalog, or [`CatalogError::Unavailable`].
    pub fn catalog(&self) -> Result<Arc<Catalog>, CatalogError> {
        self.current().ok_or_else(|| {
            CatalogError::Unavailable("Conan registry is not initialized yet".to_owned())
        })
    }
}

/// State shared across all HTTP handlers and the registry initialiser.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    pub registry: Arc<RegistryHandle>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(RegistryHandle::new()),
        }
    }
}
