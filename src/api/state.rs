//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::services::{BootstrapService, Services, TokenService};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Migrations and credentials
    pub bootstrap: Arc<dyn BootstrapService>,
    /// API key issuance
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Create application state from the service container.
    pub fn from_services(services: &Services) -> Self {
        Self {
            bootstrap: services.bootstrap_service(),
            tokens: services.tokens(),
        }
    }

    /// Create application state with manually injected services.
    pub fn new(bootstrap: Arc<dyn BootstrapService>, tokens: Arc<dyn TokenService>) -> Self {
        Self { bootstrap, tokens }
    }
}
