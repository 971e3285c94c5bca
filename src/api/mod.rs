pub mod auth;
pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::config::ApiConfig;
use crate::state::IncidentStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncidentStore>,
    pub api: Arc<ApiConfig>,
    /// Backend label reported by the health endpoint
    pub storage: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn IncidentStore>, api: ApiConfig) -> Self {
        Self {
            store,
            api: Arc::new(api),
            storage: "unknown".to_string(),
            started_at: Instant::now(),
        }
    }

    /// Set the storage label
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = storage.into();
        self
    }
}
