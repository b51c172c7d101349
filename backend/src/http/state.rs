//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::SeatingService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for store operations
    pub repository: Arc<dyn FullRepository>,
    /// Allocation pipeline; owns the per-exam locks, so it is shared, not rebuilt
    pub seating: SeatingService,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            seating: SeatingService::new(Arc::clone(&repository)),
            repository,
        }
    }
}
