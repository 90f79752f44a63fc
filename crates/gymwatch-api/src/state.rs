//! Shared application state for the API server.

use gymwatch_core::QueryService;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The read-side query layer.
    pub query: QueryService,
}

impl AppState {
    /// Wrap a query service.
    pub const fn new(query: QueryService) -> Self {
        Self { query }
    }
}
