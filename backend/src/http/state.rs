//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AuthSettings;
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    pub tokens: TokenService,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FullRepository>, auth: AuthSettings) -> Self {
        Self {
            repository,
            tokens: auth.token_service(),
            auth: Arc::new(auth),
        }
    }

    pub fn repo(&self) -> &dyn FullRepository {
        self.repository.as_ref()
    }
}
