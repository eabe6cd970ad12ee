//! Application state.

use accman_core::AccountService;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account business logic.
    pub account_service: AccountService,
}
