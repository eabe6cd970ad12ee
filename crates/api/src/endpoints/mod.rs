//! API endpoints.

mod accounts;

use axum::Router;

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().nest("/accounts", accounts::router())
}
