//! HTTP API layer for account-manager.
//!
//! This crate provides the REST surface over the account service:
//!
//! - **Endpoints**: CRUD, search, and aggregation routes for accounts
//! - **DTOs**: request validation via `validator`, camelCase JSON bodies
//! - **State**: the shared [`AppState`] handed to every handler
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod state;

pub use endpoints::router;
pub use state::AppState;
