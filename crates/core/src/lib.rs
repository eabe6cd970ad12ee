//! Core business logic for account-manager.

pub mod services;

pub use services::*;
