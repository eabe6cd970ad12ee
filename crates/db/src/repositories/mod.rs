//! Data access repositories.

pub mod account;

pub use account::AccountRepository;
