//! Database entities.

pub mod account;

pub use account::Entity as Account;
