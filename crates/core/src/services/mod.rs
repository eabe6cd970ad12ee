//! Business logic services.

pub mod account;
pub mod geocode;

pub use account::{
    AccountPatch, AccountReplacement, AccountService, CountryCount, NewAccount, PlaceCount,
    StateCount,
};
pub use geocode::{GeocodeLookup, PlaceInfo, ZippopotamClient};
