//! Account entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account record managed through the CRUD API.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    /// Short random identifier, assigned at creation and immutable.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name, at most 20 characters.
    pub name: String,

    /// Contact email, unique across all accounts.
    #[sea_orm(unique)]
    pub email: String,

    /// Country the account is registered in.
    pub country: Country,

    /// Postal code, exactly 5 digits. Stored as text so leading zeros
    /// survive.
    pub postal_code: String,

    /// Age in years (optional).
    #[sea_orm(nullable)]
    pub age: Option<i32>,

    /// Lifecycle status. Forced to ACTIVE at creation.
    pub status: AccountStatus,

    /// Place name derived from the postal-code lookup.
    #[sea_orm(nullable)]
    pub place: Option<String>,

    /// Two-letter state abbreviation derived from the postal-code lookup.
    #[sea_orm(nullable)]
    pub state: Option<String>,

    /// Longitude derived from the postal-code lookup.
    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    /// Latitude derived from the postal-code lookup.
    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    /// 4-digit pin required to authorize deletion.
    #[sea_orm(nullable)]
    pub security_pin: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Countries accepted by the service.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    /// United States.
    #[sea_orm(string_value = "US")]
    Us,
    /// Germany.
    #[sea_orm(string_value = "DE")]
    De,
    /// Spain.
    #[sea_orm(string_value = "ES")]
    Es,
    /// France.
    #[sea_orm(string_value = "FR")]
    Fr,
}

impl Country {
    /// Two-letter country code as used in postal-code lookup URLs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::De => "DE",
            Self::Es => "ES",
            Self::Fr => "FR",
        }
    }
}

/// Account lifecycle status.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Account has been requested but not yet activated.
    #[sea_orm(string_value = "REQUESTED")]
    Requested,
    /// Account is active and editable.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Account is deactivated; only deletion is allowed from here.
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
}

/// Relationships.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_serde_uses_upper_case_codes() {
        let json = serde_json::to_string(&Country::De).unwrap();
        assert_eq!(json, "\"DE\"");

        let parsed: Country = serde_json::from_str("\"US\"").unwrap();
        assert_eq!(parsed, Country::Us);

        assert!(serde_json::from_str::<Country>("\"GB\"").is_err());
    }

    #[test]
    fn test_status_serde_round_trip() {
        for (status, code) in [
            (AccountStatus::Requested, "\"REQUESTED\""),
            (AccountStatus::Active, "\"ACTIVE\""),
            (AccountStatus::Inactive, "\"INACTIVE\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), code);
            assert_eq!(serde_json::from_str::<AccountStatus>(code).unwrap(), status);
        }
    }
}
