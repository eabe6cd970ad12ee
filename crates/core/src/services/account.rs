//! Account service.
//!
//! Carries the business rules of the CRUD surface: forced ACTIVE status on
//! creation, the ACTIVE gate on full updates, merge-patch semantics, the
//! INACTIVE-plus-pin gate on deletion, and the nested aggregation view.

use std::collections::BTreeMap;
use std::sync::Arc;

use accman_common::{AppError, AppResult, IdGenerator};
use accman_db::entities::account;
use accman_db::entities::account::{AccountStatus, Country};
use accman_db::repositories::AccountRepository;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::services::geocode::{GeocodeLookup, PlaceInfo};

/// Bucket key for accounts that have not been enriched yet.
const UNKNOWN_BUCKET: &str = "unknown";

/// Caller-supplied fields for account creation.
///
/// Status and geolocation are deliberately absent: status is forced to
/// ACTIVE and geolocation only ever comes from the postal-code lookup.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Country of residence.
    pub country: Country,
    /// 5-digit postal code.
    pub postal_code: String,
    /// Age in years.
    pub age: Option<i32>,
    /// 4-digit deletion pin.
    pub security_pin: Option<String>,
}

/// Full-replacement payload for PUT.
#[derive(Debug, Clone)]
pub struct AccountReplacement {
    /// Identifier carried in the payload; must match the path.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Country of residence.
    pub country: Country,
    /// 5-digit postal code.
    pub postal_code: String,
    /// Age in years.
    pub age: Option<i32>,
    /// New lifecycle status. Setting INACTIVE here is how an account
    /// becomes eligible for deletion.
    pub status: AccountStatus,
    /// 4-digit deletion pin.
    pub security_pin: Option<String>,
}

/// Sparse payload for PATCH. Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    /// Identifier carried in the payload; must match the path.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Country of residence.
    pub country: Option<Country>,
    /// 5-digit postal code. Patching it does not re-trigger enrichment.
    pub postal_code: Option<String>,
    /// Age in years.
    pub age: Option<i32>,
    /// Lifecycle status.
    pub status: Option<AccountStatus>,
    /// Place name.
    pub place: Option<String>,
    /// State abbreviation.
    pub state: Option<String>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// 4-digit deletion pin.
    pub security_pin: Option<String>,
}

/// Per-place account count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCount {
    /// Place name.
    pub place: String,
    /// Number of accounts in this place.
    pub count: u64,
}

/// Per-state account count with its places.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StateCount {
    /// State abbreviation.
    pub state: String,
    /// Sum of the place counts below.
    pub count: u64,
    /// Per-place breakdown.
    pub places: Vec<PlaceCount>,
}

/// Per-country account count with its states.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountryCount {
    /// Country code.
    pub country: String,
    /// Sum of the state counts below.
    pub count: u64,
    /// Per-state breakdown.
    pub states: Vec<StateCount>,
}

/// Service for managing accounts.
#[derive(Clone)]
pub struct AccountService {
    account_repo: AccountRepository,
    geocoder: Arc<dyn GeocodeLookup>,
    id_gen: IdGenerator,
}

/// Build a fresh account model from a creation draft.
///
/// Status is forced to ACTIVE regardless of what the caller asked for, and
/// geolocation is taken from the lookup result as a unit.
fn build_account(id: String, draft: NewAccount, geo: Option<PlaceInfo>) -> account::Model {
    account::Model {
        id,
        name: draft.name,
        email: draft.email,
        country: draft.country,
        postal_code: draft.postal_code,
        age: draft.age,
        status: AccountStatus::Active,
        place: geo.as_ref().map(|g| g.place.clone()),
        state: geo.as_ref().map(|g| g.state.clone()),
        longitude: geo.as_ref().map(|g| g.longitude),
        latitude: geo.map(|g| g.latitude),
        security_pin: draft.security_pin,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Build the full replacement of an existing account.
///
/// Identifier and creation time survive; everything else, including the
/// geolocation unit, comes from the payload and the fresh lookup result.
fn replace_account(
    existing: account::Model,
    payload: AccountReplacement,
    geo: Option<PlaceInfo>,
) -> account::Model {
    account::Model {
        id: existing.id,
        name: payload.name,
        email: payload.email,
        country: payload.country,
        postal_code: payload.postal_code,
        age: payload.age,
        status: payload.status,
        place: geo.as_ref().map(|g| g.place.clone()),
        state: geo.as_ref().map(|g| g.state.clone()),
        longitude: geo.as_ref().map(|g| g.longitude),
        latitude: geo.map(|g| g.latitude),
        security_pin: payload.security_pin,
        created_at: existing.created_at,
        updated_at: Some(Utc::now()),
    }
}

/// Merge a sparse patch into an existing account.
///
/// Only fields present in the patch overwrite the stored record; absent
/// fields are left untouched.
fn apply_patch(existing: account::Model, patch: AccountPatch) -> account::Model {
    account::Model {
        id: existing.id,
        name: patch.name.unwrap_or(existing.name),
        email: patch.email.unwrap_or(existing.email),
        country: patch.country.unwrap_or(existing.country),
        postal_code: patch.postal_code.unwrap_or(existing.postal_code),
        age: patch.age.or(existing.age),
        status: patch.status.unwrap_or(existing.status),
        place: patch.place.or(existing.place),
        state: patch.state.or(existing.state),
        longitude: patch.longitude.or(existing.longitude),
        latitude: patch.latitude.or(existing.latitude),
        security_pin: patch.security_pin.or(existing.security_pin),
        created_at: existing.created_at,
        updated_at: Some(Utc::now()),
    }
}

/// Group accounts by country, state, and place, counting each level.
fn aggregate_accounts(accounts: &[account::Model]) -> Vec<CountryCount> {
    let mut tree: BTreeMap<&str, BTreeMap<&str, BTreeMap<&str, u64>>> = BTreeMap::new();

    for acct in accounts {
        let state = acct.state.as_deref().unwrap_or(UNKNOWN_BUCKET);
        let place = acct.place.as_deref().unwrap_or(UNKNOWN_BUCKET);
        *tree
            .entry(acct.country.code())
            .or_default()
            .entry(state)
            .or_default()
            .entry(place)
            .or_default() += 1;
    }

    tree.into_iter()
        .map(|(country, states)| {
            let states: Vec<StateCount> = states
                .into_iter()
                .map(|(state, places)| {
                    let places: Vec<PlaceCount> = places
                        .into_iter()
                        .map(|(place, count)| PlaceCount {
                            place: place.to_string(),
                            count,
                        })
                        .collect();
                    StateCount {
                        state: state.to_string(),
                        count: places.iter().map(|p| p.count).sum(),
                        places,
                    }
                })
                .collect();
            CountryCount {
                country: country.to_string(),
                count: states.iter().map(|s| s.count).sum(),
                states,
            }
        })
        .collect()
}

/// Check that a payload carries an id and that it matches the path id.
fn check_payload_id(path_id: &str, payload_id: Option<&str>) -> AppResult<()> {
    let Some(payload_id) = payload_id else {
        return Err(AppError::Validation("payload is missing an id".to_string()));
    };
    if payload_id != path_id {
        return Err(AppError::Validation(format!(
            "payload id {payload_id} does not match path id {path_id}"
        )));
    }
    Ok(())
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(account_repo: AccountRepository, geocoder: Arc<dyn GeocodeLookup>) -> Self {
        Self {
            account_repo,
            geocoder,
            id_gen: IdGenerator::new(),
        }
    }

    /// Run the postal-code lookup, swallowing failures.
    ///
    /// Enrichment is best-effort: a failed lookup is logged and the account
    /// proceeds with empty geolocation fields.
    async fn enrich(&self, country: Country, postal_code: &str) -> Option<PlaceInfo> {
        match self.geocoder.resolve(country, postal_code).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(
                    error = %e,
                    country = country.code(),
                    postal_code,
                    "Postal-code enrichment failed; continuing without geolocation"
                );
                None
            }
        }
    }

    /// Create an account.
    ///
    /// Assigns a fresh identifier, forces status to ACTIVE, and enriches
    /// geolocation from the postal-code lookup.
    pub async fn create(&self, draft: NewAccount) -> AppResult<account::Model> {
        let geo = self.enrich(draft.country, &draft.postal_code).await;
        let model = build_account(self.id_gen.generate(), draft, geo);
        self.account_repo.insert(model).await
    }

    /// Replace an account (PUT).
    ///
    /// The stored record must be ACTIVE; REQUESTED and INACTIVE accounts
    /// cannot be edited. Enrichment is re-run from the payload's country
    /// and postal code.
    pub async fn update(
        &self,
        path_id: &str,
        payload: AccountReplacement,
    ) -> AppResult<account::Model> {
        check_payload_id(path_id, payload.id.as_deref())?;

        // An unknown id on update is a bad request, not a 404.
        if !self.account_repo.exists_by_id(path_id).await? {
            return Err(AppError::Validation(format!(
                "no account with id {path_id}"
            )));
        }

        let existing = self
            .account_repo
            .find_by_id(path_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(path_id.to_string()))?;

        if existing.status != AccountStatus::Active {
            return Err(AppError::BusinessRule(format!(
                "account {path_id} has inactive status and cannot be updated"
            )));
        }

        let geo = self.enrich(payload.country, &payload.postal_code).await;
        self.account_repo
            .update(replace_account(existing, payload, geo))
            .await
    }

    /// Merge a sparse patch into an account (PATCH).
    ///
    /// Does not re-run enrichment and does not gate on status.
    pub async fn patch(&self, path_id: &str, patch: AccountPatch) -> AppResult<account::Model> {
        check_payload_id(path_id, patch.id.as_deref())?;

        if !self.account_repo.exists_by_id(path_id).await? {
            return Err(AppError::Validation(format!(
                "no account with id {path_id}"
            )));
        }

        let existing = self
            .account_repo
            .find_by_id(path_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(path_id.to_string()))?;

        self.account_repo
            .update(apply_patch(existing, patch))
            .await
    }

    /// List all accounts.
    pub async fn list_all(&self) -> AppResult<Vec<account::Model>> {
        self.account_repo.find_all().await
    }

    /// Fetch one account by id.
    pub async fn get_by_id(&self, id: &str) -> AppResult<account::Model> {
        self.account_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Fetch one account by id, falling back to email.
    ///
    /// A non-blank id wins; otherwise a non-blank email is used. Both blank
    /// is a validation error.
    pub async fn find_by_id_or_email(
        &self,
        id: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<account::Model> {
        let id = id.unwrap_or("").trim();
        let email = email.unwrap_or("").trim();

        let found = if !id.is_empty() {
            self.account_repo.find_by_id(id).await?
        } else if !email.is_empty() {
            self.account_repo.find_by_email(email).await?
        } else {
            return Err(AppError::Validation(
                "search needs a non-blank id or email".to_string(),
            ));
        };

        found.ok_or_else(|| AppError::AccountNotFound(format!("id={id} email={email}")))
    }

    /// Delete an account, gated by status and security pin.
    ///
    /// The stored record must be INACTIVE, otherwise the call fails. A
    /// matching pin deletes the record and returns `true`; a non-matching
    /// pin is a silent no-op returning `false`. Both surface as success to
    /// the caller.
    pub async fn delete(&self, id: &str, pin: &str) -> AppResult<bool> {
        if pin.trim().is_empty() {
            return Err(AppError::Validation("pin is required".to_string()));
        }

        let existing = self
            .account_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))?;

        if existing.status != AccountStatus::Inactive {
            return Err(AppError::BusinessRule(format!(
                "account {id} must be INACTIVE before deletion"
            )));
        }

        if existing.security_pin.as_deref() == Some(pin) {
            self.account_repo.delete_by_id(id).await?;
            Ok(true)
        } else {
            warn!(account_id = id, "Delete skipped: security pin mismatch");
            Ok(false)
        }
    }

    /// Nested country/state/place account counts.
    pub async fn aggregate(&self) -> AppResult<Vec<CountryCount>> {
        let accounts = self.account_repo.find_all().await?;
        Ok(aggregate_accounts(&accounts))
    }
}
