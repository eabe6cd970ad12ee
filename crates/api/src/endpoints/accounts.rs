//! Account endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use accman_common::{AppError, AppResult};
use accman_core::{AccountPatch, AccountReplacement, CountryCount, NewAccount};
use accman_db::entities::account;
use accman_db::entities::account::{AccountStatus, Country};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use crate::state::AppState;

/// Create account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/aggregate", get(aggregate_accounts))
        .route("/find", post(find_account))
        .route(
            "/{id}",
            get(get_account)
                .put(update_account)
                .patch(patch_account)
                .delete(delete_account),
        )
}

/// Postal codes are exactly 5 digits.
fn validate_postal_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("postal_code");
        err.message = Some("postal code must be exactly 5 digits".into());
        Err(err)
    }
}

/// Security pins are exactly 4 digits.
fn validate_security_pin(value: &str) -> Result<(), ValidationError> {
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("security_pin");
        err.message = Some("security pin must be exactly 4 digits".into());
        Err(err)
    }
}

/// Account response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub country: Country,
    pub postal_code: String,
    pub age: Option<i32>,
    pub status: AccountStatus,
    pub place: Option<String>,
    pub state: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub security_pin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<account::Model> for AccountResponse {
    fn from(account: account::Model) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            country: account.country,
            postal_code: account.postal_code,
            age: account.age,
            status: account.status,
            place: account.place,
            state: account.state,
            longitude: account.longitude,
            latitude: account.latitude,
            security_pin: account.security_pin,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Create account request.
///
/// Geolocation fields are absent on purpose: they are derived by the
/// postal-code lookup and never taken from the caller.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Rejected when present; a new account cannot pre-specify identity.
    pub id: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub country: Country,
    #[validate(custom(function = validate_postal_code))]
    pub postal_code: String,
    pub age: Option<i32>,
    /// Ignored; new accounts always start ACTIVE.
    pub status: Option<AccountStatus>,
    #[validate(custom(function = validate_security_pin))]
    pub security_pin: Option<String>,
}

/// Create account response: identifier, final status, and pin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub id: String,
    pub status: AccountStatus,
    pub security_pin: Option<String>,
}

/// Create a new account.
async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    if req.id.is_some() {
        return Err(AppError::BadRequest(
            "a new account cannot already have an id".to_string(),
        ));
    }
    if let Some(status) = req.status {
        debug!(?status, "Ignoring caller-supplied status; new accounts start ACTIVE");
    }

    info!(email = %req.email, "Creating account");

    let account = state
        .account_service
        .create(NewAccount {
            name: req.name,
            email: req.email,
            country: req.country,
            postal_code: req.postal_code,
            age: req.age,
            security_pin: req.security_pin,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            id: account.id,
            status: account.status,
            security_pin: account.security_pin,
        }),
    ))
}

/// Full update request (PUT).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub id: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub country: Country,
    #[validate(custom(function = validate_postal_code))]
    pub postal_code: String,
    pub age: Option<i32>,
    #[serde(default = "default_status")]
    pub status: AccountStatus,
    #[validate(custom(function = validate_security_pin))]
    pub security_pin: Option<String>,
}

const fn default_status() -> AccountStatus {
    AccountStatus::Active
}

/// Replace an account.
async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    req.validate()?;

    info!(account_id = %id, "Updating account");

    let account = state
        .account_service
        .update(
            &id,
            AccountReplacement {
                id: req.id,
                name: req.name,
                email: req.email,
                country: req.country,
                postal_code: req.postal_code,
                age: req.age,
                status: req.status,
                security_pin: req.security_pin,
            },
        )
        .await?;

    Ok(Json(AccountResponse::from(account)))
}

/// Partial update request (merge-patch). Absent fields stay untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchAccountRequest {
    pub id: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub country: Option<Country>,
    #[validate(custom(function = validate_postal_code))]
    pub postal_code: Option<String>,
    pub age: Option<i32>,
    pub status: Option<AccountStatus>,
    pub place: Option<String>,
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[validate(custom(function = validate_security_pin))]
    pub security_pin: Option<String>,
}

/// Merge a sparse patch into an account.
async fn patch_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PatchAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    req.validate()?;

    info!(account_id = %id, "Patching account");

    let account = state
        .account_service
        .patch(
            &id,
            AccountPatch {
                id: req.id,
                name: req.name,
                email: req.email,
                country: req.country,
                postal_code: req.postal_code,
                age: req.age,
                status: req.status,
                place: req.place,
                state: req.state,
                longitude: req.longitude,
                latitude: req.latitude,
                security_pin: req.security_pin,
            },
        )
        .await?;

    Ok(Json(AccountResponse::from(account)))
}

/// List all accounts.
async fn list_accounts(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AccountResponse>>> {
    let accounts = state.account_service.list_all().await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Get a single account.
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.account_service.get_by_id(&id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Search request: lookup by id, falling back to email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindAccountRequest {
    pub id: Option<String>,
    pub email: Option<String>,
}

/// Find an account by id or email.
async fn find_account(
    State(state): State<AppState>,
    Json(req): Json<FindAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    let account = state
        .account_service
        .find_by_id_or_email(req.id.as_deref(), req.email.as_deref())
        .await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Delete query parameters. The pin is mandatory.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountQuery {
    pub pin: String,
}

/// Delete an account.
///
/// Responds 204 whether or not the pin matched; a mismatched pin skips the
/// deletion silently while a non-INACTIVE status is an explicit error.
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteAccountQuery>,
) -> AppResult<StatusCode> {
    info!(account_id = %id, "Deleting account");

    let deleted = state.account_service.delete(&id, &query.pin).await?;
    if !deleted {
        debug!(account_id = %id, "Delete request completed without deletion");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Nested country/state/place counts.
async fn aggregate_accounts(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CountryCount>>> {
    let counts = state.account_service.aggregate().await?;
    Ok(Json(counts))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_create_request() -> CreateAccountRequest {
        CreateAccountRequest {
            id: None,
            name: "Test Account".to_string(),
            email: "test@example.com".to_string(),
            country: Country::Us,
            postal_code: "90210".to_string(),
            age: Some(30),
            status: None,
            security_pin: Some("1234".to_string()),
        }
    }

    #[test]
    fn test_create_request_accepts_valid_payload() {
        assert!(valid_create_request().validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_long_name() {
        let mut req = valid_create_request();
        req.name = "a name way beyond the twenty character limit".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_bad_email() {
        let mut req = valid_create_request();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_non_5_digit_postal_code() {
        for bad in ["1234", "123456", "12a45", ""] {
            let mut req = valid_create_request();
            req.postal_code = bad.to_string();
            assert!(req.validate().is_err(), "postal code {bad:?} should fail");
        }
    }

    #[test]
    fn test_create_request_rejects_non_4_digit_pin() {
        let mut req = valid_create_request();
        req.security_pin = Some("12x4".to_string());
        assert!(req.validate().is_err());

        // The pin itself is optional.
        req.security_pin = None;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_parses_camel_case_body() {
        let body = r#"{
            "name": "Test Account",
            "email": "test@example.com",
            "country": "US",
            "postalCode": "90210",
            "securityPin": "1234"
        }"#;

        let req: CreateAccountRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.postal_code, "90210");
        assert_eq!(req.security_pin.as_deref(), Some("1234"));
        assert!(req.id.is_none());
    }

    #[test]
    fn test_update_request_defaults_status_to_active() {
        let body = r#"{
            "id": "ab12cd",
            "name": "Test Account",
            "email": "test@example.com",
            "country": "US",
            "postalCode": "90210"
        }"#;

        let req: UpdateAccountRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.status, AccountStatus::Active);
    }

    #[test]
    fn test_patch_request_validates_only_present_fields() {
        let sparse: PatchAccountRequest =
            serde_json::from_str(r#"{"id": "ab12cd", "email": "new@example.com"}"#).unwrap();
        assert!(sparse.validate().is_ok());

        let bad_state: PatchAccountRequest =
            serde_json::from_str(r#"{"id": "ab12cd", "state": "CAL"}"#).unwrap();
        assert!(bad_state.validate().is_err());
    }

    #[test]
    fn test_account_response_serializes_camel_case() {
        let response = AccountResponse {
            id: "ab12cd".to_string(),
            name: "Test Account".to_string(),
            email: "test@example.com".to_string(),
            country: Country::Us,
            postal_code: "90210".to_string(),
            age: None,
            status: AccountStatus::Active,
            place: Some("Beverly Hills".to_string()),
            state: Some("CA".to_string()),
            longitude: Some(-118.4065),
            latitude: Some(34.0901),
            security_pin: Some("1234".to_string()),
            created_at: Utc::now(),
            updated_at: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"postalCode\":\"90210\""));
        assert!(json.contains("\"securityPin\":\"1234\""));
        assert!(json.contains("\"status\":\"ACTIVE\""));
        assert!(json.contains("\"country\":\"US\""));
    }
}
