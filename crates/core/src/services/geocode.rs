//! Postal-code lookup for account enrichment.
//!
//! Resolves a country code plus postal code into place name, state
//! abbreviation, and coordinates via an external lookup service
//! (zippopotam.us by default). The lookup runs inline in the request path,
//! so the client always carries an explicit timeout.

use std::time::Duration;

use accman_common::config::GeocodeConfig;
use accman_common::{AppError, AppResult};
use accman_db::entities::account::Country;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Geolocation data derived from one postal-code lookup.
///
/// The four fields form a unit: an account either carries all of them from
/// a single successful lookup or none at all.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceInfo {
    /// Place name, e.g. "Beverly Hills".
    pub place: String,
    /// Two-letter state abbreviation, e.g. "CA".
    pub state: String,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

/// Lookup seam for postal-code resolution.
///
/// Handlers depend on this trait rather than on a concrete HTTP client so
/// tests can substitute a stub.
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    /// Resolve a country and postal code to place data.
    async fn resolve(&self, country: Country, postal_code: &str) -> AppResult<PlaceInfo>;
}

/// Client for the zippopotam.us postal-code API.
#[derive(Debug, Clone)]
pub struct ZippopotamClient {
    base_url: String,
    http: reqwest::Client,
}

impl ZippopotamClient {
    /// Create a new client from configuration.
    pub fn new(config: &GeocodeConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

/// Wire format of a lookup response: a JSON object with a `places` array.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    places: Vec<LookupPlace>,
}

/// One entry of the `places` array. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct LookupPlace {
    #[serde(rename = "place name")]
    place_name: String,
    #[serde(rename = "state abbreviation")]
    state_abbreviation: String,
    longitude: String,
    latitude: String,
}

/// Extract the first place from a lookup response.
fn parse_place(response: LookupResponse) -> AppResult<PlaceInfo> {
    let place = response
        .places
        .into_iter()
        .next()
        .ok_or_else(|| AppError::ExternalService("lookup response has no places".to_string()))?;

    let longitude: f64 = place
        .longitude
        .parse()
        .map_err(|_| AppError::ExternalService(format!("bad longitude: {}", place.longitude)))?;
    let latitude: f64 = place
        .latitude
        .parse()
        .map_err(|_| AppError::ExternalService(format!("bad latitude: {}", place.latitude)))?;

    Ok(PlaceInfo {
        place: place.place_name,
        state: place.state_abbreviation,
        longitude,
        latitude,
    })
}

#[async_trait]
impl GeocodeLookup for ZippopotamClient {
    async fn resolve(&self, country: Country, postal_code: &str) -> AppResult<PlaceInfo> {
        let url = format!("{}/{}/{}", self.base_url, country.code(), postal_code);
        debug!(%url, "Resolving postal code");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("lookup request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("malformed lookup response: {e}")))?;

        parse_place(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_from_lookup_json() {
        let body = r#"{
            "post code": "90210",
            "country": "United States",
            "country abbreviation": "US",
            "places": [{
                "place name": "Beverly Hills",
                "longitude": "-118.4065",
                "state": "California",
                "state abbreviation": "CA",
                "latitude": "34.0901"
            }]
        }"#;

        let response: LookupResponse = serde_json::from_str(body).unwrap();
        let info = parse_place(response).unwrap();

        assert_eq!(info.place, "Beverly Hills");
        assert_eq!(info.state, "CA");
        assert_eq!(info.longitude, -118.4065);
        assert_eq!(info.latitude, 34.0901);
    }

    #[test]
    fn test_parse_place_rejects_empty_places() {
        let response: LookupResponse = serde_json::from_str(r#"{"places": []}"#).unwrap();
        assert!(parse_place(response).is_err());

        // A body without a places array at all is treated the same way.
        let response: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_place(response).is_err());
    }

    #[test]
    fn test_parse_place_rejects_unparseable_coordinates() {
        let body = r#"{
            "places": [{
                "place name": "Beverly Hills",
                "longitude": "not-a-number",
                "state abbreviation": "CA",
                "latitude": "34.0901"
            }]
        }"#;

        let response: LookupResponse = serde_json::from_str(body).unwrap();
        assert!(parse_place(response).is_err());
    }

    #[test]
    fn test_client_strips_trailing_slash_from_base_url() {
        let config = GeocodeConfig {
            base_url: "https://api.zippopotam.us/".to_string(),
            timeout_secs: 5,
        };

        let client = ZippopotamClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.zippopotam.us");
    }
}
