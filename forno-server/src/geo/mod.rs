//! Address geocoding
//!
//! `Geocoder` resolves a free-form address to coordinates. The production
//! implementation calls the Google Geocoding REST API; tests plug in fixed
//! lookups through the same trait.

use std::time::Duration;

use async_trait::async_trait;
use shared::GeoPoint;
use thiserror::Error;

const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoding provider returned {status}: {message}")]
    Provider { status: String, message: String },
    #[error("malformed geocoding response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the provider has no match for the address.
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeoError>;
}

pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeoError> {
        let resp: serde_json::Value = self
            .client
            .get(GOOGLE_GEOCODE_URL)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_google_response(&resp)
    }
}

/// Extract the first result's location from a Geocoding API response body.
fn parse_google_response(resp: &serde_json::Value) -> Result<Option<GeoPoint>, GeoError> {
    let status = resp["status"].as_str().unwrap_or("");
    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        "" => return Err(GeoError::Malformed("missing status".into())),
        other => {
            return Err(GeoError::Provider {
                status: other.to_string(),
                message: resp["error_message"].as_str().unwrap_or("").to_string(),
            });
        }
    }

    let location = &resp["results"][0]["geometry"]["location"];
    match (location["lat"].as_f64(), location["lng"].as_f64()) {
        (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng))),
        _ => Err(GeoError::Malformed("result without geometry.location".into())),
    }
}

/// Cache key for an address: lowercased, whitespace collapsed, trailing
/// punctuation dropped.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([',', '.', ';'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("  Via Roma   12,\tMilano. "),
            "via roma 12, milano"
        );
        assert_eq!(normalize_address("VIA ROMA 12"), normalize_address("via roma 12"));
        assert_eq!(normalize_address("   "), "");
    }

    #[test]
    fn test_parse_ok() {
        let body = json!({
            "status": "OK",
            "results": [{ "geometry": { "location": { "lat": 45.46, "lng": 9.19 } } }]
        });
        let point = parse_google_response(&body).unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(45.46, 9.19));
    }

    #[test]
    fn test_parse_zero_results() {
        let body = json!({ "status": "ZERO_RESULTS", "results": [] });
        assert!(parse_google_response(&body).unwrap().is_none());
    }

    #[test]
    fn test_parse_provider_error() {
        let body = json!({ "status": "REQUEST_DENIED", "error_message": "bad key" });
        match parse_google_response(&body) {
            Err(GeoError::Provider { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_geometry() {
        let body = json!({ "status": "OK", "results": [{}] });
        assert!(matches!(
            parse_google_response(&body),
            Err(GeoError::Malformed(_))
        ));
    }
}
