//! IQAir (AirVisual) API client.
//!
//! Fetches current pollution for the city nearest to a coordinate pair via
//! the `nearest_city` endpoint:
//!   http://api.airvisual.com/v2/nearest_city?lat=..&lon=..&key=..
//!
//! Success envelope:
//!   { "status": "success", "data": { "current": { "pollution": {...} } } }
//! Failure envelope:
//!   { "status": "fail", "data": { "message": "..." } }
//!
//! One call in, one request out. Nothing here retries.

use crate::error::AirQualityError;
use crate::model::{Location, PollutionReading};
use serde::Deserialize;
use serde_json::Value;

pub const IQAIR_API_BASE: &str = "http://api.airvisual.com/v2";

const UNKNOWN_ERROR: &str = "Unknown error";

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Anything that can report current pollution for a coordinate pair.
///
/// The collector and the query service both hold one of these, so tests
/// can substitute a canned source for the real API.
pub trait PollutionSource: Send + Sync {
    fn fetch_pollution(&self, latitude: f64, longitude: f64)
    -> Result<PollutionReading, AirQualityError>;

    /// The deployment's fixed location.
    fn fixed_location(&self) -> Location;

    fn fetch_for_fixed_location(&self) -> Result<PollutionReading, AirQualityError> {
        let location = self.fixed_location();
        self.fetch_pollution(location.latitude, location.longitude)
    }
}

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NearestCityResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct CityData {
    current: CurrentConditions,
}

#[derive(Deserialize)]
struct CurrentConditions {
    pollution: PollutionReading,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds the `nearest_city` URL for a coordinate pair.
pub fn build_nearest_city_url(base_url: &str, latitude: f64, longitude: f64, api_key: &str) -> String {
    format!(
        "{}/nearest_city?lat={}&lon={}&key={}",
        base_url.trim_end_matches('/'),
        latitude,
        longitude,
        urlencoding::encode(api_key)
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a 2xx `nearest_city` body.
///
/// # Errors
/// - `UpstreamFailure` when `status` is anything but `"success"`, carrying
///   `data.message` (or "Unknown error").
/// - `UpstreamFailure` when the body is not the expected JSON shape.
pub fn parse_nearest_city_response(json: &str) -> Result<PollutionReading, AirQualityError> {
    let response: NearestCityResponse = serde_json::from_str(json)
        .map_err(|e| AirQualityError::UpstreamFailure(format!("malformed response: {}", e)))?;

    if response.status != "success" {
        let message = response
            .data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ERROR);
        return Err(AirQualityError::UpstreamFailure(message.to_string()));
    }

    let data: CityData = serde_json::from_value(response.data)
        .map_err(|e| AirQualityError::UpstreamFailure(format!("malformed response: {}", e)))?;

    Ok(data.current.pollution)
}

/// Pulls a human-readable message out of an error body. IQAir nests it under
/// `data.message`; some gateways put it at the top level.
pub fn extract_error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return UNKNOWN_ERROR.to_string();
    };

    json.get("message")
        .and_then(Value::as_str)
        .or_else(|| json.pointer("/data/message").and_then(Value::as_str))
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

/// Blocking IQAir client bound to one API key and one fixed location.
#[derive(Clone)]
pub struct IqAirClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    fixed_location: Location,
}

impl IqAirClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        fixed_location: Location,
    ) -> Result<Self, AirQualityError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("airmon_service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AirQualityError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            fixed_location,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl PollutionSource for IqAirClient {
    fn fetch_pollution(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<PollutionReading, AirQualityError> {
        let url = build_nearest_city_url(&self.base_url, latitude, longitude, &self.api_key);
        tracing::debug!(latitude, longitude, "requesting nearest_city");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| AirQualityError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AirQualityError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(AirQualityError::UpstreamStatus {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        parse_nearest_city_response(&body)
    }

    fn fixed_location(&self) -> Location {
        self.fixed_location
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
