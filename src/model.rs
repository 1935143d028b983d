//! Shared data types for air quality readings.
//!
//! Field names on `PollutionReading` follow the IQAir wire format
//! (`ts`, `aqius`, `mainus`, `aqicn`, `maincn`) so the upstream payload can
//! be handed back to callers without renaming anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True when latitude is within [-90, 90] and longitude within
    /// [-180, 180], bounds inclusive.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Pollution data
// ---------------------------------------------------------------------------

/// The `current.pollution` object reported by the upstream API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionReading {
    /// Upstream observation time (not insertion time).
    #[serde(with = "ts_millis")]
    pub ts: DateTime<Utc>,
    /// AQI under the US EPA standard.
    pub aqius: i32,
    /// Main pollutant code for the US AQI (e.g. "p2" = PM2.5).
    pub mainus: String,
    /// AQI under the China MEP standard.
    pub aqicn: i32,
    /// Main pollutant code for the CN AQI.
    pub maincn: String,
}

/// Response body for the live air quality endpoints:
/// `{"result": {"pollution": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityResult {
    pub result: PollutionEnvelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionEnvelope {
    pub pollution: PollutionReading,
}

impl AirQualityResult {
    pub fn new(pollution: PollutionReading) -> Self {
        Self {
            result: PollutionEnvelope { pollution },
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted readings
// ---------------------------------------------------------------------------

/// One persisted observation. Never updated once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub location: Location,
    pub pollution: PollutionReading,
    pub recorded_at: DateTime<Utc>,
}

impl Reading {
    /// Builds a reading stamped with the current time as `recorded_at`.
    pub fn new(location: Location, pollution: PollutionReading) -> Self {
        Self {
            location,
            pollution,
            recorded_at: Utc::now(),
        }
    }
}

/// Response body for the most-polluted query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostPolluted {
    #[serde(with = "ts_millis")]
    pub datetime: DateTime<Utc>,
    pub aqius: i32,
    pub mainus: String,
}

impl From<&Reading> for MostPolluted {
    fn from(reading: &Reading) -> Self {
        MostPolluted {
            datetime: reading.pollution.ts,
            aqius: reading.pollution.aqius,
            mainus: reading.pollution.mainus.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamp format
// ---------------------------------------------------------------------------

/// RFC 3339 in UTC with millisecond precision and a `Z` suffix, the format
/// IQAir uses (`2025-08-07T17:00:00.000Z`).
pub mod ts_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
