//! Read-side query surface.
//!
//! Three operations, each mapped 1:1 onto an HTTP endpoint in `endpoint`:
//! - live air quality for caller-supplied coordinates
//! - the most polluted stored reading for the fixed location
//! - live air quality for the fixed location

use crate::error::AirQualityError;
use crate::ingest::iqair::PollutionSource;
use crate::model::{AirQualityResult, Location, MostPolluted};
use crate::store::ReadingStore;
use std::sync::Arc;

pub struct AirQualityService {
    source: Arc<dyn PollutionSource>,
    store: Box<dyn ReadingStore>,
    location_name: String,
}

impl AirQualityService {
    pub fn new(
        source: Arc<dyn PollutionSource>,
        store: Box<dyn ReadingStore>,
        location_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            location_name: location_name.into(),
        }
    }

    /// Name of the fixed location, e.g. "Paris".
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Live pollution for raw query-string coordinates.
    pub fn get_air_quality(
        &self,
        latitude: Option<&str>,
        longitude: Option<&str>,
    ) -> Result<AirQualityResult, AirQualityError> {
        let location = parse_coordinates(latitude, longitude)?;
        let pollution = self
            .source
            .fetch_pollution(location.latitude, location.longitude)?;
        Ok(AirQualityResult::new(pollution))
    }

    /// The stored reading with the highest US AQI for the fixed location.
    pub fn get_most_polluted_for_fixed_location(
        &mut self,
    ) -> Result<MostPolluted, AirQualityError> {
        let location = self.source.fixed_location();
        match self.store.most_polluted(location)? {
            Some(reading) => Ok(MostPolluted::from(&reading)),
            None => Err(AirQualityError::NotFound(self.location_name.clone())),
        }
    }

    /// Live pollution for the fixed location.
    pub fn get_current_fixed_location_air_quality(
        &self,
    ) -> Result<AirQualityResult, AirQualityError> {
        let pollution = self.source.fetch_for_fixed_location()?;
        Ok(AirQualityResult::new(pollution))
    }
}

/// Validates raw latitude/longitude query values.
///
/// Checks run in order: presence (absent or blank), numeric format (must
/// parse as a finite number), then range with inclusive bounds.
pub fn parse_coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Location, AirQualityError> {
    let (Some(lat), Some(lon)) = (non_blank(latitude), non_blank(longitude)) else {
        return Err(AirQualityError::MissingParameter);
    };

    let location = Location::new(parse_number(lat)?, parse_number(lon)?);
    if !location.is_valid() {
        return Err(AirQualityError::InvalidRange);
    }

    Ok(location)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(raw: &str) -> Result<f64, AirQualityError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(AirQualityError::InvalidFormat)
}
