//! Error taxonomy for the air quality service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirQualityError {
    #[error("Missing required parameters: latitude and longitude")]
    MissingParameter,

    #[error("Invalid coordinates format. Latitude and longitude must be numbers.")]
    InvalidFormat,

    #[error(
        "Invalid coordinates. Latitude must be between -90 and 90, longitude between -180 and 180."
    )]
    InvalidRange,

    /// Upstream answered 2xx but reported `status != "success"`.
    #[error("API Error: {0}")]
    UpstreamFailure(String),

    /// Upstream answered with a non-success HTTP status.
    #[error("IQAir API Error: {status} - {message}")]
    UpstreamStatus { status: u16, message: String },

    /// No response from upstream at all.
    #[error("Network Error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No air quality data found for {0}")]
    NotFound(String),
}

impl AirQualityError {
    /// HTTP status this error is surfaced as.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingParameter | Self::InvalidFormat | Self::InvalidRange => 400,
            Self::NotFound(_) => 404,
            Self::UpstreamFailure(_)
            | Self::UpstreamStatus { .. }
            | Self::Network(_)
            | Self::Storage(_) => 500,
        }
    }

    /// Whether the caller sent bad input.
    pub fn is_client_error(&self) -> bool {
        self.http_status() == 400
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFailure(_) | Self::UpstreamStatus { .. } | Self::Network(_)
        )
    }
}

impl From<postgres::Error> for AirQualityError {
    fn from(e: postgres::Error) -> Self {
        AirQualityError::Storage(e.to_string())
    }
}
