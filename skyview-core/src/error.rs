//! Errors produced while fetching and normalizing weather data.

use reqwest::StatusCode;
use thiserror::Error;

/// Shown to the user for any fetch failure; network and payload problems are
/// deliberately not distinguished on screen.
pub const CONNECTIVITY_MESSAGE: &str = "Check your internet connection.";

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Invalid coordinates: lat {lat}, lon {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
}

impl WeatherError {
    /// Connectivity, timeout or non-2xx failures.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { .. })
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) | Self::Status { .. } | Self::MalformedResponse(_) => {
                CONNECTIVITY_MESSAGE.to_string()
            }
            Self::InvalidCoordinates { .. } => "That location doesn't look right.".to_string(),
            Self::PermissionDenied => {
                "Location permission is needed to show local weather.".to_string()
            }
            Self::InvalidUrl(_) => "Weather service is misconfigured.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_and_status_share_the_connectivity_message() {
        let malformed = WeatherError::MalformedResponse("missing days".into());
        let status = WeatherError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };

        assert_eq!(malformed.user_message(), CONNECTIVITY_MESSAGE);
        assert_eq!(status.user_message(), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn is_network_groups_status_failures() {
        let status = WeatherError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "bad key".into(),
        };
        assert!(status.is_network());
        assert!(!WeatherError::MalformedResponse("x".into()).is_network());
        assert!(!WeatherError::PermissionDenied.is_network());
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = WeatherError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("slow down"));
    }
}
