//! Error types for the Skycast pipeline

use thiserror::Error;

/// Main error type for Skycast
#[derive(Error, Debug)]
pub enum SkycastError {
    /// Caller supplied coordinates or a query we cannot serve
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Upstream answered with a non-success status
    #[error("Upstream error: {status} from {endpoint}")]
    Upstream { status: u16, endpoint: String },

    /// Transport failure (connect, timeout, retries exhausted)
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// Response body could not be read or decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SkycastError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream status error
    pub fn upstream<S: Into<String>>(status: u16, endpoint: S) -> Self {
        Self::Upstream {
            status,
            endpoint: endpoint.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the caller is at fault (maps to a 4xx at the HTTP layer)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, SkycastError::Validation { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SkycastError::Validation { message } => message.clone(),
            SkycastError::Upstream { .. } | SkycastError::Network { .. } => {
                "Weather provider is unavailable. Please try again later.".to_string()
            }
            SkycastError::Decode { .. } => {
                "Weather provider returned data we could not read.".to_string()
            }
            SkycastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for SkycastError {
    fn from(err: serde_json::Error) -> Self {
        SkycastError::decode(err.to_string())
    }
}

impl From<reqwest::Error> for SkycastError {
    fn from(err: reqwest::Error) -> Self {
        SkycastError::Network {
            source: reqwest_middleware::Error::Reqwest(err),
        }
    }
}
