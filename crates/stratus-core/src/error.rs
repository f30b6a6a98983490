//! Error hierarchy shared by the Stratus crates.
//!
//! Library crates keep their own error enums. Anything that reaches the
//! binary is folded into [`AppError`], whose `user_message()` is what gets
//! printed; the full `Display` chain goes to the log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short text for the terminal. Never includes raw backend output.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Io(_) => "Could not read or write a local file.",
            AppError::Other(_) => "Something went wrong. Run with RUST_LOG=debug for details.",
        }
    }
}

/// Transport-level failures talking to a weather or geocoding backend.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "No connection to the weather service. Are you online?",
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Try again in a few minutes."
            }
            NetworkError::ServerError { .. } => "The weather service rejected the request.",
            NetworkError::InvalidResponse(_) => "The weather service sent data Stratus could not read.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Malformed config file {path}: {message}")]
    Malformed { path: String, message: String },
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "config.toml has invalid settings. See the log for which ones.",
            ConfigError::Malformed { .. } => "config.toml is not valid TOML.",
        }
    }
}

/// Weather failures that are not transport problems.
///
/// Lookup failures are shown on the screens instead; only the saved-location
/// store can fail a whole command.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Preferences error: {0}")]
    PreferencesError(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::PreferencesError(_) => "The saved location could not be read or written.",
        }
    }
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location access is off. Pass --city or enable [location] in config.toml."
            }
            LocationError::Unavailable(_) => "Could not work out where you are. Pass --city instead.",
        }
    }
}

/// Classify a `reqwest` failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if let Some(status) = self.status() {
            return NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            };
        }
        if self.is_decode() || self.is_body() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
