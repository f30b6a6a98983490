use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, ConfigError};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "STRATUS_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Longest forecast the screens can show
pub const MAX_FORECAST_DAYS: u8 = 3;

/// One problem found in config.toml, keyed by dotted field path
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Problems found by [`Config::validate`]
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Warnings alone do not make a config invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and the saved-location preferences
    #[serde(skip)]
    pub config_dir: PathBuf,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Device location settings
    #[serde(default)]
    pub location: LocationConfig,
}

/// Unit preference from config.toml or `--units`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Whether readings should be requested in °F / mph.
    ///
    /// `Auto` follows the process locale (`LC_ALL`, then `LANG`).
    pub fn is_imperial(&self) -> bool {
        match self {
            TemperatureUnit::Celsius => false,
            TemperatureUnit::Fahrenheit => true,
            TemperatureUnit::Auto => std::env::var("LC_ALL")
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| std::env::var("LANG").ok())
                .map(|locale| locale_prefers_imperial(&locale))
                .unwrap_or(false),
        }
    }
}

/// Locales whose convention is Fahrenheit.
fn locale_prefers_imperial(locale: &str) -> bool {
    let tag = locale.split('.').next().unwrap_or_default();
    matches!(tag, "en_US" | "en_LR" | "my_MM")
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Unit preference from config.toml or `--units`
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Days shown on the forecast screen
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    /// Open-Meteo forecast endpoint
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Open-Meteo geocoding (city search) endpoint
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Nominatim reverse geocoding endpoint
    #[serde(default = "default_reverse_geocoding_url")]
    pub reverse_geocoding_url: String,
}

fn default_forecast_days() -> u8 {
    MAX_FORECAST_DAYS
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_reverse_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Auto,
            forecast_days: default_forecast_days(),
            forecast_url: default_forecast_url(),
            geocoding_url: default_geocoding_url(),
            reverse_geocoding_url: default_reverse_geocoding_url(),
        }
    }
}

/// Where device fixes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSourceKind {
    /// Approximate position from the public IP address
    #[default]
    Ip,
    /// `location.latitude` / `location.longitude`
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// When false, permission requests are answered with "denied"
    #[serde(default = "default_location_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub source: LocationSourceKind,

    /// Used by the fixed source
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Used by the fixed source
    #[serde(default)]
    pub longitude: Option<f64>,

    /// IP geolocation endpoint
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

fn default_location_enabled() -> bool {
    true
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json/".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: default_location_enabled(),
            source: LocationSourceKind::Ip,
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("stratus")
        })
}

impl Config {
    /// Load configuration from the default directory, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_dir())
    }

    /// Load configuration from `config_dir`, writing defaults on first use
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            let config = Self {
                config_dir: config_dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            AppError::from(ConfigError::Malformed {
                path: config_path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        config.config_dir = config_dir.to_path_buf();

        Ok(config)
    }

    /// Load from the default directory and reject invalid settings
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(AppError::from(ConfigError::Invalid(validation.error_summary())).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.geocoding_url, "weather.geocoding_url", &mut result);
        self.validate_url(
            &self.weather.reverse_geocoding_url,
            "weather.reverse_geocoding_url",
            &mut result,
        );

        if self.weather.forecast_days == 0 {
            result.add_error("weather.forecast_days", "Forecast must cover at least one day");
        } else if self.weather.forecast_days > MAX_FORECAST_DAYS {
            result.add_warning(
                "weather.forecast_days",
                format!("Only the first {} days are shown", MAX_FORECAST_DAYS),
            );
        }

        if !self.location.enabled {
            result.add_warning(
                "location.enabled",
                "Location disabled - search for a city to see weather",
            );
            // The source settings are never read while location is off
            return result;
        }

        match self.location.source {
            LocationSourceKind::Ip => {
                self.validate_url(&self.location.ip_lookup_url, "location.ip_lookup_url", &mut result);
            }
            LocationSourceKind::Fixed => match (self.location.latitude, self.location.longitude) {
                (Some(lat), Some(lon)) => {
                    if !(-90.0..=90.0).contains(&lat) {
                        result.add_error("location.latitude", "Latitude must be within ±90");
                    }
                    if !(-180.0..=180.0).contains(&lon) {
                        result.add_error("location.longitude", "Longitude must be within ±180");
                    }
                }
                _ => result.add_error(
                    "location",
                    "Fixed location source needs both latitude and longitude",
                ),
            },
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `config_dir/config.toml`
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(self.config_path(), contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}
