//! Application services shared by the screens.
//!
//! Owns the tokio runtime and the backends built from config. The view model
//! is created from here so every screen talks to the same clients.

use std::sync::Arc;

use anyhow::{Context, Result};

use stratus_core::{AppError, Config, LocationConfig, LocationSourceKind};
use stratus_weather::location::{DisabledLocationSource, FixedLocationSource, IpLocationSource};
use stratus_weather::{
    Coordinate, Geocoder, GeocodingClient, LocationManager, LocationSource, PreferenceStore,
    UnitSystem, WeatherProvider, WeatherService,
};

use crate::error_mapping::{location_error, weather_error};
use crate::view_model::WeatherViewModel;

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,
    config: Config,
    weather: Arc<dyn WeatherService>,
    geocoder: Arc<dyn Geocoder>,
    location: Arc<LocationManager>,
}

impl AppServices {
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("stratus-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let units = unit_system(&config);
        let provider = WeatherProvider::new(
            &config.weather.forecast_url,
            units,
            config.weather.forecast_days,
        )
        .map_err(weather_error)
        .context("Failed to create weather provider")?;

        let geocoder = GeocodingClient::new(
            &config.weather.geocoding_url,
            &config.weather.reverse_geocoding_url,
        )
        .map_err(weather_error)
        .context("Failed to create geocoding client")?;

        let source = location_source(&config.location)?;

        tracing::info!(
            "Weather services initialized ({:?} units, {} forecast days)",
            units,
            config.weather.forecast_days
        );

        Ok(Self {
            runtime,
            config,
            weather: Arc::new(provider),
            geocoder: Arc::new(geocoder),
            location: Arc::new(LocationManager::new(source)),
        })
    }

    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }

    pub fn location(&self) -> Arc<LocationManager> {
        self.location.clone()
    }

    /// Build a view model that restores the saved coordinate from the config directory.
    pub fn view_model(&self) -> Result<WeatherViewModel, AppError> {
        let preferences = PreferenceStore::open(&self.config.config_dir).map_err(weather_error)?;

        Ok(WeatherViewModel::new(
            self.runtime.handle().clone(),
            self.weather.clone(),
            self.geocoder.clone(),
            preferences,
        ))
    }
}

fn unit_system(config: &Config) -> UnitSystem {
    if config.weather.temperature_unit.is_imperial() {
        UnitSystem::Imperial
    } else {
        UnitSystem::Metric
    }
}

fn location_source(config: &LocationConfig) -> Result<Arc<dyn LocationSource>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledLocationSource));
    }

    match config.source {
        LocationSourceKind::Ip => {
            let source = IpLocationSource::new(&config.ip_lookup_url)
                .map_err(location_error)
                .context("Failed to create IP location source")?;
            Ok(Arc::new(source))
        }
        LocationSourceKind::Fixed => match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => {
                Ok(Arc::new(FixedLocationSource::new(Coordinate::new(lat, lon))))
            }
            _ => anyhow::bail!("Fixed location source needs both latitude and longitude"),
        },
    }
}
