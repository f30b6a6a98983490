//! Open-Meteo weather provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{
    Coordinate, CurrentWeather, DailyWeather, UnitSystem, WeatherCondition, WeatherError,
};

const REQUEST_TIMEOUT_SECS: u64 = 10;

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,wind_speed_10m_max";

/// Source of weather readings for a coordinate
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, coordinate: Coordinate) -> Result<CurrentWeather, WeatherError>;

    /// Daily outlook starting today
    async fn daily(&self, coordinate: Coordinate) -> Result<Vec<DailyWeather>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<NaiveDate>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    units: UnitSystem,
    forecast_days: u8,
}

impl WeatherProvider {
    pub fn new(base_url: &str, units: UnitSystem, forecast_days: u8) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            units,
            forecast_days,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        coordinate: Coordinate,
        extra: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("temperature_unit", self.units.temperature_param()),
                ("wind_speed_unit", self.units.wind_speed_param()),
                ("timezone", "auto"),
            ])
            .query(extra)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<ApiError>()
                .await
                .ok()
                .and_then(|e| e.reason)
                .unwrap_or_else(|| status.to_string());
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message: reason,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))
    }
}

#[async_trait]
impl WeatherService for WeatherProvider {
    #[instrument(skip(self), level = "info")]
    async fn current(&self, coordinate: Coordinate) -> Result<CurrentWeather, WeatherError> {
        let body: CurrentResponse = self
            .get_json(coordinate, &[("current", CURRENT_FIELDS)])
            .await?;
        let c = body.current;

        Ok(CurrentWeather {
            temperature: c.temperature_2m,
            feels_like: c.apparent_temperature,
            humidity: c.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
            wind_speed: c.wind_speed_10m,
            condition: WeatherCondition::from_wmo_code(c.weather_code),
            units: self.units,
            updated_at: Utc::now(),
        })
    }

    #[instrument(skip(self), level = "info")]
    async fn daily(&self, coordinate: Coordinate) -> Result<Vec<DailyWeather>, WeatherError> {
        let days = self.forecast_days.to_string();
        let body: DailyResponse = self
            .get_json(
                coordinate,
                &[("daily", DAILY_FIELDS), ("forecast_days", days.as_str())],
            )
            .await?;
        let d = body.daily;

        let mut forecast = Vec::with_capacity(d.time.len());
        for (i, date) in d.time.iter().enumerate() {
            let (Some(high), Some(low)) = (
                d.temperature_2m_max.get(i).copied().flatten(),
                d.temperature_2m_min.get(i).copied().flatten(),
            ) else {
                tracing::debug!("Skipping {} with missing temperatures", date);
                continue;
            };

            forecast.push(DailyWeather {
                date: *date,
                high,
                low,
                wind_speed: d.wind_speed_10m_max.get(i).copied().flatten().unwrap_or(0.0),
                condition: WeatherCondition::from_wmo_code(
                    d.weather_code.get(i).copied().flatten().unwrap_or(0),
                ),
                units: self.units,
            });
        }

        Ok(forecast)
    }
}
