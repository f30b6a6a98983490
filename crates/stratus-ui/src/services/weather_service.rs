//! Weather backend: async fetching for the view model.
//! All network work runs on the tokio runtime; results are posted back over
//! a channel and applied by the owner of the view state.
//!
//! Each request posts exactly one result. The backend call runs in its own
//! task so a panic there still comes back as an error.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;

use stratus_weather::display::forecast_from_daily;
use stratus_weather::{
    Coordinate, CurrentConditions, DayForecast, Fix, Geocoder, WeatherService,
};

/// Error type for view-facing weather operations.
///
/// `Display` is the exact text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    Current(String),
    Forecast(String),
    Geocoding(String),
    NoLocationFound,
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Current(s) => write!(f, "Error fetching current weather data: {}", s),
            WeatherError::Forecast(s) => write!(f, "Error fetching 3-day forecast data: {}", s),
            WeatherError::Geocoding(s) => write!(f, "Geocoding error: {}", s),
            WeatherError::NoLocationFound => write!(f, "No location found"),
        }
    }
}

impl std::error::Error for WeatherError {}

/// Messages sent from async operations back to the view model
#[derive(Debug)]
pub enum WeatherServiceMessage {
    CurrentDone {
        coordinate: Coordinate,
        result: Result<CurrentConditions, WeatherError>,
    },
    ForecastDone {
        coordinate: Coordinate,
        result: Result<Vec<DayForecast>, WeatherError>,
    },
    /// `Ok(None)`: the place has no usable name
    PlaceNameDone(Result<Option<String>, String>),
    LocationFix(Fix),
    /// The location manager went away; no more fixes will arrive
    LocationClosed,
}

pub type ServiceSender = mpsc::UnboundedSender<WeatherServiceMessage>;

/// Fetch current conditions. Sends `CurrentDone` when complete.
pub fn request_current(
    runtime: &Handle,
    tx: &ServiceSender,
    service: Arc<dyn WeatherService>,
    coordinate: Coordinate,
) {
    let tx = tx.clone();
    let work = runtime.spawn(async move { service.current(coordinate).await });
    runtime.spawn(async move {
        let result = match work.await {
            Ok(Ok(weather)) => Ok(CurrentConditions::from_weather(&weather)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(task_failure(e)),
        }
        .map_err(|e| {
            tracing::warn!("Current weather for {} failed: {}", coordinate, e);
            WeatherError::Current(e)
        });
        let _ = tx.send(WeatherServiceMessage::CurrentDone { coordinate, result });
    });
}

/// Fetch the daily forecast. Sends `ForecastDone` when complete.
pub fn request_forecast(
    runtime: &Handle,
    tx: &ServiceSender,
    service: Arc<dyn WeatherService>,
    coordinate: Coordinate,
) {
    let tx = tx.clone();
    let work = runtime.spawn(async move { service.daily(coordinate).await });
    runtime.spawn(async move {
        let result = match work.await {
            Ok(Ok(days)) => Ok(forecast_from_daily(&days)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(task_failure(e)),
        }
        .map_err(|e| {
            tracing::warn!("Forecast for {} failed: {}", coordinate, e);
            WeatherError::Forecast(e)
        });
        let _ = tx.send(WeatherServiceMessage::ForecastDone { coordinate, result });
    });
}

/// Reverse geocode a coordinate. Sends `PlaceNameDone` when complete.
pub fn request_place_name(
    runtime: &Handle,
    tx: &ServiceSender,
    geocoder: Arc<dyn Geocoder>,
    coordinate: Coordinate,
) {
    let tx = tx.clone();
    let work = runtime.spawn(async move { geocoder.reverse(coordinate).await });
    runtime.spawn(async move {
        let result = match work.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(task_failure(e)),
        };
        let _ = tx.send(WeatherServiceMessage::PlaceNameDone(result));
    });
}

/// Forward every published fix as `LocationFix`. Sends `LocationClosed`
/// once the location manager is dropped.
pub fn forward_location_fixes(
    runtime: &Handle,
    tx: &ServiceSender,
    mut fixes: watch::Receiver<Option<Fix>>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        while fixes.changed().await.is_ok() {
            let fix = fixes.borrow_and_update().clone();
            if let Some(fix) = fix {
                if tx.send(WeatherServiceMessage::LocationFix(fix)).is_err() {
                    return;
                }
            }
        }
        tracing::debug!("Location forwarding stopped");
        let _ = tx.send(WeatherServiceMessage::LocationClosed);
    });
}

fn task_failure(e: JoinError) -> String {
    if e.is_panic() {
        "request task panicked".to_string()
    } else {
        "request task was cancelled".to_string()
    }
}
