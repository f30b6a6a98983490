//! View state for the current weather and forecast screens.
//!
//! `WeatherViewModel` is owned by the UI task. Fetches run as independent
//! tasks and post their results back; results are applied in arrival order,
//! so the last fetch to complete is what the screens show. An error stays
//! visible until the next error replaces it or the user dismisses it.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use stratus_weather::{
    Coordinate, CurrentConditions, DayForecast, Fix, Geocoder, PreferenceStore, WeatherService,
};

use crate::services::weather_service::{self, ServiceSender, WeatherError, WeatherServiceMessage};

/// Shown when reverse geocoding finds a place without a usable name
pub const UNKNOWN_PLACE: &str = "Unknown Place";

/// Everything the screens render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub current: CurrentConditions,
    pub forecast: Vec<DayForecast>,
    pub city_name: String,
    pub error_message: Option<String>,
    /// Coordinate the displayed current conditions were fetched for
    pub current_coordinate: Option<Coordinate>,
    /// Coordinate the displayed forecast was fetched for
    pub forecast_coordinate: Option<Coordinate>,
    pub saved_coordinate: Option<Coordinate>,
    pub last_fix: Option<Coordinate>,
}

pub struct WeatherViewModel {
    runtime: Handle,
    weather: Arc<dyn WeatherService>,
    geocoder: Arc<dyn Geocoder>,
    preferences: PreferenceStore,
    tx: ServiceSender,
    rx: mpsc::UnboundedReceiver<WeatherServiceMessage>,
    in_flight: usize,
    state: ViewState,
}

impl WeatherViewModel {
    /// Create the view model, restoring the saved coordinate.
    pub fn new(
        runtime: Handle,
        weather: Arc<dyn WeatherService>,
        geocoder: Arc<dyn Geocoder>,
        preferences: PreferenceStore,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let saved_coordinate = preferences.saved_coordinate();
        if let Some(c) = saved_coordinate {
            tracing::info!("Restored saved coordinate {}", c);
        }

        Self {
            runtime,
            weather,
            geocoder,
            preferences,
            tx,
            rx,
            in_flight: 0,
            state: ViewState {
                saved_coordinate,
                ..ViewState::default()
            },
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn saved_coordinate(&self) -> Option<Coordinate> {
        self.state.saved_coordinate
    }

    /// Last device fix, otherwise the saved coordinate
    pub fn active_coordinate(&self) -> Option<Coordinate> {
        self.state.last_fix.or(self.state.saved_coordinate)
    }

    /// Requests whose results have not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn fetch_current(&mut self, coordinate: Coordinate) {
        tracing::debug!("Fetching current weather for {}", coordinate);
        self.in_flight += 1;
        weather_service::request_current(&self.runtime, &self.tx, self.weather.clone(), coordinate);
    }

    pub fn fetch_forecast(&mut self, coordinate: Coordinate) {
        tracing::debug!("Fetching forecast for {}", coordinate);
        self.in_flight += 1;
        weather_service::request_forecast(&self.runtime, &self.tx, self.weather.clone(), coordinate);
    }

    /// Forward geocode `name`. On success the coordinate is saved and returned.
    pub async fn resolve_city(&mut self, name: &str) -> Option<Coordinate> {
        let places = match self.geocoder.forward(name).await {
            Ok(places) => places,
            Err(e) => {
                tracing::warn!("Geocoding '{}' failed: {}", name, e);
                self.set_error(WeatherError::Geocoding(e.to_string()));
                return None;
            }
        };

        let Some(place) = places.into_iter().next() else {
            tracing::info!("No location found for '{}'", name);
            self.set_error(WeatherError::NoLocationFound);
            return None;
        };

        self.state.city_name = place.display_name();
        self.persist(place.coordinate);
        Some(place.coordinate)
    }

    /// Resolve `name`, then fetch current conditions and the forecast for it.
    pub async fn search_city(&mut self, name: &str) -> Option<Coordinate> {
        let coordinate = self.resolve_city(name).await?;
        self.fetch_current(coordinate);
        self.fetch_forecast(coordinate);
        Some(coordinate)
    }

    /// A new device fix: save it, refresh the forecast, and name the place.
    pub fn on_location_fix(&mut self, fix: Fix) {
        let coordinate = fix.coordinate;
        self.state.last_fix = Some(coordinate);
        self.persist(coordinate);

        match fix.city_name {
            Some(name) if !name.is_empty() => self.state.city_name = name,
            _ => {
                self.in_flight += 1;
                weather_service::request_place_name(
                    &self.runtime,
                    &self.tx,
                    self.geocoder.clone(),
                    coordinate,
                );
            }
        }

        self.fetch_forecast(coordinate);
    }

    /// Apply fixes published by a location manager as they arrive.
    pub fn watch_location(&self, fixes: watch::Receiver<Option<Fix>>) {
        weather_service::forward_location_fixes(&self.runtime, &self.tx, fixes);
    }

    /// Screen appeared: refresh both screens for the active coordinate.
    ///
    /// Returns false when there is no coordinate to fetch for yet.
    pub fn appear(&mut self) -> bool {
        match self.active_coordinate() {
            Some(coordinate) => {
                self.fetch_current(coordinate);
                self.fetch_forecast(coordinate);
                true
            }
            None => false,
        }
    }

    pub fn dismiss_error(&mut self) {
        self.state.error_message = None;
    }

    pub fn clear_saved_coordinate(&mut self) -> Result<(), stratus_weather::WeatherError> {
        self.preferences.clear_coordinate()?;
        self.state.saved_coordinate = None;
        Ok(())
    }

    /// Apply every result that has already arrived. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
            applied += 1;
        }
        applied
    }

    /// Wait until all outstanding fetches have been applied.
    ///
    /// Every request posts one result, a failed or panicked task included,
    /// so this returns once each counted request has reported.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(message) => self.apply(message),
                None => break,
            }
        }
    }

    /// Wait for the next location fix and apply it, along with anything
    /// that arrives before it.
    ///
    /// Returns `None` if the location feed closes first.
    pub async fn wait_for_location(&mut self) -> Option<Coordinate> {
        while let Some(message) = self.rx.recv().await {
            match message {
                WeatherServiceMessage::LocationFix(fix) => {
                    self.on_location_fix(fix);
                    return self.state.last_fix;
                }
                WeatherServiceMessage::LocationClosed => {
                    tracing::warn!("Location feed closed before a fix arrived");
                    return None;
                }
                other => self.apply(other),
            }
        }
        None
    }

    fn apply(&mut self, message: WeatherServiceMessage) {
        match message {
            WeatherServiceMessage::CurrentDone { coordinate, result } => {
                self.finish_request();
                match result {
                    Ok(current) => {
                        self.state.current = current;
                        self.state.current_coordinate = Some(coordinate);
                    }
                    Err(e) => self.set_error(e),
                }
            }
            WeatherServiceMessage::ForecastDone { coordinate, result } => {
                self.finish_request();
                match result {
                    Ok(forecast) => {
                        self.state.forecast = forecast;
                        self.state.forecast_coordinate = Some(coordinate);
                    }
                    Err(e) => self.set_error(e),
                }
            }
            WeatherServiceMessage::PlaceNameDone(result) => {
                self.finish_request();
                match result {
                    Ok(Some(name)) => self.state.city_name = name,
                    Ok(None) => self.state.city_name = UNKNOWN_PLACE.to_string(),
                    Err(e) => tracing::warn!("Unable to reverse geocode: {}", e),
                }
            }
            WeatherServiceMessage::LocationFix(fix) => self.on_location_fix(fix),
            WeatherServiceMessage::LocationClosed => tracing::debug!("Location feed closed"),
        }
    }

    fn finish_request(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn set_error(&mut self, error: WeatherError) {
        self.state.error_message = Some(error.to_string());
    }

    fn persist(&mut self, coordinate: Coordinate) {
        match self.preferences.save_coordinate(coordinate) {
            // 0/0 is stored but reads back as unset
            Ok(()) => self.state.saved_coordinate = coordinate.is_present().then_some(coordinate),
            Err(e) => tracing::warn!("Failed to save coordinate: {}", e),
        }
    }
}
