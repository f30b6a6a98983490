//! Weather lookup for Stratus
//!
//! Provides weather data via the Open-Meteo API, city search and reverse
//! geocoding, device location, and the saved-location preference.

pub mod display;
pub mod geocode;
pub mod location;
pub mod preferences;
pub mod provider;
pub mod types;

pub use display::{CurrentConditions, DayForecast};
pub use geocode::{Geocoder, GeocodingClient, Place};
pub use location::{AuthorizationStatus, Fix, LocationManager, LocationSource};
pub use preferences::PreferenceStore;
pub use provider::{WeatherProvider, WeatherService};
pub use types::*;
