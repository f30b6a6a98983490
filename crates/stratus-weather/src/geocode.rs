//! Geocoding: city names to coordinates and back.
//!
//! Forward lookups use the Open-Meteo geocoding API, reverse lookups use
//! Nominatim (OpenStreetMap). Neither requires an API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Coordinate, LocationError, WeatherError};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("Stratus/", env!("CARGO_PKG_VERSION"));
const SEARCH_RESULT_COUNT: u8 = 5;

/// A named place returned by a forward lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub region: Option<String>,
    pub country: Option<String>,
    pub coordinate: Coordinate,
}

impl Place {
    /// "Name, Region" when the region adds something
    pub fn display_name(&self) -> String {
        match self
            .region
            .as_deref()
            .or(self.country.as_deref())
            .filter(|s| !s.is_empty() && *s != self.name)
        {
            Some(suffix) => format!("{}, {}", self.name, suffix),
            None => self.name.clone(),
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Places matching `query`, best match first. Empty when nothing matched.
    async fn forward(&self, query: &str) -> Result<Vec<Place>, WeatherError>;

    /// Display name for a coordinate; `None` when the place has no usable name.
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchError {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    fn place_name(self) -> Option<String> {
        let state = self.state.clone();
        let country = self.country.clone();

        // city > town > village > municipality, then the wider areas
        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .or(self.state)
            .or(self.country)?;

        let suffix = state
            .filter(|s| !s.is_empty() && *s != place)
            .or_else(|| country.filter(|c| !c.is_empty() && *c != place));

        Some(match suffix {
            Some(s) => format!("{}, {}", place, s),
            None => place,
        })
    }
}

/// HTTP geocoder backed by Open-Meteo (forward) and Nominatim (reverse)
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    search_url: String,
    reverse_url: String,
}

impl GeocodingClient {
    pub fn new(search_url: &str, reverse_url: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            search_url: search_url.trim_end_matches('/').to_string(),
            reverse_url: reverse_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    #[instrument(skip(self), level = "info")]
    async fn forward(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
        let count = SEARCH_RESULT_COUNT.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("name", query),
                ("count", count.as_str()),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<SearchError>()
                .await
                .ok()
                .and_then(|e| e.reason)
                .unwrap_or_else(|| status.to_string());
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message: reason,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("geocoding response: {}", e)))?;

        tracing::debug!("Geocoding '{}' matched {} places", query, body.results.len());

        Ok(body
            .results
            .into_iter()
            .map(|r| Place {
                name: r.name,
                region: r.admin1,
                country: r.country,
                coordinate: Coordinate::new(r.latitude, r.longitude),
            })
            .collect())
    }

    #[instrument(skip(self), level = "info")]
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, WeatherError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        let response = self
            .client
            .get(&self.reverse_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("layer", "address"),
                ("zoom", "10"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message: "reverse geocoding failed".to_string(),
            });
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("reverse geocoding response: {}", e)))?;

        let Some(address) = body.address else {
            let reason = body.error.unwrap_or_else(|| "no address".to_string());
            return Err(LocationError::Other(reason).into());
        };

        let name = address.place_name();
        if let Some(n) = &name {
            tracing::info!("Reverse geocoded to: {}", n);
        }
        Ok(name)
    }
}
