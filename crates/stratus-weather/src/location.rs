//! Device location.
//!
//! `LocationManager` asks a [`LocationSource`] for permission, takes one fix,
//! and publishes it on a watch channel. Updates stop after the first fix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::instrument;

use crate::types::{Coordinate, LocationError};

/// Accuracy requested from every source ("nearest ten meters")
pub const DESIRED_ACCURACY_METERS: f64 = 10.0;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Rough accuracy of an IP lookup, which resolves to a city at best
const IP_ACCURACY_METERS: f64 = 5_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDetermined => "notDetermined",
            Self::Restricted => "restricted",
            Self::Denied => "denied",
            Self::AuthorizedWhenInUse => "authorizedWhenInUse",
            Self::AuthorizedAlways => "authorizedAlways",
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

/// A single reported position
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub accuracy_meters: Option<f64>,
    pub city_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            accuracy_meters: None,
            city_name: None,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn request_authorization(&self) -> AuthorizationStatus;

    async fn locate(&self, desired_accuracy_meters: f64) -> Result<Fix, LocationError>;
}

pub struct LocationManager {
    source: Arc<dyn LocationSource>,
    status: Mutex<Option<AuthorizationStatus>>,
    updating: AtomicBool,
    last_location: watch::Sender<Option<Fix>>,
}

impl LocationManager {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        let (last_location, _) = watch::channel(None);
        Self {
            source,
            status: Mutex::new(None),
            updating: AtomicBool::new(false),
            last_location,
        }
    }

    /// Ask for permission, then start updates and wait for the first fix.
    #[instrument(skip(self), level = "info")]
    pub async fn request_location_permission(&self) -> Result<Fix, LocationError> {
        let status = self.source.request_authorization().await;
        *self.status.lock() = Some(status);
        tracing::info!("Location authorization: {}", status.as_str());

        if !status.is_authorized() {
            return Err(LocationError::PermissionDenied);
        }

        self.start_updating().await
    }

    async fn start_updating(&self) -> Result<Fix, LocationError> {
        self.updating.store(true, Ordering::SeqCst);
        let result = self.source.locate(DESIRED_ACCURACY_METERS).await;
        self.updating.store(false, Ordering::SeqCst);

        let fix = result?;
        tracing::info!(
            "Location fix: {} (accuracy {:?} m)",
            fix.coordinate,
            fix.accuracy_meters
        );
        self.last_location.send_replace(Some(fix.clone()));
        Ok(fix)
    }

    pub fn status(&self) -> Option<AuthorizationStatus> {
        *self.status.lock()
    }

    /// Readable authorization status, "unknown" until one is recorded
    pub fn status_string(&self) -> &'static str {
        self.status().map(|s| s.as_str()).unwrap_or("unknown")
    }

    pub fn last_location(&self) -> Option<Fix> {
        self.last_location.borrow().clone()
    }

    /// Observe the last location; the current value is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Option<Fix>> {
        self.last_location.subscribe()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }
}

/// Approximate location from the public IP address (ip-api.com format)
#[derive(Debug, Clone)]
pub struct IpLocationSource {
    client: Client,
    lookup_url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

impl IpLocationSource {
    pub fn new(lookup_url: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            lookup_url: lookup_url.to_string(),
        })
    }
}

#[async_trait]
impl LocationSource for IpLocationSource {
    async fn request_authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::AuthorizedWhenInUse
    }

    async fn locate(&self, _desired_accuracy_meters: f64) -> Result<Fix, LocationError> {
        let response = self
            .client
            .get(&self.lookup_url)
            .query(&[("fields", "status,message,lat,lon,city")])
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("IP lookup request failed: {}", e);
                LocationError::ServiceUnavailable
            })?;

        if !response.status().is_success() {
            return Err(LocationError::Other(format!(
                "IP lookup returned {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("IP lookup parse error: {}", e)))?;

        if body.status != "success" {
            return Err(LocationError::Other(
                body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
            ));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(LocationError::Other("IP lookup returned no position".to_string()));
        };

        Ok(Fix {
            coordinate: Coordinate::new(lat, lon),
            accuracy_meters: Some(IP_ACCURACY_METERS),
            city_name: body.city,
            timestamp: Utc::now(),
        })
    }
}

/// Always reports the configured coordinate
#[derive(Debug, Clone)]
pub struct FixedLocationSource {
    coordinate: Coordinate,
}

impl FixedLocationSource {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn request_authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::AuthorizedAlways
    }

    async fn locate(&self, desired_accuracy_meters: f64) -> Result<Fix, LocationError> {
        Ok(Fix {
            accuracy_meters: Some(desired_accuracy_meters),
            ..Fix::new(self.coordinate)
        })
    }
}

/// Location turned off in settings
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLocationSource;

#[async_trait]
impl LocationSource for DisabledLocationSource {
    async fn request_authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::Denied
    }

    async fn locate(&self, _desired_accuracy_meters: f64) -> Result<Fix, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Counts locate calls so tests can check updates stop after one fix
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationSource for CountingSource {
        async fn request_authorization(&self) -> AuthorizationStatus {
            AuthorizationStatus::AuthorizedWhenInUse
        }

        async fn locate(&self, desired: f64) -> Result<Fix, LocationError> {
            assert_eq!(desired, DESIRED_ACCURACY_METERS);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Fix::new(Coordinate::new(50.0 + n as f64, 8.0)))
        }
    }

    #[test]
    fn test_status_string_before_request_is_unknown() {
        let manager = LocationManager::new(Arc::new(DisabledLocationSource));
        assert_eq!(manager.status_string(), "unknown");
        assert!(manager.last_location().is_none());
    }

    #[tokio::test]
    async fn test_denied_permission() {
        let manager = LocationManager::new(Arc::new(DisabledLocationSource));
        let result = manager.request_location_permission().await;
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
        assert_eq!(manager.status_string(), "denied");
        assert!(manager.last_location().is_none());
    }

    #[tokio::test]
    async fn test_first_fix_is_published_and_updates_stop() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let manager = LocationManager::new(source.clone());
        let mut rx = manager.subscribe();

        let fix = manager.request_location_permission().await.unwrap();

        assert_eq!(fix.coordinate, Coordinate::new(50.0, 8.0));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!manager.is_updating());
        assert_eq!(manager.status_string(), "authorizedWhenInUse");

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|f| f.coordinate), Some(fix.coordinate));
        assert_eq!(manager.last_location(), Some(fix));
    }

    #[tokio::test]
    async fn test_fixed_source() {
        let manager =
            LocationManager::new(Arc::new(FixedLocationSource::new(Coordinate::new(1.0, 2.0))));
        let fix = manager.request_location_permission().await.unwrap();
        assert_eq!(fix.coordinate, Coordinate::new(1.0, 2.0));
        assert_eq!(manager.status(), Some(AuthorizationStatus::AuthorizedAlways));
    }

    #[tokio::test]
    async fn test_ip_source_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 52.52,
                "lon": 13.405,
                "city": "Berlin"
            })))
            .mount(&server)
            .await;

        let source = IpLocationSource::new(&format!("{}/json/", server.uri())).unwrap();
        let fix = source.locate(DESIRED_ACCURACY_METERS).await.unwrap();

        assert_eq!(fix.coordinate, Coordinate::new(52.52, 13.405));
        assert_eq!(fix.city_name.as_deref(), Some("Berlin"));
    }

    #[tokio::test]
    async fn test_ip_source_failure_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let source = IpLocationSource::new(&format!("{}/json/", server.uri())).unwrap();
        let err = source.locate(DESIRED_ACCURACY_METERS).await.unwrap_err();
        assert!(err.to_string().contains("private range"));
    }
}
