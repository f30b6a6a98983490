use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Units readings are requested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// °C and km/h
    #[default]
    Metric,
    /// °F and mph
    Imperial,
}

impl UnitSystem {
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    pub fn speed_symbol(&self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }

    /// Open-Meteo `temperature_unit` query value
    pub(crate) fn temperature_param(&self) -> &'static str {
        match self {
            Self::Metric => "celsius",
            Self::Imperial => "fahrenheit",
        }
    }

    /// Open-Meteo `wind_speed_unit` query value
    pub(crate) fn wind_speed_param(&self) -> &'static str {
        match self {
            Self::Metric => "kmh",
            Self::Imperial => "mph",
        }
    }
}

/// Condition category for a WMO weather interpretation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Codes outside the WMO 4677 subset Open-Meteo reports read as clear.
    pub fn from_wmo_code(code: i32) -> Self {
        use WeatherCondition::*;
        match code {
            1 | 2 => PartlyCloudy,
            3 => Cloudy,
            45 | 48 => Fog,
            51 | 53 | 55 => Drizzle,
            // freezing drizzle and freezing rain
            56 | 57 | 66 | 67 => Sleet,
            61 | 63 | 80 => Rain,
            65 | 81 | 82 => HeavyRain,
            71 | 73 | 75 | 77 | 85 | 86 => Snow,
            95 | 96 | 99 => Thunderstorm,
            _ => Clear,
        }
    }

    /// Label and symbol name, in that order.
    fn label(self) -> (&'static str, &'static str) {
        use WeatherCondition::*;
        match self {
            Clear => ("Clear", "sun.max"),
            PartlyCloudy => ("Partly Cloudy", "cloud.sun"),
            Cloudy => ("Cloudy", "cloud"),
            Fog => ("Fog", "cloud.fog"),
            Drizzle => ("Drizzle", "cloud.drizzle"),
            Rain => ("Rain", "cloud.rain"),
            HeavyRain => ("Heavy Rain", "cloud.heavyrain"),
            Snow => ("Snow", "cloud.snow"),
            Sleet => ("Sleet", "cloud.sleet"),
            Thunderstorm => ("Thunderstorm", "cloud.bolt.rain"),
        }
    }

    pub fn description(&self) -> &'static str {
        self.label().0
    }

    /// Symbol identifier shown next to the condition
    pub fn icon_name(&self) -> &'static str {
        self.label().1
    }
}

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// An unset preference reads back as 0/0, so that pair counts as absent.
    pub fn is_present(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Current weather reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
    pub units: UnitSystem,
    pub updated_at: DateTime<Utc>,
}

/// Daily forecast reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
    pub units: UnitSystem,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather, geocoding and preference errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Preferences error: {0}")]
    Preferences(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_cover_codes() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
    }

    #[test]
    fn precipitation_codes() {
        assert_eq!(WeatherCondition::from_wmo_code(53), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(67), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(75), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(96), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn unknown_code_reads_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn labels_and_symbols() {
        assert_eq!(WeatherCondition::Clear.icon_name(), "sun.max");
        assert_eq!(WeatherCondition::HeavyRain.description(), "Heavy Rain");
        assert_eq!(WeatherCondition::Thunderstorm.icon_name(), "cloud.bolt.rain");
    }

    #[test]
    fn zero_zero_is_absent() {
        assert!(!Coordinate::new(0.0, 0.0).is_present());
        assert!(Coordinate::new(0.0, 18.07).is_present());
        assert!(Coordinate::new(-33.87, 151.21).is_present());
    }

    #[test]
    fn unit_symbols_and_params() {
        assert_eq!(UnitSystem::Metric.temperature_symbol(), "°C");
        assert_eq!(UnitSystem::Imperial.speed_symbol(), "mph");
        assert_eq!(UnitSystem::Imperial.temperature_param(), "fahrenheit");
    }
}
