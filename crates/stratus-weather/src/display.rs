//! Display-ready weather values.
//!
//! The screens only ever see strings; all number formatting happens here.

use serde::{Deserialize, Serialize};

use crate::types::{CurrentWeather, DailyWeather, UnitSystem};

/// Most days the forecast screen holds
pub const FORECAST_LIMIT: usize = 3;

/// Current conditions formatted for the current weather screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: String,
    pub feels_like: String,
    pub condition: String,
    pub wind_speed: String,
    pub humidity: String,
    pub icon: String,
}

impl CurrentConditions {
    pub fn from_weather(weather: &CurrentWeather) -> Self {
        Self {
            temperature: format_temperature(weather.temperature, weather.units),
            feels_like: format_temperature(weather.feels_like, weather.units),
            condition: weather.condition.description().to_string(),
            wind_speed: format_speed(weather.wind_speed, weather.units),
            humidity: format!("{}%", weather.humidity),
            icon: weather.condition.icon_name().to_string(),
        }
    }

    /// True once a fetch has filled the fields
    pub fn is_populated(&self) -> bool {
        !self.condition.is_empty()
    }
}

/// One row of the forecast screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: String,
    pub icon: String,
    pub low: String,
    pub high: String,
    pub wind: String,
    pub condition: String,
}

impl DayForecast {
    pub fn from_daily(daily: &DailyWeather) -> Self {
        Self {
            day: daily.date.format("%A").to_string(),
            icon: daily.condition.icon_name().to_string(),
            low: format_temperature(daily.low, daily.units),
            high: format_temperature(daily.high, daily.units),
            wind: format_speed(daily.wind_speed, daily.units),
            condition: daily.condition.description().to_string(),
        }
    }
}

/// Format the first [`FORECAST_LIMIT`] days, however many the backend sent.
pub fn forecast_from_daily(days: &[DailyWeather]) -> Vec<DayForecast> {
    days.iter()
        .take(FORECAST_LIMIT)
        .map(DayForecast::from_daily)
        .collect()
}

pub fn format_temperature(value: f64, units: UnitSystem) -> String {
    format!("{}{}", round_display(value), units.temperature_symbol())
}

pub fn format_speed(value: f64, units: UnitSystem) -> String {
    format!("{} {}", round_display(value), units.speed_symbol())
}

/// Whole-number rendering that never prints "-0".
fn round_display(value: f64) -> i64 {
    let rounded = value.round();
    if rounded == 0.0 {
        0
    } else {
        rounded as i64
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::types::WeatherCondition;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn daily(day: u32, high: f64) -> DailyWeather {
        DailyWeather {
            // 2024-06-03 was a Monday
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap_or_default(),
            high,
            low: high - 8.0,
            wind_speed: 12.4,
            condition: WeatherCondition::Rain,
            units: UnitSystem::Metric,
        }
    }

    #[test]
    fn test_current_conditions_fills_all_fields() {
        let weather = CurrentWeather {
            temperature: 21.6,
            feels_like: 20.2,
            humidity: 64,
            wind_speed: 14.5,
            condition: WeatherCondition::PartlyCloudy,
            units: UnitSystem::Metric,
            updated_at: Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap(),
        };

        let display = CurrentConditions::from_weather(&weather);

        assert_eq!(display.temperature, "22°C");
        assert_eq!(display.feels_like, "20°C");
        assert_eq!(display.condition, "Partly Cloudy");
        assert_eq!(display.wind_speed, "15 km/h");
        assert_eq!(display.humidity, "64%");
        assert_eq!(display.icon, "cloud.sun");
        assert!(display.is_populated());
    }

    #[test]
    fn test_default_conditions_are_not_populated() {
        assert!(!CurrentConditions::default().is_populated());
    }

    #[test]
    fn test_day_forecast_uses_weekday_name() {
        let row = DayForecast::from_daily(&daily(3, 18.0));
        assert_eq!(row.day, "Monday");
        assert_eq!(row.low, "10°C");
        assert_eq!(row.high, "18°C");
        assert_eq!(row.wind, "12 km/h");
        assert_eq!(row.condition, "Rain");
        assert_eq!(row.icon, "cloud.rain");
    }

    #[test]
    fn test_forecast_truncated_to_three_days() {
        let week: Vec<_> = (3..10).map(|d| daily(d, 20.0)).collect();
        let rows = forecast_from_daily(&week);
        assert_eq!(rows.len(), FORECAST_LIMIT);
        assert_eq!(rows[0].day, "Monday");
        assert_eq!(rows[2].day, "Wednesday");
    }

    #[test]
    fn test_short_forecast_kept_whole() {
        let rows = forecast_from_daily(&[daily(3, 20.0)]);
        assert_eq!(rows.len(), 1);
        assert!(forecast_from_daily(&[]).is_empty());
    }

    #[test]
    fn test_negative_zero_is_rendered_as_zero() {
        assert_eq!(format_temperature(-0.3, UnitSystem::Metric), "0°C");
        assert_eq!(format_temperature(-4.6, UnitSystem::Imperial), "-5°F");
        assert_eq!(format_speed(9.0, UnitSystem::Imperial), "9 mph");
    }
}
