//! Terminal rendering of the two screens.

use std::fmt;

use crate::view_model::ViewState;

/// Current weather screen
pub struct CurrentScreen<'a>(pub &'a ViewState);

/// 3-day forecast screen
pub struct ForecastScreen<'a>(pub &'a ViewState);

fn place_line(state: &ViewState) -> Option<String> {
    if !state.city_name.is_empty() {
        Some(state.city_name.clone())
    } else {
        state
            .current_coordinate
            .or(state.forecast_coordinate)
            .map(|c| c.to_string())
    }
}

fn write_error(f: &mut fmt::Formatter<'_>, state: &ViewState) -> fmt::Result {
    if let Some(error) = &state.error_message {
        writeln!(f)?;
        writeln!(f, "{}", error)?;
    }
    Ok(())
}

impl fmt::Display for CurrentScreen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "Current Weather")?;
        if let Some(place) = place_line(state) {
            writeln!(f, "{}", place)?;
        }
        writeln!(f)?;

        let current = &state.current;
        if current.is_populated() {
            writeln!(f, "Weather Condition: {} [{}]", current.condition, current.icon)?;
            writeln!(f, "Temperature: {}", current.temperature)?;
            writeln!(f, "Feels Like: {}", current.feels_like)?;
            writeln!(f, "Wind: {}", current.wind_speed)?;
            writeln!(f, "Humidity: {}", current.humidity)?;
        }

        write_error(f, state)
    }
}

impl fmt::Display for ForecastScreen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "3-Day Forecast")?;
        if let Some(place) = place_line(state) {
            writeln!(f, "{}", place)?;
        }

        for day in &state.forecast {
            writeln!(f)?;
            writeln!(f, "{} [{}]", day.day, day.icon)?;
            writeln!(f, "  Low: {}", day.low)?;
            writeln!(f, "  High: {}", day.high)?;
            writeln!(f, "  Wind: {}", day.wind)?;
            writeln!(f, "  Condition: {}", day.condition)?;
        }

        write_error(f, state)
    }
}
