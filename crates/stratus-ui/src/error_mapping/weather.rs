use stratus_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError};

/// Classify an error from the weather crate.
pub fn weather_error(e: stratus_weather::WeatherError) -> AppError {
    use stratus_weather::WeatherError as Source;

    match e {
        Source::Network(err) => AppError::Network(err.into_network_error()),
        Source::Status { status, message } => {
            AppError::Network(NetworkError::ServerError { status, message })
        }
        Source::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
        Source::Location(err) => super::location_error(err),
        Source::Preferences(s) => AppError::Weather(WeatherError::PreferencesError(s)),
    }
}
