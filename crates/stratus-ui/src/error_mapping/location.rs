use stratus_core::{AppError, LocationError};

/// Classify a device location error.
pub fn location_error(e: stratus_weather::LocationError) -> AppError {
    use stratus_weather::LocationError as Source;

    match e {
        Source::PermissionDenied => AppError::Location(LocationError::PermissionDenied),
        Source::ServiceUnavailable => {
            AppError::Location(LocationError::Unavailable("service unavailable".to_string()))
        }
        Source::Other(s) => AppError::Location(LocationError::Unavailable(s)),
    }
}
