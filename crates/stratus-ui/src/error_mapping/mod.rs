//! Maps service errors to stratus_core::AppError for consistent user-facing messages.

mod location;
mod weather;

pub use location::location_error;
pub use weather::weather_error;
