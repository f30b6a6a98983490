pub mod app_services;
pub mod error_mapping;
pub mod screens;
pub mod services;
pub mod view_model;

pub use app_services::AppServices;
pub use screens::{CurrentScreen, ForecastScreen};
pub use view_model::{ViewState, WeatherViewModel};
