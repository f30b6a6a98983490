pub mod weather_service;

pub use weather_service::{ServiceSender, WeatherError, WeatherServiceMessage};
