use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use stratus_core::{AppError, Config, TemperatureUnit};
use stratus_ui::error_mapping::{location_error, weather_error};
use stratus_ui::{AppServices, CurrentScreen, ForecastScreen, WeatherViewModel};
use stratus_weather::Coordinate;

/// Current conditions and a 3-day forecast for your location or any city.
#[derive(Parser)]
#[command(name = "stratus", version, about)]
struct Cli {
    /// Temperature unit: auto, celsius or fahrenheit
    #[arg(long, global = true, env = "STRATUS_UNITS")]
    units: Option<TemperatureUnit>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current conditions
    Current {
        /// Look up a city instead of using the saved or device location
        #[arg(long)]
        city: Option<String>,
    },
    /// Show the 3-day forecast
    Forecast {
        #[arg(long)]
        city: Option<String>,
    },
    /// Request location access and print the fix
    Location,
    /// Forget the saved location
    Forget,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Current,
    Forecast,
}

fn main() -> ExitCode {
    if let Err(e) = stratus_core::init() {
        eprintln!("{:#}", e);
    }

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            match e.downcast_ref::<AppError>() {
                Some(app) => eprintln!("{}", app.user_message()),
                None => eprintln!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let (mut config, _) = Config::load_validated()?;
    if let Some(units) = cli.units {
        config.weather.temperature_unit = units;
    }

    let services = AppServices::new(config)?;
    tracing::info!("Stratus started");

    match cli.command.unwrap_or(Command::Current { city: None }) {
        Command::Current { city } => show(&services, Screen::Current, city),
        Command::Forecast { city } => show(&services, Screen::Forecast, city),
        Command::Location => locate_only(&services),
        Command::Forget => {
            let mut vm = services.view_model()?;
            vm.clear_saved_coordinate().map_err(weather_error)?;
            println!("Saved location cleared");
            Ok(())
        }
    }
}

fn show(services: &AppServices, screen: Screen, city: Option<String>) -> Result<()> {
    let mut vm = services.view_model()?;

    services.runtime().block_on(async {
        match city {
            Some(name) => {
                vm.search_city(&name).await;
            }
            None => {
                if !vm.appear() {
                    let coordinate = device_location(services, &mut vm).await?;
                    // The fix already refreshed the forecast
                    if screen == Screen::Current {
                        vm.fetch_current(coordinate);
                    }
                }
            }
        }
        vm.settle().await;
        Ok::<_, anyhow::Error>(())
    })?;

    match screen {
        Screen::Current => print!("{}", CurrentScreen(vm.state())),
        Screen::Forecast => print!("{}", ForecastScreen(vm.state())),
    }
    Ok(())
}

/// Ask for location access and wait for the first fix to reach the view model.
async fn device_location(
    services: &AppServices,
    vm: &mut WeatherViewModel,
) -> Result<Coordinate> {
    let location = services.location();
    vm.watch_location(location.subscribe());

    location
        .request_location_permission()
        .await
        .map_err(location_error)?;

    vm.wait_for_location()
        .await
        .ok_or_else(|| anyhow::anyhow!("Location updates stopped before a fix arrived"))
}

fn locate_only(services: &AppServices) -> Result<()> {
    let location = services.location();
    let result = services
        .runtime()
        .block_on(location.request_location_permission());

    println!("Authorization: {}", location.status_string());
    let fix = result.map_err(location_error)?;
    println!("Coordinate: {}", fix.coordinate);
    if let Some(accuracy) = fix.accuracy_meters {
        println!("Accuracy: {:.0} m", accuracy);
    }
    if let Some(city) = fix.city_name {
        println!("Place: {}", city);
    }
    Ok(())
}
