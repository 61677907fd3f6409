use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use tracing::debug;

use skycast_core::{
    AlertConfig, AqiLevel, Config, DailyForecast, DashboardAlert, UnitSystem, alert,
    source_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Personal weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set up the API key, default city, units, and alert thresholds.
    Configure,

    /// Show current conditions.
    Current {
        /// City name; falls back to the configured default.
        city: Option<String>,

        /// Unit system override: "metric" or "imperial".
        #[arg(long)]
        units: Option<String>,
    },

    /// Show the 5-day forecast, one summary per day.
    Forecast {
        /// City name; falls back to the configured default.
        city: Option<String>,

        /// Unit system override: "metric" or "imperial".
        #[arg(long)]
        units: Option<String>,
    },

    /// Show the air quality index and pollutant levels.
    Air {
        /// City name; falls back to the configured default.
        city: Option<String>,
    },

    /// Show the combined dashboard: current conditions, tomorrow,
    /// the upcoming days, the rain chart, and any alerts.
    Dashboard {
        /// City name; falls back to the configured default.
        city: Option<String>,

        /// Unit system override: "metric" or "imperial".
        #[arg(long)]
        units: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city, units } => current(city.as_deref(), units.as_deref()).await,
            Command::Forecast { city, units } => forecast(city.as_deref(), units.as_deref()).await,
            Command::Air { city } => air(city.as_deref()).await,
            Command::Dashboard { city, units } => {
                dashboard(city.as_deref(), units.as_deref()).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Text::new("OpenWeather API key:")
        .with_initial_value(config.api_key.as_deref().unwrap_or(""))
        .prompt()?;

    let default_city = Text::new("Default city:")
        .with_initial_value(config.default_city.as_deref().unwrap_or(""))
        .prompt()?;

    let units = Select::new("Units:", UnitSystem::all().to_vec())
        .with_starting_cursor(
            UnitSystem::all().iter().position(|u| *u == config.units).unwrap_or(0),
        )
        .prompt()?;

    let rain = Confirm::new("Warn when heavy rain is coming up?")
        .with_default(config.alerts.rain)
        .prompt()?;
    let rain_probability_pct = if rain {
        CustomType::<u32>::new("Rain probability threshold (%):")
            .with_default(config.alerts.rain_probability_pct)
            .prompt()?
    } else {
        config.alerts.rain_probability_pct
    };

    let air_quality = Confirm::new("Warn when air quality degrades?")
        .with_default(config.alerts.air_quality)
        .prompt()?;
    let aqi_threshold = if air_quality {
        Select::new("Alert from this level on:", AqiLevel::all().to_vec())
            .with_starting_cursor(
                AqiLevel::all()
                    .iter()
                    .position(|l| *l == config.alerts.aqi_threshold)
                    .unwrap_or(0),
            )
            .prompt()?
    } else {
        config.alerts.aqi_threshold
    };

    config.api_key = none_if_empty(api_key);
    config.default_city = none_if_empty(default_city);
    config.units = units;
    config.alerts = AlertConfig { rain, rain_probability_pct, air_quality, aqi_threshold };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn current(city: Option<&str>, units_flag: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let city = config.city_or_default(city)?;
    let units = resolve_units(&config, units_flag)?;

    let source = source_from_config(&config)?;
    let conditions = source.current(&city, units).await?;

    render::print_current(&conditions, units);
    Ok(())
}

async fn forecast(city: Option<&str>, units_flag: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let city = config.city_or_default(city)?;
    let units = resolve_units(&config, units_flag)?;

    let source = source_from_config(&config)?;
    let samples = source.forecast(&city, units).await?;
    let daily = DailyForecast::aggregate(&samples)
        .with_context(|| format!("Forecast feed for {city} could not be summarized"))?;

    render::print_forecast(&city, &daily, units);
    Ok(())
}

async fn air(city: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let city = config.city_or_default(city)?;

    let source = source_from_config(&config)?;
    // The pollution endpoint wants coordinates, which the current-conditions
    // response carries for the city.
    let conditions = source.current(&city, config.units).await?;
    let air = source.air_quality(conditions.coord).await?;

    render::print_air(&city, &air);
    Ok(())
}

async fn dashboard(city: Option<&str>, units_flag: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let city = config.city_or_default(city)?;
    let units = resolve_units(&config, units_flag)?;

    debug!(%city, units = units.as_str(), "building dashboard");

    let source = source_from_config(&config)?;
    let conditions = source.current(&city, units).await?;
    let samples = source.forecast(&city, units).await?;
    let daily = DailyForecast::aggregate(&samples)
        .with_context(|| format!("Forecast feed for {city} could not be summarized"))?;

    render::print_current(&conditions, units);
    println!();

    if daily.is_empty() {
        println!("No forecast data available.");
    } else {
        render::print_tomorrow(&daily, units);
        render::print_upcoming(&daily, units);
        println!();
        render::print_rain_chart(&daily);
    }

    let mut alerts: Vec<DashboardAlert> = Vec::new();
    if config.alerts.rain {
        alerts.extend(alert::check_rain(&daily, config.alerts.rain_probability_pct));
    }
    if config.alerts.air_quality {
        let air = source.air_quality(conditions.coord).await?;
        alerts.extend(alert::check_air_quality(&air, config.alerts.aqi_threshold));
    }

    if !alerts.is_empty() {
        println!();
        render::print_alerts(&alerts);
    }

    Ok(())
}

fn resolve_units(config: &Config, flag: Option<&str>) -> anyhow::Result<UnitSystem> {
    match flag {
        Some(value) => {
            let units = UnitSystem::try_from(value)?;
            debug!(units = units.as_str(), "unit system overridden on the command line");
            Ok(units)
        }
        None => Ok(config.units),
    }
}

fn none_if_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
