//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration, including alert thresholds
//! - The OpenWeather-backed data source
//! - Aggregation of the raw forecast feed into per-day dashboard summaries
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod alert;
pub mod config;
pub mod forecast;
pub mod model;
pub mod provider;

pub use alert::{AlertKind, DashboardAlert};
pub use config::{AlertConfig, Config};
pub use forecast::{DailyForecast, DailySummary, MalformedSampleError, SampleField};
pub use model::{
    AirQualitySnapshot, AqiLevel, Coord, CurrentConditions, UnitSystem, WeatherSample,
};
pub use provider::{WeatherSource, source_from_config};
