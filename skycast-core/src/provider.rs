use crate::{
    Config,
    model::{AirQualitySnapshot, Coord, CurrentConditions, UnitSystem, WeatherSample},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// A backend the dashboard fetches its data from.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Current conditions for a city.
    async fn current(&self, city: &str, units: UnitSystem) -> anyhow::Result<CurrentConditions>;

    /// The flat 3-hour forecast feed for a city, in upstream order.
    async fn forecast(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> anyhow::Result<Vec<WeatherSample>>;

    /// Air quality at a coordinate, usually taken from a prior
    /// current-conditions response.
    async fn air_quality(&self, coord: Coord) -> anyhow::Result<AirQualitySnapshot>;
}

/// Construct the weather source from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let api_key = config.require_api_key()?;

    Ok(Box::new(OpenWeatherClient::new(api_key.to_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn source_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = source_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `skycast configure`"));
    }

    #[test]
    fn source_from_config_works_when_key_present() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            ..Config::default()
        };

        assert!(source_from_config(&cfg).is_ok());
    }
}
