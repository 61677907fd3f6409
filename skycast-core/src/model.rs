use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit system the upstream feed is queried with. Controls temperature and
/// wind-speed units end to end; the dashboard never converts values itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "metric" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported values: metric, imperial."
            )),
        }
    }
}

/// One timestamped observation from the 5-day/3-hour forecast feed.
///
/// `timestamp` and `temperature` stay optional because feed entries are
/// decoded leniently: an incomplete entry is carried through to aggregation,
/// which rejects it with its position instead of silently skipping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: Option<NaiveDateTime>,
    pub temperature: Option<f64>,
    /// Forecast probability of precipitation in [0, 1], when the feed sent one.
    pub precipitation_probability: Option<f64>,
    pub rain_volume_3h: Option<f64>,
    pub snow_volume_3h: Option<f64>,
    /// Opaque provider icon code ("01d", "10n", ...); empty when absent.
    pub weather_icon: String,
}

impl WeatherSample {
    /// Calendar date this sample belongs to, used as the daily grouping key.
    pub fn date_key(&self) -> Option<NaiveDate> {
        self.timestamp.map(|t| t.date())
    }

    /// Best available precipitation figure for this sample: the forecast
    /// probability when present and non-zero, otherwise the 3-hour rain
    /// volume, otherwise the 3-hour snow volume, otherwise zero.
    ///
    /// The volume fallbacks are raw millimetre amounts, not probabilities;
    /// a daily maximum built on top of them is a worst-case rain signal
    /// rather than a calibrated percentage whenever the feed omits the
    /// probability field.
    pub fn precipitation_estimate(&self) -> f64 {
        fn non_zero(value: Option<f64>) -> Option<f64> {
            value.filter(|v| *v != 0.0)
        }

        non_zero(self.precipitation_probability)
            .or_else(|| non_zero(self.rain_volume_3h))
            .or_else(|| non_zero(self.snow_volume_3h))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions for a city, in the requested unit system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub description: String,
    pub icon: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub pressure_hpa: u32,
    pub observed_at: DateTime<Utc>,
    pub coord: Coord,
}

/// Provider air-quality index, cleanest-first. The upstream reports it as an
/// integer 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiLevel {
    /// Map the provider's index onto a level; out-of-range values saturate
    /// at the nearest end.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 | 1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            _ => AqiLevel::VeryPoor,
        }
    }

    pub const fn all() -> &'static [AqiLevel] {
        &[
            AqiLevel::Good,
            AqiLevel::Fair,
            AqiLevel::Moderate,
            AqiLevel::Poor,
            AqiLevel::VeryPoor,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very poor",
        }
    }
}

impl std::fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Air-quality snapshot for a location: the coarse index plus the pollutant
/// concentrations (µg/m³) the dashboard lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualitySnapshot {
    pub level: AqiLevel,
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> WeatherSample {
        WeatherSample {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0)),
            temperature: Some(21.0),
            precipitation_probability: None,
            rain_volume_3h: None,
            snow_volume_3h: None,
            weather_icon: "01d".to_string(),
        }
    }

    #[test]
    fn date_key_is_the_date_portion_of_the_timestamp() {
        let s = sample();
        assert_eq!(s.date_key(), NaiveDate::from_ymd_opt(2024, 6, 1));

        let no_time = WeatherSample { timestamp: None, ..sample() };
        assert_eq!(no_time.date_key(), None);
    }

    #[test]
    fn precipitation_prefers_explicit_probability() {
        let s = WeatherSample {
            precipitation_probability: Some(0.4),
            rain_volume_3h: Some(2.0),
            snow_volume_3h: Some(1.0),
            ..sample()
        };
        assert_eq!(s.precipitation_estimate(), 0.4);
    }

    #[test]
    fn zero_probability_falls_through_to_volumes() {
        let rain = WeatherSample {
            precipitation_probability: Some(0.0),
            rain_volume_3h: Some(2.5),
            ..sample()
        };
        assert_eq!(rain.precipitation_estimate(), 2.5);

        let snow = WeatherSample {
            precipitation_probability: Some(0.0),
            rain_volume_3h: Some(0.0),
            snow_volume_3h: Some(1.2),
            ..sample()
        };
        assert_eq!(snow.precipitation_estimate(), 1.2);
    }

    #[test]
    fn all_fields_absent_means_dry() {
        assert_eq!(sample().precipitation_estimate(), 0.0);
    }

    #[test]
    fn unit_system_as_str_roundtrip() {
        for units in UnitSystem::all() {
            let parsed = UnitSystem::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unit_system_accepts_temperature_scale_aliases() {
        assert_eq!(UnitSystem::try_from("Celsius").unwrap(), UnitSystem::Metric);
        assert_eq!(UnitSystem::try_from("fahrenheit").unwrap(), UnitSystem::Imperial);
    }

    #[test]
    fn unknown_unit_system_error() {
        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn aqi_levels_saturate_and_order() {
        assert_eq!(AqiLevel::from_index(0), AqiLevel::Good);
        assert_eq!(AqiLevel::from_index(3), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_index(9), AqiLevel::VeryPoor);
        assert!(AqiLevel::Good < AqiLevel::Poor);
    }
}
