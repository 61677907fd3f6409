use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::{
    AirQualitySnapshot, AqiLevel, Coord, CurrentConditions, UnitSystem, WeatherSample,
};

use super::WeatherSource;

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Timestamp format of the `dt_txt` field in the forecast feed.
pub const FEED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENWEATHER_BASE_URL.to_string())
    }

    /// Point the client at a different endpoint, mainly for tests.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    async fn fetch_json(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {what} request failed with status {status}: {}",
                truncate_body(&body),
            ));
        }

        Ok(body)
    }

    fn city_query(&self, city: &str, units: UnitSystem) -> [(&'static str, String); 3] {
        [
            ("q", city.to_string()),
            ("appid", self.api_key.clone()),
            ("units", units.as_str().to_string()),
        ]
    }

    async fn fetch_current(&self, city: &str, units: UnitSystem) -> Result<CurrentConditions> {
        let body = self
            .fetch_json("/weather", &self.city_query(city, units), "current weather")
            .await?;

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        let weather = parsed.weather.first();

        Ok(CurrentConditions {
            city: parsed.name,
            description: weather
                .map(|w| w.description.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            pressure_hpa: parsed.main.pressure,
            observed_at: DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now),
            coord: Coord {
                latitude: parsed.coord.lat,
                longitude: parsed.coord.lon,
            },
        })
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> Result<Vec<WeatherSample>> {
        let body = self
            .fetch_json("/forecast", &self.city_query(city, units), "5-day forecast")
            .await?;

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")?;

        debug!(city, samples = parsed.list.len(), "fetched forecast feed");

        Ok(parsed.list.into_iter().map(OwForecastEntry::into_sample).collect())
    }

    async fn fetch_air_quality(&self, coord: Coord) -> Result<AirQualitySnapshot> {
        let query = [
            ("lat", coord.latitude.to_string()),
            ("lon", coord.longitude.to_string()),
            ("appid", self.api_key.clone()),
        ];

        let body = self.fetch_json("/air_pollution", &query, "air pollution").await?;

        let parsed: OwAirResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather air pollution JSON")?;

        let entry = parsed
            .list
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenWeather air pollution response contained no data"))?;

        Ok(AirQualitySnapshot {
            level: AqiLevel::from_index(entry.main.aqi),
            pm2_5: entry.components.pm2_5,
            pm10: entry.components.pm10,
            no2: entry.components.no2,
            o3: entry.components.o3,
            observed_at: DateTime::from_timestamp(entry.dt, 0).unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, city: &str, units: UnitSystem) -> Result<CurrentConditions> {
        self.fetch_current(city, units).await
    }

    async fn forecast(&self, city: &str, units: UnitSystem) -> Result<Vec<WeatherSample>> {
        self.fetch_forecast(city, units).await
    }

    async fn air_quality(&self, coord: Coord) -> Result<AirQualitySnapshot> {
        self.fetch_air_quality(coord).await
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    coord: OwCoord,
    main: OwCurrentMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// One 3-hour slot of the forecast feed. Deserialized leniently: absent
/// fields become `None` on the sample so that aggregation, which knows the
/// sample's position, is the layer that rejects malformed entries.
#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: Option<String>,
    main: Option<OwForecastMain>,
    #[serde(default)]
    weather: Vec<OwForecastIcon>,
    pop: Option<f64>,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastIcon {
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwVolume {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAirMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAirComponents {
    pm2_5: f64,
    pm10: f64,
    no2: f64,
    o3: f64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    dt: i64,
    main: OwAirMain,
    components: OwAirComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

impl OwForecastEntry {
    fn into_sample(self) -> WeatherSample {
        let timestamp = self
            .dt_txt
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, FEED_TIME_FORMAT).ok());

        WeatherSample {
            timestamp,
            temperature: self.main.and_then(|m| m.temp),
            precipitation_probability: self.pop,
            rain_volume_3h: self.rain.and_then(|r| r.three_hour),
            snow_volume_3h: self.snow.and_then(|s| s.three_hour),
            weather_icon: self.weather.first().map(|w| w.icon.clone()).unwrap_or_default(),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    // MAX can land inside a multi-byte character; back up to a boundary.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forecast_body() -> serde_json::Value {
        serde_json::json!({
            "cod": "200",
            "list": [
                {
                    "dt": 1717243200,
                    "dt_txt": "2024-06-01 12:00:00",
                    "main": {"temp": 21.4, "feels_like": 21.0, "humidity": 60},
                    "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                    "pop": 0.35,
                    "rain": {"3h": 0.8}
                },
                {
                    "dt": 1717254000,
                    "dt_txt": "2024-06-01 15:00:00",
                    "main": {"temp": 23.6},
                    "weather": [{"icon": "01d", "description": "clear sky"}],
                    "pop": 0.0
                }
            ],
            "city": {"name": "Kyiv", "country": "UA"}
        })
    }

    #[test]
    fn forecast_entries_map_onto_samples() {
        let parsed: OwForecastResponse =
            serde_json::from_value(forecast_body()).expect("fixture parses");

        let samples: Vec<_> =
            parsed.list.into_iter().map(OwForecastEntry::into_sample).collect();

        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 6, 1).and_then(|d| d.and_hms_opt(12, 0, 0))
        );
        assert_eq!(samples[0].temperature, Some(21.4));
        assert_eq!(samples[0].precipitation_probability, Some(0.35));
        assert_eq!(samples[0].rain_volume_3h, Some(0.8));
        assert_eq!(samples[0].weather_icon, "10d");
        assert_eq!(samples[1].snow_volume_3h, None);
    }

    #[test]
    fn absent_fields_become_none_instead_of_parse_errors() {
        let parsed: OwForecastResponse = serde_json::from_value(serde_json::json!({
            "list": [{"dt": 1717243200}]
        }))
        .expect("bare entry still parses");

        let sample = parsed.list.into_iter().next().unwrap().into_sample();
        assert_eq!(sample.timestamp, None);
        assert_eq!(sample.temperature, None);
        assert_eq!(sample.precipitation_probability, None);
        assert_eq!(sample.weather_icon, "");
    }

    #[test]
    fn unparseable_timestamp_becomes_none() {
        let entry = OwForecastEntry {
            dt_txt: Some("yesterday at noon".to_string()),
            main: None,
            weather: vec![],
            pop: None,
            rain: None,
            snow: None,
        };

        assert_eq!(entry.into_sample().timestamp, None);
    }

    #[test]
    fn truncation_cuts_long_bodies_on_a_char_boundary() {
        // Byte 200 falls inside the two-byte 'é'.
        let body = format!("{}é{}", "a".repeat(199), "b".repeat(50));

        assert_eq!(truncate_body(&body), format!("{}...", "a".repeat(199)));
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn forecast_hits_the_forecast_endpoint_with_city_and_units() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "Kyiv"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url("KEY".to_string(), server.uri());
        let samples = client.forecast("Kyiv", UnitSystem::Metric).await.unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].temperature, Some(23.6));
    }

    #[tokio::test]
    async fn current_maps_the_weather_endpoint_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Lviv"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Lviv",
                "dt": 1717243200,
                "coord": {"lat": 49.84, "lon": 24.03},
                "main": {"temp": 71.1, "feels_like": 69.8, "humidity": 55, "pressure": 1014},
                "weather": [{"description": "scattered clouds", "icon": "03d"}],
                "wind": {"speed": 4.6}
            })))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url("KEY".to_string(), server.uri());
        let current = client.current("Lviv", UnitSystem::Imperial).await.unwrap();

        assert_eq!(current.city, "Lviv");
        assert_eq!(current.temperature, 71.1);
        assert_eq!(current.humidity_pct, 55);
        assert_eq!(current.pressure_hpa, 1014);
        assert_eq!(current.icon, "03d");
        assert_eq!(current.coord.latitude, 49.84);
    }

    #[tokio::test]
    async fn air_quality_maps_the_pollution_index_onto_a_level() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "coord": {"lat": 50.45, "lon": 30.52},
                "list": [{
                    "dt": 1717243200,
                    "main": {"aqi": 4},
                    "components": {
                        "co": 201.9, "no": 0.0, "no2": 12.1, "o3": 68.7,
                        "so2": 0.6, "pm2_5": 41.3, "pm10": 52.8, "nh3": 0.1
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url("KEY".to_string(), server.uri());
        let coord = Coord { latitude: 50.45, longitude: 30.52 };
        let air = client.air_quality(coord).await.unwrap();

        assert_eq!(air.level, AqiLevel::Poor);
        assert_eq!(air.pm2_5, 41.3);
        assert_eq!(air.pm10, 52.8);
    }

    #[tokio::test]
    async fn failed_requests_surface_the_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
            )
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url("BAD".to_string(), server.uri());
        let err = client.forecast("Kyiv", UnitSystem::Metric).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("Invalid API key"), "got: {msg}");
    }

    #[tokio::test]
    async fn failed_requests_truncate_oversized_multibyte_bodies() {
        let server = MockServer::start().await;
        let body = format!("{}é{}", "a".repeat(199), "b".repeat(50));

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string(body))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url("KEY".to_string(), server.uri());
        let err = client.forecast("Kyiv", UnitSystem::Metric).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.ends_with("..."), "got: {msg}");
        assert!(!msg.contains('é'), "got: {msg}");
    }
}
