use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{config::WeatherConfig, error::UpstreamError, http::fetch_body, model::WeatherResult};

use super::WeatherProvider;

const SERVICE: &str = "openweather";
/// `WeatherResult::temperature_c` relies on this.
const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    icon_base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, api_key: String, config: &WeatherConfig) -> Self {
        Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            icon_base_url: config.icon_base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn icon_url(&self, icon: &str) -> String {
        format!("{}/{icon}@2x.png", self.icon_base_url)
    }

    async fn fetch_current(
        &self,
        query: &[(&str, String)],
    ) -> Result<WeatherResult, UpstreamError> {
        let url = format!("{}/weather", self.base_url);

        let request = self.http.get(url).query(query).query(&[
            ("units", UNITS),
            ("appid", self.api_key.as_str()),
        ]);

        let body = fetch_body(SERVICE, request).await?;
        let raw: Value =
            serde_json::from_str(&body).map_err(|e| UpstreamError::decode(SERVICE, e))?;

        // The API mirrors its status in `cod`, as a number or a string.
        match raw.get("cod").and_then(status_from_cod) {
            Some(cod) if !(200..300).contains(&cod) => {
                return Err(UpstreamError::status(SERVICE, cod, &body));
            }
            _ => {}
        }

        let parsed = OwCurrentResponse::deserialize(&raw)
            .map_err(|e| UpstreamError::decode(SERVICE, e))?;

        let weather = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::malformed(SERVICE, "response has no weather entries"))?;

        Ok(WeatherResult {
            city_display_name: parsed.name,
            icon_url: self.icon_url(&weather.icon),
            condition_code: weather.icon,
            description: weather.description,
            temperature_c: parsed.main.map(|m| m.temp),
            observed_at: parsed.dt.and_then(unix_to_utc),
            raw,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: Option<i64>,
    main: Option<OwMain>,
    weather: Vec<OwWeather>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_by_city(&self, name: &str) -> Result<WeatherResult, UpstreamError> {
        debug!(city = name, "fetching current weather by city");
        self.fetch_current(&[("q", name.to_string())]).await
    }

    async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherResult, UpstreamError> {
        debug!(lat, lon, "fetching current weather by coordinates");
        let mut result = self
            .fetch_current(&[("lat", lat.to_string()), ("lon", lon.to_string())])
            .await?;

        // Open water and remote areas come back unnamed.
        if result.city_display_name.trim().is_empty() {
            result.city_display_name = format!("{lat:.4}, {lon:.4}");
        }

        Ok(result)
    }
}

fn status_from_cod(cod: &Value) -> Option<u16> {
    match cod {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        let config = WeatherConfig {
            base_url: server.uri(),
            icon_base_url: "https://icons.test/img/wn/".into(),
            ..WeatherConfig::default()
        };
        OpenWeatherProvider::new(Client::new(), "KEY".into(), &config)
    }

    fn paris() -> Value {
        serde_json::json!({
            "name": "Paris",
            "dt": 1_700_000_000,
            "main": { "temp": 12.5 },
            "weather": [{ "icon": "01d", "description": "clear sky" }],
            "cod": 200
        })
    }

    #[tokio::test]
    async fn fetch_by_city_normalizes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Paris"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris()))
            .mount(&server)
            .await;

        let result = provider(&server).fetch_by_city("Paris").await.unwrap();

        assert_eq!(result.city_display_name, "Paris");
        assert_eq!(result.condition_code, "01d");
        assert_eq!(result.icon_url, "https://icons.test/img/wn/01d@2x.png");
        assert_eq!(result.description.as_deref(), Some("clear sky"));
        assert_eq!(result.temperature_c, Some(12.5));
        assert_eq!(result.observed_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(result.raw, paris());
    }

    #[tokio::test]
    async fn units_setting_in_config_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris()))
            .expect(1)
            .mount(&server)
            .await;

        let text = format!("base_url = \"{}\"\nunits = \"imperial\"\n", server.uri());
        let config: WeatherConfig = toml::from_str(&text).unwrap();
        let provider = OpenWeatherProvider::new(Client::new(), "KEY".into(), &config);

        let result = provider.fetch_by_city("Paris").await.unwrap();
        assert_eq!(result.temperature_c, Some(12.5));
    }

    #[tokio::test]
    async fn fetch_by_coordinates_sends_lat_lon() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris()))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server).fetch_by_coordinates(48.85, 2.35).await.unwrap();
        assert_eq!(result.city_display_name, "Paris");
    }

    #[tokio::test]
    async fn unnamed_coordinates_fall_back_to_numbers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "",
                "weather": [{ "icon": "10n" }],
                "cod": 200
            })))
            .mount(&server)
            .await;

        let result = provider(&server).fetch_by_coordinates(0.0, -30.5).await.unwrap();
        assert_eq!(result.city_display_name, "0.0000, -30.5000");
    }

    #[tokio::test]
    async fn http_404_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let err = provider(&server).fetch_by_city("Nowhere").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn cod_in_body_overrides_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let err = provider(&server).fetch_by_city("Nowhere").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn missing_weather_entries_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "Paris", "weather": [] })),
            )
            .mount(&server)
            .await;

        let err = provider(&server).fetch_by_city("Paris").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed { .. }));
    }

    #[test]
    fn cod_parses_numbers_and_strings() {
        assert_eq!(status_from_cod(&serde_json::json!(200)), Some(200));
        assert_eq!(status_from_cod(&serde_json::json!("404")), Some(404));
        assert_eq!(status_from_cod(&serde_json::json!("n/a")), None);
        assert_eq!(status_from_cod(&serde_json::json!(null)), None);
    }
}
