use crate::{
    Config,
    error::UpstreamError,
    model::{ResolvedQuery, WeatherResult},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod openweather;

/// Current-weather source. Implementations query in metric units and
/// normalize the payload into a [`WeatherResult`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_by_city(&self, name: &str) -> Result<WeatherResult, UpstreamError>;

    async fn fetch_by_coordinates(&self, lat: f64, lon: f64)
    -> Result<WeatherResult, UpstreamError>;
}

/// Dispatch a resolved query to the matching provider call.
pub async fn fetch_weather(
    provider: &dyn WeatherProvider,
    query: &ResolvedQuery,
) -> Result<WeatherResult, UpstreamError> {
    match query {
        ResolvedQuery::ByCity { name } => provider.fetch_by_city(name).await,
        ResolvedQuery::ByCoordinates { lat, lon } => {
            provider.fetch_by_coordinates(*lat, *lon).await
        }
    }
}

/// Construct the weather provider from config.
pub fn provider_from_config(
    config: &Config,
    http: Client,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.weather_api_key()?;

    Ok(Box::new(OpenWeatherProvider::new(
        http,
        api_key.to_owned(),
        &config.weather,
    )))
}
