//! Per-request sequencing: resolve the location, fetch the weather, classify
//! whatever went wrong. Every path ends in exactly one [`WeatherOutcome`].

use reqwest::Client;
use tracing::{debug, info};

use crate::{
    Config,
    classify::classify,
    geocode::GeocodeChain,
    ip::is_private,
    model::{LocationSignal, WeatherOutcome},
    provider::{WeatherProvider, fetch_weather, provider_from_config},
    resolver::{LocationResolver, Resolution},
};

#[derive(Debug)]
pub struct WeatherPipeline {
    resolver: LocationResolver,
    weather: Box<dyn WeatherProvider>,
}

impl WeatherPipeline {
    pub fn new(resolver: LocationResolver, weather: Box<dyn WeatherProvider>) -> Self {
        Self { resolver, weather }
    }

    /// Build the pipeline with every upstream client sharing `http`.
    pub fn from_config(config: &Config, http: Client) -> anyhow::Result<Self> {
        let geocoders = GeocodeChain::from_config(&config.geocoding, http.clone())?;
        let weather = provider_from_config(config, http)?;

        Ok(Self::new(LocationResolver::new(geocoders), weather))
    }

    /// A page was requested and all we know is the client's address.
    ///
    /// Local or unknown addresses short-circuit to
    /// [`WeatherOutcome::NeedsClientLocation`] without touching the network.
    pub async fn on_page_load(&self, client_ip: Option<&str>) -> WeatherOutcome {
        let outcome = match client_ip {
            Some(ip) if !is_private(Some(ip)) => {
                self.run(&LocationSignal::ClientIp { ip: ip.to_string() }).await
            }
            _ => WeatherOutcome::NeedsClientLocation,
        };

        info!(path = "page_load", outcome = outcome.kind(), "weather request finished");
        outcome
    }

    /// The caller already holds a concrete signal (browser coordinates, an
    /// explicit IP, a searched city).
    pub async fn on_signal(&self, signal: &LocationSignal) -> WeatherOutcome {
        let outcome = self.run(signal).await;

        info!(path = "signal", outcome = outcome.kind(), "weather request finished");
        outcome
    }

    async fn run(&self, signal: &LocationSignal) -> WeatherOutcome {
        let query = match self.resolver.resolve(signal).await {
            Ok(Resolution::Query(query)) => query,
            Ok(Resolution::NeedsClientLocation) => return WeatherOutcome::NeedsClientLocation,
            Err(failure) => return failure.into(),
        };

        debug!(?query, "location resolved");

        match fetch_weather(self.weather.as_ref(), &query).await {
            Ok(result) => WeatherOutcome::Success(result),
            Err(err) => {
                debug!(error = %err, "weather provider failed");
                classify(&err).into()
            }
        }
    }
}
