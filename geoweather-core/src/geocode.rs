use crate::{
    config::GeocodingConfig,
    error::UpstreamError,
    geocode::{ipapi::IpApiGeocoder, ipinfo::IpInfoGeocoder},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug};
use tracing::{debug, warn};

pub mod ipapi;
pub mod ipinfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeocoderId {
    IpApi,
    IpInfo,
}

impl GeocoderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocoderId::IpApi => "ipapi",
            GeocoderId::IpInfo => "ipinfo",
        }
    }

    pub const fn all() -> &'static [GeocoderId] {
        &[GeocoderId::IpApi, GeocoderId::IpInfo]
    }
}

impl std::fmt::Display for GeocoderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GeocoderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "ipapi" => Ok(GeocoderId::IpApi),
            "ipinfo" => Ok(GeocoderId::IpInfo),
            _ => Err(anyhow::anyhow!(
                "Unknown geocoding provider '{value}'. Supported providers: ipapi, ipinfo."
            )),
        }
    }
}

/// Something that can name the city a public IP address belongs to.
#[async_trait]
pub trait IpGeocoder: Send + Sync + Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn city_for_ip(&self, ip: &str) -> Result<String, UpstreamError>;
}

/// Construct a geocoder from config and explicit id.
pub fn geocoder_from_config(
    id: GeocoderId,
    config: &GeocodingConfig,
    http: Client,
) -> Box<dyn IpGeocoder> {
    let base_url = config.base_url_override(id);

    match id {
        GeocoderId::IpApi => Box::new(match base_url {
            Some(url) => IpApiGeocoder::with_base_url(http, url),
            None => IpApiGeocoder::new(http),
        }),
        GeocoderId::IpInfo => {
            let token = config.ipinfo_token.clone();
            Box::new(match base_url {
                Some(url) => IpInfoGeocoder::with_base_url(http, url, token),
                None => IpInfoGeocoder::new(http, token),
            })
        }
    }
}

/// Geocoders tried strictly in order: the fallback runs only once the
/// primary has failed, and at most once.
#[derive(Debug)]
pub struct GeocodeChain {
    primary: Box<dyn IpGeocoder>,
    fallback: Box<dyn IpGeocoder>,
}

impl GeocodeChain {
    pub fn new(primary: Box<dyn IpGeocoder>, fallback: Box<dyn IpGeocoder>) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(config: &GeocodingConfig, http: Client) -> anyhow::Result<Self> {
        let (primary, fallback) = config.chain_ids()?;

        Ok(Self::new(
            geocoder_from_config(primary, config, http.clone()),
            geocoder_from_config(fallback, config, http),
        ))
    }

    fn providers(&self) -> [&dyn IpGeocoder; 2] {
        [self.primary.as_ref(), self.fallback.as_ref()]
    }

    /// City for `ip` from the first provider that succeeds. When all fail,
    /// the last provider's error is returned.
    pub async fn city_for_ip(&self, ip: &str) -> Result<String, UpstreamError> {
        let [first, rest @ ..] = self.providers();

        debug!(provider = first.name(), ip, "geocoding client ip");
        let mut outcome = first.city_for_ip(ip).await;

        for next in rest {
            let Err(err) = &outcome else { break };
            warn!(
                failed = err.service(),
                next = next.name(),
                error = %err,
                "ip geocoding failed, trying next provider"
            );
            outcome = next.city_for_ip(ip).await;
        }

        outcome
    }
}
