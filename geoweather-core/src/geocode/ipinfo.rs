use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::UpstreamError,
    http::{endpoint, fetch_json},
};

use super::IpGeocoder;

const SERVICE: &str = "ipinfo";
const DEFAULT_BASE_URL: &str = "https://ipinfo.io";

/// ipinfo.io lookup. Works without a token at a low rate limit.
#[derive(Debug, Clone)]
pub struct IpInfoGeocoder {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl IpInfoGeocoder {
    pub fn new(http: Client, token: Option<String>) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(http: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    city: Option<String>,
    #[serde(default)]
    bogon: bool,
}

#[async_trait]
impl IpGeocoder for IpInfoGeocoder {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn city_for_ip(&self, ip: &str) -> Result<String, UpstreamError> {
        let url = endpoint(SERVICE, &self.base_url, &[ip, "json"])?;
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let parsed: IpInfoResponse = fetch_json(SERVICE, request).await?;

        // Same meaning as an ip-api "fail": the address cannot be placed.
        if parsed.bogon {
            return Err(UpstreamError::status(SERVICE, 404, "bogon address"));
        }

        parsed
            .city
            .filter(|city| !city.trim().is_empty())
            .ok_or_else(|| UpstreamError::malformed(SERVICE, "response has no city"))
    }
}
