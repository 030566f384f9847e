use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::UpstreamError,
    http::{endpoint, fetch_json},
};

use super::IpGeocoder;

const SERVICE: &str = "ipapi";
const DEFAULT_BASE_URL: &str = "http://ip-api.com";

/// ip-api.com lookup. Free tier, no key, plain HTTP only.
#[derive(Debug, Clone)]
pub struct IpApiGeocoder {
    base_url: String,
    http: Client,
}

impl IpApiGeocoder {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
}

#[async_trait]
impl IpGeocoder for IpApiGeocoder {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn city_for_ip(&self, ip: &str) -> Result<String, UpstreamError> {
        let url = endpoint(SERVICE, &self.base_url, &["json", ip])?;
        let request = self.http.get(url).query(&[("fields", "status,message,city")]);

        let parsed: IpApiResponse = fetch_json(SERVICE, request).await?;

        // ip-api answers 200 even when it cannot place the address.
        if parsed.status != "success" {
            let message = parsed.message.unwrap_or_else(|| parsed.status.clone());
            return Err(UpstreamError::status(SERVICE, 404, &message));
        }

        parsed
            .city
            .filter(|city| !city.trim().is_empty())
            .ok_or_else(|| UpstreamError::malformed(SERVICE, "response has no city"))
    }
}
