//! Read-only list of selectable locations offered alongside the weather.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::UpstreamError, http::fetch_json};

const SERVICE: &str = "locations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
pub struct LocationEntry {
    pub name: String,
    pub country: Option<String>,
}

/// Entries may be bare names or objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Name(String),
    Detailed {
        #[serde(alias = "city")]
        name: String,
        country: Option<String>,
    },
}

impl From<RawEntry> for LocationEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Name(name) => LocationEntry { name, country: None },
            RawEntry::Detailed { name, country } => LocationEntry { name, country },
        }
    }
}

impl std::fmt::Display for LocationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}, {country}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

pub async fn fetch_locations(
    http: &Client,
    url: &str,
) -> Result<Vec<LocationEntry>, UpstreamError> {
    debug!(url, "fetching location list");
    fetch_json(SERVICE, http.get(url)).await
}
