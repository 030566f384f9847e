use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::geocode::GeocoderId;

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
pub const DEFAULT_LOCATIONS_URL: &str = "http://localhost:3000/assets/locations.json";

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Icons are served from `{icon_base_url}/{code}@2x.png`.
    #[serde(default = "default_icon_base_url")]
    pub icon_base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            icon_base_url: default_icon_base_url(),
        }
    }
}

/// IP geocoding settings: which provider is tried first, which one second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    pub ipapi_base_url: Option<String>,
    pub ipinfo_base_url: Option<String>,
    pub ipinfo_token: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            fallback: default_fallback(),
            ipapi_base_url: None,
            ipinfo_base_url: None,
            ipinfo_token: None,
        }
    }
}

impl GeocodingConfig {
    /// Primary and fallback provider ids, in the order they are tried.
    pub fn chain_ids(&self) -> Result<(GeocoderId, GeocoderId)> {
        let primary = GeocoderId::try_from(self.primary.as_str())?;
        let fallback = GeocoderId::try_from(self.fallback.as_str())?;

        if primary == fallback {
            return Err(anyhow!(
                "Geocoding primary and fallback are both '{primary}'.\n\
                 Hint: pick two different providers from: {}.",
                GeocoderId::all()
                    .iter()
                    .map(GeocoderId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        Ok((primary, fallback))
    }

    pub fn base_url_override(&self, id: GeocoderId) -> Option<&str> {
        match id {
            GeocoderId::IpApi => self.ipapi_base_url.as_deref(),
            GeocoderId::IpInfo => self.ipinfo_base_url.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsConfig {
    #[serde(default = "default_locations_url")]
    pub url: String,
}

impl Default for LocationsConfig {
    fn default() -> Self {
        Self {
            url: default_locations_url(),
        }
    }
}

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpConfig {
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [geocoding]
/// primary = "ipapi"
/// fallback = "ipinfo"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub locations: LocationsConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "geoweather", "geoweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `API_KEY` and `LOCATION_URL` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env`] with an explicit variable lookup.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("API_KEY").filter(|v| !v.is_empty()) {
            self.weather.api_key = Some(key);
        }
        if let Some(url) = lookup("LOCATION_URL").filter(|v| !v.is_empty()) {
            self.locations.url = url;
        }
    }

    pub fn set_weather_api_key(&mut self, api_key: String) {
        self.weather.api_key = Some(api_key);
    }

    pub fn weather_api_key(&self) -> Result<&str> {
        self.weather
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No weather API key configured.\n\
                     Hint: run `geoweather configure` or set the API_KEY environment variable."
                )
            })
    }
}

fn default_weather_base_url() -> String {
    DEFAULT_WEATHER_BASE_URL.to_string()
}

fn default_icon_base_url() -> String {
    DEFAULT_ICON_BASE_URL.to_string()
}

fn default_primary() -> String {
    GeocoderId::IpApi.as_str().to_string()
}

fn default_fallback() -> String {
    GeocoderId::IpInfo.as_str().to_string()
}

fn default_locations_url() -> String {
    DEFAULT_LOCATIONS_URL.to_string()
}
