use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use geoweather_core::{Config, LocationRequest, LocationSignal, WeatherPipeline, fetch_locations};
use inquire::{Password, PasswordDisplayMode, Text};
use reqwest::Client;
use tracing::debug;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Current weather wherever you are")]
pub struct Cli {
    /// Log upstream calls and resolution steps.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weather API key (and optional ipinfo token).
    Configure,

    /// Weather for a page load where only the client address is known.
    Page {
        /// Client IP address; omit to simulate an unknown client.
        #[arg(long)]
        ip: Option<String>,
    },

    /// Weather for an explicit city, coordinates or IP address.
    Show {
        #[arg(long, conflicts_with_all = ["lat", "lon", "ip"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        ip: Option<String>,
    },

    /// Weather for a browser-style JSON body,
    /// e.g. '{"type":"coordinates","latitude":48.85,"longitude":2.35}'.
    Post { body: String },

    /// List the selectable locations.
    Locations,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let outcome = match self.command {
            Command::Configure => {
                configure()?;
                return Ok(ExitCode::SUCCESS);
            }
            Command::Locations => {
                let config = load_config()?;
                let http = http_client(&config)?;
                let entries = fetch_locations(&http, &config.locations.url)
                    .await
                    .with_context(|| {
                        format!("Failed to load locations from {}", config.locations.url)
                    })?;
                output::print_locations(&entries);
                return Ok(ExitCode::SUCCESS);
            }
            Command::Page { ip } => pipeline()?.on_page_load(ip.as_deref()).await,
            Command::Show { city, lat, lon, ip } => {
                let signal = signal_from_args(city, lat, lon, ip)?;
                pipeline()?.on_signal(&signal).await
            }
            Command::Post { body } => {
                let request: LocationRequest =
                    serde_json::from_str(&body).context("Failed to parse location JSON body")?;
                let signal = LocationSignal::try_from(request)?;
                pipeline()?.on_signal(&signal).await
            }
        };

        Ok(output::print_outcome(&outcome))
    }
}

/// Config from disk with `API_KEY` / `LOCATION_URL` applied on top.
fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_env();
    debug!(path = %Config::config_file_path()?.display(), "configuration loaded");
    Ok(config)
}

fn pipeline() -> Result<WeatherPipeline> {
    let config = load_config()?;
    let http = http_client(&config)?;
    WeatherPipeline::from_config(&config, http)
}

fn signal_from_args(
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    ip: Option<String>,
) -> Result<LocationSignal> {
    match (city, lat, lon, ip) {
        (Some(name), None, None, None) if !name.trim().is_empty() => {
            Ok(LocationSignal::CityName { name: name.trim().to_string() })
        }
        (None, Some(lat), Some(lon), None) => Ok(LocationSignal::coordinates(lat, lon)?),
        (None, None, None, Some(ip)) => Ok(LocationSignal::ClientIp { ip }),
        _ => bail!("Specify exactly one of --city, --lat/--lon or --ip."),
    }
}

fn http_client(config: &Config) -> Result<Client> {
    let mut builder =
        Client::builder().user_agent(concat!("geoweather/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.http.timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.set_weather_api_key(api_key.trim().to_string());

    let token = Text::new("ipinfo.io token (optional):")
        .with_help_message("Press Enter to skip")
        .prompt_skippable()?
        .filter(|t| !t.trim().is_empty());
    if let Some(token) = token {
        config.geocoding.ipinfo_token = Some(token.trim().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
