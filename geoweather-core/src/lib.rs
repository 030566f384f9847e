//! Core library for `geoweather`.
//!
//! This crate defines:
//! - Private-address detection and IP geocoding with a fallback provider
//! - Location resolution from browser coordinates, client IPs or city names
//! - The current-weather provider abstraction
//! - Classification of upstream failures into user-facing outcomes
//! - The per-request pipeline tying the above together
//!
//! It is used by `geoweather-cli`, but can also back a web front end: the
//! pipeline hands back a [`WeatherOutcome`] and leaves presentation to the caller.

pub mod classify;
pub mod config;
pub mod error;
pub mod geocode;
mod http;
pub mod ip;
pub mod locations;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod resolver;

pub use classify::classify;
pub use config::Config;
pub use error::UpstreamError;
pub use geocode::{GeocodeChain, GeocoderId, IpGeocoder};
pub use ip::is_private;
pub use locations::{LocationEntry, fetch_locations};
pub use model::{
    Failure, FailureCode, LocationRequest, LocationSignal, ResolvedQuery, SignalError,
    WeatherOutcome, WeatherResult,
};
pub use pipeline::WeatherPipeline;
pub use provider::{WeatherProvider, fetch_weather};
pub use resolver::{LocationResolver, Resolution};
