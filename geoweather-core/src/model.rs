use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the request boundary knows about where the user is.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSignal {
    Coordinates { lat: f64, lon: f64 },
    ClientIp { ip: String },
    CityName { name: String },
}

/// Query accepted by a [`WeatherProvider`](crate::WeatherProvider).
///
/// Only the resolver produces these; a client IP never reaches the weather
/// provider without first becoming a city.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedQuery {
    #[non_exhaustive]
    ByCity { name: String },
    #[non_exhaustive]
    ByCoordinates { lat: f64, lon: f64 },
}

impl ResolvedQuery {
    pub(crate) fn by_city(name: impl Into<String>) -> Self {
        Self::ByCity { name: name.into() }
    }

    pub(crate) fn by_coordinates(lat: f64, lon: f64) -> Self {
        Self::ByCoordinates { lat, lon }
    }
}

/// Normalized current weather for one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResult {
    pub city_display_name: String,
    /// Provider icon code, e.g. "01d".
    pub condition_code: String,
    pub icon_url: String,
    pub description: Option<String>,
    pub temperature_c: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
    /// Upstream payload as received.
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    NotFound,
    ServerError,
}

impl FailureCode {
    /// Status a web front end would answer with for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            FailureCode::NotFound => 404,
            FailureCode::ServerError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub code: FailureCode,
    pub message: String,
}

/// The single value handed back for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WeatherOutcome {
    Success(WeatherResult),
    /// Not an error: the caller should ask the browser for its position and
    /// come back with a concrete signal.
    NeedsClientLocation,
    Failure(Failure),
}

impl WeatherOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherOutcome::Success(_) => "success",
            WeatherOutcome::NeedsClientLocation => "needs_client_location",
            WeatherOutcome::Failure(f) => match f.code {
                FailureCode::NotFound => "not_found",
                FailureCode::ServerError => "server_error",
            },
        }
    }
}

impl From<Failure> for WeatherOutcome {
    fn from(failure: Failure) -> Self {
        WeatherOutcome::Failure(failure)
    }
}

/// JSON body posted by the browser after a `NeedsClientLocation` page.
///
/// `{ "type": "coordinates", "latitude": 48.85, "longitude": 2.35 }` or
/// `{ "type": "ip", "ip": "203.0.113.7" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("unknown location type '{0}', expected \"coordinates\" or \"ip\"")]
    UnknownType(String),

    #[error("coordinates request is missing latitude or longitude")]
    MissingCoordinates,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl LocationSignal {
    pub fn coordinates(lat: f64, lon: f64) -> Result<Self, SignalError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(SignalError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(SignalError::LongitudeOutOfRange(lon));
        }
        Ok(Self::Coordinates { lat, lon })
    }
}

impl TryFrom<LocationRequest> for LocationSignal {
    type Error = SignalError;

    fn try_from(request: LocationRequest) -> Result<Self, Self::Error> {
        match request.kind.as_str() {
            "coordinates" => match (request.latitude, request.longitude) {
                (Some(lat), Some(lon)) => LocationSignal::coordinates(lat, lon),
                _ => Err(SignalError::MissingCoordinates),
            },
            // An absent ip is kept as empty; the resolver turns it into
            // NeedsClientLocation.
            "ip" => Ok(LocationSignal::ClientIp {
                ip: request.ip.unwrap_or_default(),
            }),
            other => Err(SignalError::UnknownType(other.to_string())),
        }
    }
}
