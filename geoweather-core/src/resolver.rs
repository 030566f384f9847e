use tracing::debug;

use crate::{
    classify::classify,
    geocode::GeocodeChain,
    ip::is_private,
    model::{Failure, LocationSignal, ResolvedQuery},
};

/// What a location signal turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Query(ResolvedQuery),
    /// The signal cannot be placed from the server side; the browser has to
    /// supply its own position.
    NeedsClientLocation,
}

/// Turns location signals into queries the weather provider accepts.
#[derive(Debug)]
pub struct LocationResolver {
    geocoders: GeocodeChain,
}

impl LocationResolver {
    pub fn new(geocoders: GeocodeChain) -> Self {
        Self { geocoders }
    }

    pub async fn resolve(&self, signal: &LocationSignal) -> Result<Resolution, Failure> {
        match signal {
            LocationSignal::Coordinates { lat, lon } => Ok(Resolution::Query(
                ResolvedQuery::by_coordinates(*lat, *lon),
            )),
            LocationSignal::CityName { name } => {
                Ok(Resolution::Query(ResolvedQuery::by_city(name.clone())))
            }
            LocationSignal::ClientIp { ip } => {
                if is_private(Some(ip.as_str())) {
                    debug!(ip, "client ip is local, asking for client location");
                    return Ok(Resolution::NeedsClientLocation);
                }

                let city = self
                    .geocoders
                    .city_for_ip(ip.trim())
                    .await
                    .map_err(|e| classify(&e))?;

                debug!(ip, city = %city, "client ip geocoded");
                Ok(Resolution::Query(ResolvedQuery::by_city(city)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::UpstreamError, geocode::IpGeocoder, model::FailureCode};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    #[derive(Debug)]
    struct Scripted {
        name: &'static str,
        /// `Ok(city)` or `Err(status)`; a status of 0 means a malformed answer.
        reply: Result<&'static str, u16>,
        calls: CallLog,
    }

    #[async_trait]
    impl IpGeocoder for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn city_for_ip(&self, _ip: &str) -> Result<String, UpstreamError> {
            self.calls.lock().unwrap().push(self.name);
            match self.reply {
                Ok(city) => Ok(city.to_string()),
                Err(0) => Err(UpstreamError::malformed(self.name, "no city")),
                Err(status) => Err(UpstreamError::status(self.name, status, "")),
            }
        }
    }

    fn with_geocoders(
        primary: Result<&'static str, u16>,
        fallback: Result<&'static str, u16>,
    ) -> (LocationResolver, CallLog) {
        let calls = CallLog::default();
        let chain = GeocodeChain::new(
            Box::new(Scripted { name: "primary", reply: primary, calls: calls.clone() }),
            Box::new(Scripted { name: "fallback", reply: fallback, calls: calls.clone() }),
        );
        (LocationResolver::new(chain), calls)
    }

    fn ip(ip: &str) -> LocationSignal {
        LocationSignal::ClientIp { ip: ip.to_string() }
    }

    #[tokio::test]
    async fn coordinates_pass_straight_through() {
        let (resolver, calls) = with_geocoders(Ok("unused"), Ok("unused"));

        let resolution = resolver
            .resolve(&LocationSignal::Coordinates { lat: 48.85, lon: 2.35 })
            .await
            .unwrap();

        assert_eq!(resolution, Resolution::Query(ResolvedQuery::by_coordinates(48.85, 2.35)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn city_name_passes_straight_through() {
        let (resolver, calls) = with_geocoders(Ok("unused"), Ok("unused"));

        let resolution = resolver
            .resolve(&LocationSignal::CityName { name: "Odesa".into() })
            .await
            .unwrap();

        assert_eq!(resolution, Resolution::Query(ResolvedQuery::by_city("Odesa")));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn private_or_empty_ip_needs_client_location_without_lookup() {
        let (resolver, calls) = with_geocoders(Ok("unused"), Ok("unused"));

        for signal in [ip(""), ip("127.0.0.1"), ip("192.168.1.20"), ip("::1")] {
            let resolution = resolver.resolve(&signal).await.unwrap();
            assert_eq!(resolution, Resolution::NeedsClientLocation);
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let (resolver, calls) = with_geocoders(Ok("Kharkiv"), Ok("Kyiv"));

        let resolution = resolver.resolve(&ip("8.8.8.8")).await.unwrap();

        assert_eq!(resolution, Resolution::Query(ResolvedQuery::by_city("Kharkiv")));
        assert_eq!(*calls.lock().unwrap(), ["primary"]);
    }

    #[tokio::test]
    async fn fallback_used_after_primary_fails() {
        let (resolver, calls) = with_geocoders(Err(503), Ok("Kyiv"));

        let resolution = resolver.resolve(&ip("8.8.8.8")).await.unwrap();

        assert_eq!(resolution, Resolution::Query(ResolvedQuery::by_city("Kyiv")));
        assert_eq!(*calls.lock().unwrap(), ["primary", "fallback"]);
    }

    #[tokio::test]
    async fn both_failing_reports_fallback_kind() {
        let (resolver, calls) = with_geocoders(Err(500), Err(404));
        let failure = resolver.resolve(&ip("8.8.8.8")).await.unwrap_err();
        assert_eq!(failure.code, FailureCode::NotFound);
        assert_eq!(*calls.lock().unwrap(), ["primary", "fallback"]);

        let (resolver, _) = with_geocoders(Err(404), Err(0));
        let failure = resolver.resolve(&ip("8.8.8.8")).await.unwrap_err();
        assert_eq!(failure.code, FailureCode::ServerError);
    }
}
