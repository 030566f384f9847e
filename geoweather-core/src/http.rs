use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;

/// `base` with `segments` appended as path segments.
///
/// Segments are percent-encoded, so a value holding `/`, `?` or `#` stays a
/// single segment instead of reshaping the request.
pub(crate) fn endpoint(
    service: &'static str,
    base: &str,
    segments: &[&str],
) -> Result<Url, UpstreamError> {
    let mut url = Url::parse(base)
        .map_err(|e| UpstreamError::malformed(service, format!("invalid base url: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| UpstreamError::malformed(service, "base url cannot take a path"))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Send `request` and return the body of a 2xx response.
pub(crate) async fn fetch_body(
    service: &'static str,
    request: RequestBuilder,
) -> Result<String, UpstreamError> {
    let res = request
        .send()
        .await
        .map_err(|e| UpstreamError::transport(service, e))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| UpstreamError::transport(service, e))?;

    if !status.is_success() {
        return Err(UpstreamError::status(service, status.as_u16(), &body));
    }

    Ok(body)
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T, UpstreamError> {
    let body = fetch_body(service, request).await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::decode(service, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments() {
        let url = endpoint("ipapi", "http://ip-api.com", &["json", "8.8.8.8"]).unwrap();
        assert_eq!(url.as_str(), "http://ip-api.com/json/8.8.8.8");

        let url = endpoint("ipinfo", "https://proxy.test/geo/", &["1.1.1.1", "json"]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.test/geo/1.1.1.1/json");
    }

    #[test]
    fn endpoint_keeps_hostile_values_in_one_segment() {
        let url = endpoint("ipapi", "http://ip-api.com", &["json", "8.8.8.8/../x?a=1#f"]).unwrap();

        assert_eq!(url.path_segments().map(|s| s.count()), Some(2));
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn endpoint_rejects_unusable_base() {
        let err = endpoint("ipapi", "not a url", &["json"]).unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed { .. }));
    }
}
