use thiserror::Error;

/// A failed call to one of the upstream services (weather provider,
/// IP geocoders, location list).
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream answered, but with a status signalling failure. Either
    /// the HTTP status was not 2xx, or the payload carried its own
    /// non-success status code.
    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload decoded but lacks something we need (e.g. no city).
    #[error("malformed {service} response: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },
}

impl UpstreamError {
    pub fn status(service: &'static str, status: u16, body: &str) -> Self {
        Self::Status {
            service,
            status,
            body: truncate_body(body),
        }
    }

    /// The request URL is dropped: it carries client IPs and API keys.
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        Self::Transport {
            service,
            source: source.without_url(),
        }
    }

    pub fn decode(service: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { service, source }
    }

    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            reason: reason.into(),
        }
    }

    /// HTTP-style status code attached to this error, if the upstream gave one.
    ///
    /// Transport errors carry a status only when reqwest attached one
    /// (e.g. via `error_for_status`).
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Decode { .. } | Self::Malformed { .. } => None,
        }
    }

    /// Name of the upstream that produced the error.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Status { service, .. }
            | Self::Transport { service, .. }
            | Self::Decode { service, .. }
            | Self::Malformed { service, .. } => service,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
