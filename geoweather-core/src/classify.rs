//! Collapses every upstream failure into the two user-facing failure kinds.

use crate::{
    error::UpstreamError,
    model::{Failure, FailureCode},
};

pub const NOT_FOUND_MESSAGE: &str = "location not found anywhere";
pub const SERVER_ERROR_MESSAGE: &str = "transient server problem, retry later";

impl FailureCode {
    /// 4xx means the place does not exist; anything else, including no status
    /// at all, is a server-side problem.
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(code) if (400..500).contains(&code) => FailureCode::NotFound,
            _ => FailureCode::ServerError,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FailureCode::NotFound => NOT_FOUND_MESSAGE,
            FailureCode::ServerError => SERVER_ERROR_MESSAGE,
        }
    }
}

impl From<FailureCode> for Failure {
    fn from(code: FailureCode) -> Self {
        Failure {
            code,
            message: code.message().to_string(),
        }
    }
}

pub fn classify(error: &UpstreamError) -> Failure {
    FailureCode::from_status(error.status_code()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_not_found() {
        for status in [400, 401, 404, 429, 499] {
            let failure = classify(&UpstreamError::status("openweather", status, ""));
            assert_eq!(failure.code, FailureCode::NotFound, "status {status}");
            assert_eq!(failure.message, NOT_FOUND_MESSAGE);
        }
    }

    #[test]
    fn everything_else_is_server_error() {
        for status in [200, 301, 399, 500, 503, 600] {
            let failure = classify(&UpstreamError::status("openweather", status, ""));
            assert_eq!(failure.code, FailureCode::ServerError, "status {status}");
            assert_eq!(failure.message, SERVER_ERROR_MESSAGE);
        }
    }

    #[test]
    fn errors_without_status_are_server_errors() {
        let malformed = classify(&UpstreamError::malformed("ipinfo", "no city"));
        assert_eq!(malformed.code, FailureCode::ServerError);

        let decode_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let decode = classify(&UpstreamError::decode("ipapi", decode_err));
        assert_eq!(decode.code, FailureCode::ServerError);
    }

    #[test]
    fn from_status_handles_missing_status() {
        assert_eq!(FailureCode::from_status(None), FailureCode::ServerError);
    }
}
