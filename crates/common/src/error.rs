//! Unified error type for the weather gateway.

use thiserror::Error;

/// Why an inbound request was rejected before any network or cache I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BadRequestReason {
    #[error("latitude or longitude out of range")]
    InvalidCoordinate,

    #[error("location name must be between 1 and 100 characters")]
    InvalidLocationLength,

    #[error("location name contains unsafe content")]
    UnsafeLocationName,

    #[error("location name contains unsupported characters")]
    InvalidLocationCharset,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API key is not configured")]
    NotConfigured,

    #[error("bad request: {0}")]
    BadRequest(#[from] BadRequestReason),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("could not fetch weather data from upstream: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream returned an invalid payload: {0}")]
    InvalidUpstreamPayload(String),

    /// Startup-time configuration problems; never produced per-request.
    #[error("config error: {0}")]
    Config(String),
}

impl GatewayError {
    /// HTTP-equivalent status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::NotConfigured => 500,
            GatewayError::BadRequest(_) => 400,
            GatewayError::RateLimited => 429,
            GatewayError::UpstreamUnavailable(_) => 502,
            GatewayError::InvalidUpstreamPayload(_) => 502,
            GatewayError::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(GatewayError::NotConfigured.status_code(), 500);
        assert_eq!(
            GatewayError::BadRequest(BadRequestReason::InvalidCoordinate).status_code(),
            400
        );
        assert_eq!(GatewayError::RateLimited.status_code(), 429);
        assert_eq!(
            GatewayError::UpstreamUnavailable("status 503".into()).status_code(),
            502
        );
        assert_eq!(
            GatewayError::InvalidUpstreamPayload("missing current".into()).status_code(),
            502
        );
    }

    #[test]
    fn test_bad_request_carries_sub_reason() {
        let err: GatewayError = BadRequestReason::UnsafeLocationName.into();
        match err {
            GatewayError::BadRequest(reason) => {
                assert_eq!(reason, BadRequestReason::UnsafeLocationName)
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }
}
