//! Rate-limit detection for GitHub responses.
//!
//! GitHub answers an exhausted quota with 403, which would otherwise look
//! like a permissions problem. The remaining-quota header is checked first so
//! the operator gets the reset time instead.

use crate::error::GithubError;
use crate::github::client::Response;
use chrono::{DateTime, TimeZone, Utc};

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota state reported by one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: u64,
    pub reset: Option<DateTime<Utc>>,
}

impl Default for RateLimit {
    fn default() -> Self {
        // No header means we cannot tell, so assume quota is left
        RateLimit {
            limit: None,
            remaining: 1,
            reset: None,
        }
    }
}

impl RateLimit {
    /// Build from raw header values. `reset` is epoch seconds.
    pub fn from_header_values(
        limit: Option<&str>,
        remaining: Option<&str>,
        reset: Option<&str>,
    ) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<u64>().ok());

        RateLimit {
            limit: parse(limit),
            remaining: parse(remaining).unwrap_or(1),
            reset: parse(reset)
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self::from_header_values(get(LIMIT_HEADER), get(REMAINING_HEADER), get(RESET_HEADER))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Fail a response that ran out of quota or did not succeed.
///
/// Quota exhaustion wins over the status code.
pub fn check_response(response: &Response, repo: Option<&str>) -> Result<(), GithubError> {
    let rate = &response.rate_limit;
    if rate.is_exhausted() {
        tracing::error!(repo = repo.unwrap_or("-"), body = %response.body, "possible quota exhaustion");
        tracing::error!(
            limit = ?rate.limit,
            remaining = rate.remaining,
            reset = ?rate.reset,
            "rate limit headers"
        );
        if let Some(reset) = rate.reset {
            tracing::error!("limit will reset at: {}", reset.to_rfc3339());
        }
        return Err(GithubError::QuotaExceeded {
            repo: repo.map(str::to_string),
            limit: rate.limit,
            remaining: rate.remaining,
            reset: rate.reset,
        });
    }

    if !(200..300).contains(&response.status) {
        tracing::error!(status = response.status, url = %response.url, body = %response.body, "request failed");
        return Err(GithubError::Status {
            status: response.status,
            url: response.url.clone(),
            body: response.body.clone(),
        });
    }

    Ok(())
}
