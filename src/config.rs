//! Endpoint constants and runtime configuration for the probe.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::debug;
use reqwest::{StatusCode, Url};

use crate::http::PollSettings;

/// Public unix-timestamp converter endpoint.
pub const BASE_URL: &str = "https://helloacm.com/api/unix-timestamp-converter/";

/// Sample date string; converts to [`DEFAULT_UNIX_TIMESTAMP`].
pub const DEFAULT_DATE_STRING: &str = "2016-01-01 02:03:22";

/// Sample timestamp; converts back to [`DEFAULT_DATE_STRING`].
pub const DEFAULT_UNIX_TIMESTAMP: &str = "1451613802";

/// How long a single call may keep polling past transient failures.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed delay between two polling attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connect and read timeout of the underlying HTTP client.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Status the service answers with while it is overloaded.
pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

pub const BAD_REQUEST: StatusCode = StatusCode::BAD_REQUEST;
pub const BAD_REQUEST_MESSAGE: &str = "Bad Request";

pub const NOT_FOUND: StatusCode = StatusCode::NOT_FOUND;
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode::METHOD_NOT_ALLOWED;
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// Body the service returns with a 200 when it cannot parse `s`.
pub const INVALID_INPUT_BODY: &str = "false";

/// Resolved settings for one probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub base_url: Url,
    pub poll: PollSettings,
}

impl ProbeConfig {
    /// Builds a configuration, falling back to the defaults above for
    /// anything left unset. A malformed base URL is rejected here so no
    /// request is ever built against it.
    pub fn new(
        base_url: Option<String>,
        max_wait: Option<Duration>,
        poll_interval: Option<Duration>,
    ) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let poll = PollSettings {
            max_wait: max_wait.unwrap_or(DEFAULT_TIMEOUT),
            interval: poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            transient_status: SERVICE_UNAVAILABLE,
        };

        debug!("Probing {} with {:?}", base_url, poll);

        Ok(Self { base_url, poll })
    }
}

/// Parses the converter base URL. Only http(s) URLs are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid base URL '{}'", raw))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        bail!("Base URL must be an http(s) URL, got '{}'", raw);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::new(None, None, None).unwrap();
        assert_eq!(config.base_url.as_str(), BASE_URL);
        assert_eq!(config.poll.max_wait, Duration::from_secs(30));
        assert_eq!(config.poll.interval, Duration::from_secs(1));
        assert_eq!(config.poll, PollSettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = ProbeConfig::new(
            Some("http://127.0.0.1:8080/convert/".to_string()),
            Some(Duration::from_secs(5)),
            Some(Duration::from_millis(250)),
        )
        .unwrap();

        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/convert/");
        assert_eq!(config.poll.max_wait, Duration::from_secs(5));
        assert_eq!(config.poll.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_base_url_is_rejected() {
        let err = ProbeConfig::new(Some("not a url".to_string()), None, None).unwrap_err();
        assert!(err.to_string().contains("Invalid base URL"));
    }

    #[test]
    fn test_non_http_base_url_is_rejected() {
        assert!(parse_base_url("ftp://example.com/").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("http://example.com").is_ok());
    }

    #[test]
    fn test_sample_values_are_a_pair() {
        assert_eq!(DEFAULT_DATE_STRING.len(), 19);
        assert!(DEFAULT_UNIX_TIMESTAMP.parse::<u64>().is_ok());
    }
}
