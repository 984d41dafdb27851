use std::fmt;

use reqwest::{StatusCode, Url};
use serde::Serialize;

use crate::config::DEFAULT_DATE_STRING;

/// Query parameters of one conversion call.
///
/// `s` is either a date string or a unix timestamp; the service decides which
/// by its shape. Nothing is validated locally.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub cached: Option<String>,
    pub s: Option<String>,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            cached: None,
            s: Some(DEFAULT_DATE_STRING.to_string()),
        }
    }
}

impl ConversionRequest {
    /// Default request with `s` replaced.
    pub fn with_s(s: impl Into<String>) -> Self {
        Self {
            s: Some(s.into()),
            ..Self::default()
        }
    }

    /// Both parameters absent.
    pub fn empty() -> Self {
        Self {
            cached: None,
            s: None,
        }
    }

    /// Appends `cached` and `s` to `base`. Absent values are still sent, as
    /// bare keys without `=`.
    pub fn query_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in [("cached", &self.cached), ("s", &self.s)] {
                match value {
                    Some(value) => pairs.append_pair(name, value),
                    None => pairs.append_key_only(name),
                };
            }
        }
        url
    }
}

/// Status and text body of one answer from the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResponse {
    status: StatusCode,
    body: String,
}

impl ConversionResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as returned: a bare number for date -> timestamp, a JSON-quoted
    /// string for timestamp -> date.
    pub fn text(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for ConversionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_UNIX_TIMESTAMP;

    fn base() -> Url {
        Url::parse("https://helloacm.com/api/unix-timestamp-converter/").unwrap()
    }

    #[test]
    fn test_default_request_carries_sample_date() {
        let request = ConversionRequest::default();
        assert_eq!(request.cached, None);
        assert_eq!(request.s.as_deref(), Some(DEFAULT_DATE_STRING));
    }

    #[test]
    fn test_query_url_default() {
        let url = ConversionRequest::default().query_url(&base());
        assert_eq!(
            url.as_str(),
            "https://helloacm.com/api/unix-timestamp-converter/?cached&s=2016-01-01+02%3A03%3A22"
        );
    }

    #[test]
    fn test_query_url_timestamp() {
        let url = ConversionRequest::with_s(DEFAULT_UNIX_TIMESTAMP).query_url(&base());
        assert_eq!(url.query(), Some("cached&s=1451613802"));
    }

    #[test]
    fn test_query_url_keeps_absent_parameters() {
        let url = ConversionRequest::empty().query_url(&base());
        assert_eq!(url.query(), Some("cached&s"));
    }

    #[test]
    fn test_query_url_empty_value_differs_from_absent() {
        let url = ConversionRequest::with_s("").query_url(&base());
        assert_eq!(url.query(), Some("cached&s="));
    }

    #[test]
    fn test_query_url_encodes_reserved_characters() {
        let url = ConversionRequest::with_s("10%10*2023").query_url(&base());
        assert_eq!(url.query(), Some("cached&s=10%2510*2023"));

        let url = ConversionRequest::with_s("18/12/2023").query_url(&base());
        assert_eq!(url.query(), Some("cached&s=18%2F12%2F2023"));
    }

    #[test]
    fn test_query_url_with_cached_value() {
        let request = ConversionRequest {
            cached: Some("1".to_string()),
            ..ConversionRequest::default()
        };
        let pairs: Vec<(String, String)> = request
            .query_url(&base())
            .query_pairs()
            .into_owned()
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("cached".to_string(), "1".to_string()),
                ("s".to_string(), DEFAULT_DATE_STRING.to_string()),
            ]
        );
    }

    #[test]
    fn test_request_json_body() {
        let body = serde_json::to_string(&ConversionRequest::default()).unwrap();
        assert_eq!(body, r#"{"cached":null,"s":"2016-01-01 02:03:22"}"#);
    }

    #[test]
    fn test_response_accessors() {
        let response = ConversionResponse::new(StatusCode::OK, "\"2016-01-01 02:03:22\"");
        assert!(response.is_success());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "\"2016-01-01 02:03:22\"");
        assert_eq!(response.to_string(), "200 \"2016-01-01 02:03:22\"");

        let response = ConversionResponse::new(StatusCode::NOT_FOUND, "Not Found");
        assert!(!response.is_success());
    }
}
