use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Method, Url};

use super::types::{ConversionRequest, ConversionResponse};
use crate::config::ProbeConfig;
use crate::http::{HttpClient, shared_client};

/// The three request shapes the converter is probed with. Every call polls
/// past the transient status before returning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConverterApi: Send + Sync {
    /// `GET <base>?cached=..&s=..`
    async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse>;

    /// `GET <base>` with no query at all.
    async fn convert_without_parameters(&self) -> Result<ConversionResponse>;

    /// Any method against `<base>` with a raw body.
    async fn send_raw(&self, method: Method, body: &str) -> Result<ConversionResponse>;

    fn base_url(&self) -> &Url;
}

pub struct Converter {
    http: HttpClient,
    base_url: Url,
}

impl Converter {
    pub fn new(http: HttpClient, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Converter over the process-wide HTTP client.
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let client = shared_client()?.clone();
        Ok(Self::new(
            HttpClient::new(client, config.poll),
            config.base_url.clone(),
        ))
    }
}

#[async_trait]
impl ConverterApi for Converter {
    #[tracing::instrument(skip(self))]
    async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse> {
        let url = request.query_url(&self.base_url);
        debug!("Converting via {}...", url);

        self.http
            .send_polled("GET with parameters", |client| client.get(url.clone()))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn convert_without_parameters(&self) -> Result<ConversionResponse> {
        let url = self.base_url.clone();
        debug!("Probing {} without parameters...", url);

        self.http
            .send_polled("GET without parameters", |client| client.get(url.clone()))
            .await
    }

    #[tracing::instrument(skip(self, body))]
    async fn send_raw(&self, method: Method, body: &str) -> Result<ConversionResponse> {
        let url = self.base_url.clone();
        let operation_name = format!("{} request", method);
        debug!("Sending {} to {} with {} byte body...", method, url, body.len());

        self.http
            .send_polled(&operation_name, |client| {
                client
                    .request(method.clone(), url.clone())
                    .body(body.to_owned())
            })
            .await
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Body sent along with an unsupported method: the default request as JSON,
/// except for DELETE which goes out empty.
pub fn invalid_method_body(method: &Method) -> Result<String> {
    if *method == Method::DELETE {
        return Ok(String::new());
    }
    serde_json::to_string(&ConversionRequest::default())
        .context("Failed to serialize conversion request")
}
