//! HTTP client that polls past transient failures.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use log::{debug, error, trace};
use reqwest::{Client, Request, RequestBuilder};

use super::poll::{PollSettings, poll_until_available};
use crate::config::HTTP_TIMEOUT;
use crate::converter::ConversionResponse;

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Returns the process-wide reqwest client, building it on first use.
///
/// The client is never reconfigured afterwards. If two threads race on the
/// first call, one of the built clients is simply dropped.
pub fn shared_client() -> Result<&'static Client> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }

    let client = Client::builder()
        .user_agent(concat!("tsprobe/", env!("TSPROBE_VERSION")))
        .connect_timeout(HTTP_TIMEOUT)
        .read_timeout(HTTP_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    Ok(SHARED_CLIENT.get_or_init(|| client))
}

/// Reads the whole body of `response` as text.
pub async fn read_body(response: reqwest::Response) -> Result<String> {
    response
        .text()
        .await
        .context("Failed to read response body")
}

/// HTTP client whose sends are wrapped in [`poll_until_available`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    poll: PollSettings,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client, poll: PollSettings) -> Self {
        Self { client, poll }
    }

    /// Builds a request with `build` and sends it, rebuilding and resending
    /// it while the service answers with the transient status.
    #[tracing::instrument(skip(self, build))]
    pub async fn send_polled<F>(&self, operation_name: &str, build: F) -> Result<ConversionResponse>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = &self.client;
        let build = &build;

        poll_until_available(operation_name, &self.poll, || async move {
            let request = build(client)
                .build()
                .context("Failed to build request")?;
            Self::execute(client, request).await
        })
        .await
    }

    /// Single attempt without polling. Transport failures are returned as
    /// errors; any HTTP status, including the transient one, is a response.
    #[tracing::instrument(skip(client, request))]
    pub async fn execute(client: &Client, request: Request) -> Result<ConversionResponse> {
        let method = request.method().clone();
        let url = request.url().clone();

        debug!(
            "Sending request with method type: '{}' headers: {:?} endpoint: {}",
            method,
            request.headers(),
            url
        );
        trace!("------- Request start -------");

        let result = client.execute(request).await;
        trace!("------- Request end -------");

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("An error occurred while executing HTTP request: {}", e);
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to send {} request to {}", method, url)));
            }
        };

        let status = response.status();
        let body = read_body(response).await?;
        debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());

        Ok(ConversionResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, StatusCode};
    use std::time::Duration;

    fn fast_poll() -> PollSettings {
        PollSettings {
            max_wait: Duration::from_millis(300),
            interval: Duration::from_millis(50),
            transient_status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[test]
    fn test_shared_client_is_reused() {
        let first = shared_client().unwrap();
        let second = shared_client().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn test_send_polled_returns_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/convert")
            .with_status(200)
            .with_body("1451613802")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new(), fast_poll());
        let response = client
            .send_polled("GET", |c| c.get(format!("{}/convert", url)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "1451613802");
    }

    #[tokio::test]
    async fn test_send_polled_does_not_treat_client_errors_as_failures() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("DELETE", "/convert")
            .with_status(405)
            .with_body("Method Not Allowed")
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new(), fast_poll());
        let response = client
            .send_polled("DELETE", |c| {
                c.request(Method::DELETE, format!("{}/convert", url))
                    .body("")
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.text(), "Method Not Allowed");
    }

    #[test_log::test(tokio::test)]
    async fn test_send_polled_resends_while_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/convert")
            .with_status(503)
            .with_body("Service Unavailable")
            .expect_at_least(2)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new(), fast_poll());
        let response = client
            .send_polled("GET", |c| c.get(format!("{}/convert", url)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_send_polled_propagates_connection_errors() {
        let client = HttpClient::new(Client::new(), fast_poll());
        let err = client
            .send_polled("GET", |c| c.get("http://127.0.0.1:1/convert"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to send GET request"));
    }

    #[tokio::test]
    async fn test_execute_sends_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/convert")
            .match_body(r#"{"cached":null,"s":"2016-01-01 02:03:22"}"#)
            .with_status(405)
            .with_body("Method Not Allowed")
            .create_async()
            .await;

        let client = Client::new();
        let request = client
            .post(format!("{}/convert", url))
            .body(r#"{"cached":null,"s":"2016-01-01 02:03:22"}"#)
            .build()
            .unwrap();
        let response = HttpClient::execute(&client, request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
