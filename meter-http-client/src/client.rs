// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The public `HttpClient` struct.

use crate::config::{HttpClientBuilder, HttpClientConfig};
use crate::{HttpClientError, HttpRequest, HttpResponse};
use std::time::Duration;

#[cfg(feature = "reqwest-backend")]
use crate::backend::Backend;

#[cfg(feature = "reqwest-backend")]
use crate::backend::reqwest_backend::ReqwestBackend;

/// A high-level async HTTP client.
///
/// Constructed once and reused across many [`HttpClient::send`] calls. Cloning
/// is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    #[cfg(feature = "reqwest-backend")]
    backend: ReqwestBackend,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Construct a client for the given base URL and default timeout.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, HttpClientError> {
        Self::builder().base_url(base_url).timeout(timeout).build()
    }

    /// Returns a builder for constructing an `HttpClient` with advanced options.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub(crate) fn from_config(config: HttpClientConfig) -> Result<Self, HttpClientError> {
        #[cfg(feature = "reqwest-backend")]
        {
            let backend = ReqwestBackend::new(config.timeout())?;
            Ok(Self { backend, config })
        }
        #[cfg(not(feature = "reqwest-backend"))]
        {
            let _ = config;
            Err(HttpClientError::InvalidConfig(
                "no backend feature enabled; enable the `reqwest-backend` feature".to_owned(),
            ))
        }
    }

    /// The client's configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Send an HTTP request and return the response. There is no automatic
    /// retry.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        #[cfg(feature = "reqwest-backend")]
        {
            self.backend.send(request, &self.config).await
        }
        #[cfg(not(feature = "reqwest-backend"))]
        {
            let _ = request;
            Err(HttpClientError::InvalidConfig(
                "no backend feature enabled".to_owned(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_client() {
        let client =
            HttpClient::new("http://localhost:8080".to_owned(), Duration::from_secs(10)).unwrap();
        assert_eq!(client.config().base_url(), "http://localhost:8080");
        assert_eq!(client.config().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn new_rejects_zero_timeout() {
        assert!(HttpClient::new("http://localhost".to_owned(), Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn send_returns_error_when_no_server() {
        let client =
            HttpClient::new("http://127.0.0.1:1".to_owned(), Duration::from_secs(1)).unwrap();
        let req = HttpRequest::new(crate::HttpMethod::Put, "http://127.0.0.1:1/".to_owned());
        let result = client.send(req).await;
        assert!(result.is_err());
    }
}
