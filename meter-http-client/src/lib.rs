// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! `meter-http-client` is the HTTP layer used to deliver diagnostic reports.
//! It exposes a single `send()` call over a concrete `HttpClient`, with
//! a per-request timeout override.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), meter_http_client::HttpClientError> {
//! use meter_http_client::{HttpClient, HttpMethod, HttpRequest};
//! use std::time::Duration;
//!
//! let client = HttpClient::new("https://reports.example.com".to_string(), Duration::from_secs(10))?;
//! let mut request = HttpRequest::new(HttpMethod::Put, "https://reports.example.com/".to_string());
//! request.body = bytes::Bytes::from_static(b"{}");
//! let response = client.send(request).await?;
//! println!("Status: {}", response.status_code);
//! # Ok(())
//! # }
//! ```

pub mod config;

pub(crate) mod backend;
mod client;
mod error;
mod request;
mod response;

pub use client::HttpClient;
pub use config::{HttpClientBuilder, HttpClientConfig};
pub use error::HttpClientError;
pub use request::{HttpMethod, HttpRequest};
pub use response::HttpResponse;
