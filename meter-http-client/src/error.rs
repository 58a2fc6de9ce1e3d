// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for `meter-http-client`.

use thiserror::Error;

/// Errors that can occur during HTTP client operations.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The TCP connection to the server could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request exceeded the configured timeout duration.
    #[error("request timed out")]
    TimedOut,

    /// The server returned an HTTP error status code.
    ///
    /// Only raised when `treat_http_errors_as_errors` is `true` (the default).
    #[error("request failed with status {status}: {body}")]
    RequestFailed {
        /// The HTTP status code (e.g. 404, 503).
        status: u16,
        /// The response body, lossy-decoded as UTF-8.
        body: String,
    },

    /// The client configuration or the request itself was invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred during the request.
    #[error("I/O error: {0}")]
    IoError(String),
}
