// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Upload requests and the transport seam they are handed to.

#[cfg(feature = "http-transport")]
mod http_transport;
mod recording;

#[cfg(feature = "http-transport")]
pub use http_transport::HttpTransport;
pub use recording::{RecordedUpload, RecordingMode, RecordingTransport};

use crate::shared::configuration::ReporterConfiguration;
use crate::shared::constants;
use crate::shared::platform::Platform;
use crate::store::ReportId;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// A pre-built `PUT` of one report file to the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl UploadRequest {
    pub fn for_report(config: &ReporterConfiguration, id: &ReportId) -> Self {
        Self::with_platform(config, id, Platform::current())
    }

    pub fn with_platform(
        config: &ReporterConfiguration,
        id: &ReportId,
        platform: Platform,
    ) -> Self {
        let mut headers = vec![
            (constants::REPORT_ID_HEADER.to_owned(), id.to_string()),
            (
                constants::PLATFORM_HEADER.to_owned(),
                platform.as_str().to_owned(),
            ),
            (
                http::header::CONTENT_TYPE.as_str().to_owned(),
                constants::REPORT_CONTENT_TYPE.to_owned(),
            ),
            // Never answered from a local cache.
            (
                http::header::CACHE_CONTROL.as_str().to_owned(),
                "no-cache".to_owned(),
            ),
        ];
        if let Some(host) = config.host_identifier() {
            headers.push((constants::HOST_ID_HEADER.to_owned(), host.to_owned()));
        }
        Self {
            url: config.endpoint_url().to_owned(),
            headers,
            timeout: config.upload_timeout(),
        }
    }

    pub fn method(&self) -> http::Method {
        http::Method::PUT
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A report file and the request that delivers it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub id: ReportId,
    pub path: PathBuf,
    pub request: UploadRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Delivered,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCompletion {
    pub id: ReportId,
    pub outcome: UploadOutcome,
}

/// Reports the outcome of exactly one upload back to the reporter.
///
/// Dropping it without calling [`CompletionSender::complete`] reports a
/// failure, so a report can never stay in flight forever.
#[derive(Debug)]
pub struct CompletionSender {
    id: ReportId,
    tx: Option<mpsc::UnboundedSender<UploadCompletion>>,
}

impl CompletionSender {
    pub(crate) fn new(id: ReportId, tx: mpsc::UnboundedSender<UploadCompletion>) -> Self {
        Self { id, tx: Some(tx) }
    }

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    pub fn complete(mut self, outcome: UploadOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: UploadOutcome) {
        if let Some(tx) = self.tx.take() {
            let completion = UploadCompletion {
                id: self.id.clone(),
                outcome,
            };
            if tx.send(completion).is_err() {
                debug!(report.id = %self.id, "Reporter stopped before upload completed");
            }
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        self.send(UploadOutcome::Failed("upload abandoned by transport".to_owned()));
    }
}

/// Moves report files to the collection endpoint.
///
/// `submit` must return without waiting on the network. The outcome is
/// delivered later, from any thread, through `completion`.
pub trait Transport: Send + Sync {
    fn submit(&self, upload: Upload, completion: CompletionSender);
}
