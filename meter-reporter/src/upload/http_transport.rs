// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{CompletionSender, Transport, Upload, UploadOutcome};
use crate::shared::configuration::ReporterConfiguration;
use anyhow::Context;
use meter_http_client::{HttpClient, HttpClientError, HttpMethod, HttpRequest};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Delivers reports with an HTTP `PUT` on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
    runtime: Handle,
}

impl HttpTransport {
    /// Must be called from within a tokio runtime; uploads are spawned on it.
    pub fn new(config: &ReporterConfiguration) -> anyhow::Result<Self> {
        let runtime = Handle::try_current().context("HttpTransport requires a tokio runtime")?;
        let client = HttpClient::new(config.endpoint_url().to_owned(), config.upload_timeout())?;
        Ok(Self { client, runtime })
    }
}

impl Transport for HttpTransport {
    fn submit(&self, upload: Upload, completion: CompletionSender) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let outcome = match deliver(&client, &upload).await {
                Ok(status) => {
                    debug!(report.id = %upload.id, status, "Report delivered");
                    UploadOutcome::Delivered
                }
                Err(e) => {
                    warn!(report.id = %upload.id, url = %upload.request.url, error = %e, "Report upload failed");
                    UploadOutcome::Failed(e.to_string())
                }
            };
            completion.complete(outcome);
        });
    }
}

async fn deliver(client: &HttpClient, upload: &Upload) -> anyhow::Result<u16> {
    let body = tokio::fs::read(&upload.path)
        .await
        .with_context(|| format!("reading {}", upload.path.display()))?;

    let mut request = HttpRequest::new(HttpMethod::Put, upload.request.url.clone());
    request.headers = upload.request.headers.clone();
    request.body = bytes::Bytes::from(body);
    request.timeout = Some(upload.request.timeout);

    let response = client.send(request).await?;
    if !response.is_success() {
        return Err(HttpClientError::RequestFailed {
            status: response.status_code,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
        .into());
    }
    Ok(response.status_code)
}
