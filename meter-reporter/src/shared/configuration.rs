// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
use crate::shared::constants;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENDPOINT_URL_ENV: &str = "METER_REPORTER_ENDPOINT_URL";
pub const HOST_ID_ENV: &str = "METER_REPORTER_HOST_ID";
pub const REPORTS_DIR_ENV: &str = "METER_REPORTER_REPORTS_DIR";
pub const RETENTION_SECS_ENV: &str = "METER_REPORTER_RETENTION_SECS";
pub const FILTER_SIMULATED_ENV: &str = "METER_REPORTER_FILTER_SIMULATED";
pub const UPLOAD_TIMEOUT_SECS_ENV: &str = "METER_REPORTER_UPLOAD_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterConfiguration {
    endpoint_url: String,
    // Sent as the host id header when set
    host_identifier: Option<String>,
    reports_dir: PathBuf,
    retention: Duration,
    // Drop payloads produced in a simulated environment
    filter_simulated_payloads: bool,
    upload_timeout: Duration,
}

impl ReporterConfiguration {
    pub fn new(
        endpoint_url: String,
        host_identifier: Option<String>,
        reports_dir: Option<PathBuf>,
        retention: Option<Duration>,
        filter_simulated_payloads: bool,
        upload_timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let uri: http::Uri = endpoint_url
            .parse()
            .with_context(|| format!("Invalid endpoint url {endpoint_url:?}"))?;
        anyhow::ensure!(
            matches!(uri.scheme_str(), Some("http") | Some("https")),
            "Endpoint url must use http or https: {endpoint_url}"
        );
        anyhow::ensure!(
            uri.authority().is_some(),
            "Endpoint url has no host: {endpoint_url}"
        );
        let retention = retention.unwrap_or(constants::DEFAULT_RETENTION);
        anyhow::ensure!(!retention.is_zero(), "Retention window must be non-zero");
        let upload_timeout = upload_timeout.unwrap_or(constants::DEFAULT_UPLOAD_TIMEOUT);
        anyhow::ensure!(!upload_timeout.is_zero(), "Upload timeout must be non-zero");
        // An empty host id is the same as none; the header would be meaningless.
        let host_identifier = host_identifier.filter(|h| !h.is_empty());

        Ok(Self {
            endpoint_url,
            host_identifier,
            reports_dir: reports_dir.unwrap_or_else(default_reports_dir),
            retention,
            filter_simulated_payloads,
            upload_timeout,
        })
    }

    /// Configuration with every optional setting at its default.
    pub fn for_endpoint(endpoint_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::new(endpoint_url.into(), None, None, None, true, None)
    }

    /// Reads the configuration from `METER_REPORTER_*` environment variables.
    /// Only the endpoint url is required.
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint_url = parse_env::str_not_empty(ENDPOINT_URL_ENV)
            .with_context(|| format!("{ENDPOINT_URL_ENV} must be set"))?;
        Self::new(
            endpoint_url,
            parse_env::str_not_empty(HOST_ID_ENV),
            parse_env::str_not_empty(REPORTS_DIR_ENV).map(PathBuf::from),
            parse_env::duration(RETENTION_SECS_ENV),
            parse_env::bool(FILTER_SIMULATED_ENV).unwrap_or(true),
            parse_env::duration(UPLOAD_TIMEOUT_SECS_ENV),
        )
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn host_identifier(&self) -> Option<&str> {
        self.host_identifier.as_deref()
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn filter_simulated_payloads(&self) -> bool {
        self.filter_simulated_payloads
    }

    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    pub fn set_reports_dir(&mut self, reports_dir: PathBuf) {
        self.reports_dir = reports_dir;
    }

    pub fn set_filter_simulated_payloads(&mut self, filter: bool) {
        self.filter_simulated_payloads = filter;
    }

    pub fn set_host_identifier(&mut self, host_identifier: Option<String>) {
        self.host_identifier = host_identifier.filter(|h| !h.is_empty());
    }

    pub fn set_retention(&mut self, retention: Duration) -> anyhow::Result<()> {
        anyhow::ensure!(!retention.is_zero(), "Retention window must be non-zero");
        self.retention = retention;
        Ok(())
    }
}

/// `{cache dir}/MeterReporter`, or the temp dir when the platform has no cache dir.
pub fn default_reports_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(constants::DEFAULT_REPORTS_DIR_NAME)
}

pub mod parse_env {
    use std::{env, time::Duration};

    pub fn duration(name: &str) -> Option<Duration> {
        Duration::try_from_secs_f64(env::var(name).ok()?.parse::<f64>().ok()?).ok()
    }

    pub fn bool(name: &str) -> Option<bool> {
        match env::var(name).ok()?.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            _ => Some(false),
        }
    }

    pub fn str_not_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }
}
