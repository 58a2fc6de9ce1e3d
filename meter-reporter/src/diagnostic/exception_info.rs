// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::CrashDiagnostic;
use crate::shared::constants;
use crate::ReporterError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;

/// What the panic hook knew about the failure that ended the previous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionInfo {
    pub name: String,
    pub reason: String,
    #[serde(default)]
    pub call_stack_addresses: Vec<u64>,
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
}

impl ExceptionInfo {
    pub fn new(name: String, reason: String, call_stack_addresses: Vec<u64>) -> Self {
        Self {
            name,
            reason,
            call_stack_addresses,
            captured_at: Utc::now(),
            thread_name: None,
        }
    }

    /// Whether this record plausibly describes `diagnostic`.
    ///
    /// The diagnostic must be an abort (SIGABRT, and EXC_CRASH when the
    /// exception type is reported), and the capture time must fall inside
    /// `[begin, end + 60 s]` for whichever bounds are known.
    pub fn matches_crash_diagnostic(
        &self,
        diagnostic: &CrashDiagnostic,
        window_begin: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
    ) -> bool {
        let metadata = &diagnostic.diagnostic_meta_data;
        if metadata.signal != Some(constants::SIGABRT) {
            return false;
        }
        if metadata
            .exception_type
            .is_some_and(|t| t != constants::EXC_CRASH)
        {
            return false;
        }
        if window_begin.is_some_and(|begin| self.captured_at < begin) {
            return false;
        }
        let slack = chrono::Duration::from_std(constants::CAPTURE_WINDOW_SLACK)
            .unwrap_or_else(|_| chrono::Duration::zero());
        // An end too close to the representable maximum leaves the window open.
        match window_end.and_then(|end| end.checked_add_signed(slack)) {
            Some(end) => self.captured_at <= end,
            None => true,
        }
    }

    /// Reads a record written by the panic hook. A missing file is `Ok(None)`.
    pub fn read_from(path: &Path) -> Result<Option<Self>, ReporterError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ReporterError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(ReporterError::MalformedPayload)
    }

    /// Writes the record next to `path` and renames it into place, so a
    /// reader sees either the previous file or the complete new one.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let bytes = serde_json::to_vec(self)?;
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);
        let mut file = std::fs::File::create(tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(tmp_path, path)
    }
}
