// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

/// Failures of the diagnostic pipeline. None of them is allowed to take the
/// host process down; callers log and carry on.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// The payload could not be decoded. The raw bytes are forwarded instead.
    #[error("Malformed diagnostic payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    /// The report directory cannot be created. Ingestion is disabled for the session.
    #[error("Report directory {} is unavailable: {source}", .path.display())]
    StorageUnavailable { path: PathBuf, source: io::Error },
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },
    #[error("Failed to remove {}: {source}", .path.display())]
    RemoveFailed { path: PathBuf, source: io::Error },
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },
    #[error("Failed to encode diagnostic payload: {0}")]
    EncodeFailed(#[source] serde_json::Error),
}

impl ReporterError {
    /// Whether ingestion must stop for the rest of the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReporterError::StorageUnavailable { .. })
    }
}
