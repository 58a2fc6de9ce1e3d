// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The report directory.
//!
//! Every `{id}.mxdiagnostic` file in the directory is a report that still has
//! to be uploaded. There is no other record of pending work, so whatever
//! survives a crash or restart is picked up by the next sweep.

mod scheduler;

pub use scheduler::*;

use crate::diagnostic::ExceptionInfo;
use crate::shared::constants;
use crate::ReporterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, warn};

/// Random lowercase hex token naming a report, also sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(String);

impl ReportId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accepts non-empty lowercase ASCII alphanumeric strings.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = !s.is_empty()
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
        valid.then(|| Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReport {
    pub id: ReportId,
    pub path: PathBuf,
    /// Modification time of the file, which is never written after the rename.
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredEntry {
    Report(PendingReport),
    ExceptionInfo(PathBuf),
    /// Left behind by a write that never reached its rename.
    PartialWrite(PathBuf),
    Other(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    directory: PathBuf,
}

impl ReportStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn exception_info_path(&self) -> PathBuf {
        self.directory.join(constants::EXCEPTION_INFO_FILENAME)
    }

    pub fn report_path(&self, id: &ReportId) -> PathBuf {
        self.directory
            .join(format!("{id}.{}", constants::REPORT_FILE_EXTENSION))
    }

    pub fn create_directory_if_needed(&self) -> Result<(), ReporterError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| {
            ReporterError::StorageUnavailable {
                path: self.directory.clone(),
                source,
            }
        })
    }

    /// Writes `bytes` under a fresh identifier. The file appears under its
    /// final name only once completely written.
    pub fn persist(&self, bytes: &[u8]) -> Result<PendingReport, ReporterError> {
        let write_failed = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| ReporterError::WriteFailed { path, source }
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(constants::PARTIAL_WRITE_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.directory)
            .map_err(write_failed(&self.directory))?;
        tmp.write_all(bytes).map_err(write_failed(tmp.path()))?;
        tmp.as_file().sync_all().map_err(write_failed(tmp.path()))?;

        let id = ReportId::generate();
        let path = self.report_path(&id);
        let file = tmp
            .persist(&path)
            .map_err(|e| write_failed(&path)(e.error))?;
        let created_at = file
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());
        debug!(report.id = %id, bytes = bytes.len(), "Persisted report");
        Ok(PendingReport {
            id,
            path,
            created_at,
        })
    }

    /// Everything in the report directory, in no particular order.
    pub fn entries(&self) -> Result<Vec<StoredEntry>, ReporterError> {
        let read_failed = |source| ReporterError::ReadFailed {
            path: self.directory.clone(),
            source,
        };
        let listing = std::fs::read_dir(&self.directory).map_err(read_failed)?;
        Ok(self.collect_entries(
            listing.map(|entry| entry.map(|entry| (entry.path(), entry.metadata()))),
        ))
    }

    /// Classifies listed files. Entries that cannot be read are skipped so
    /// one bad entry does not hide the rest of the directory.
    fn collect_entries(
        &self,
        listing: impl Iterator<Item = io::Result<(PathBuf, io::Result<std::fs::Metadata>)>>,
    ) -> Vec<StoredEntry> {
        let mut entries = Vec::new();
        for entry in listing {
            let (path, metadata) = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(directory = %self.directory.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let metadata = match metadata {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            entries.push(self.classify(path, &metadata));
        }
        entries
    }

    fn classify(&self, path: PathBuf, metadata: &std::fs::Metadata) -> StoredEntry {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return StoredEntry::Other(path);
        };
        if name == constants::EXCEPTION_INFO_FILENAME {
            return StoredEntry::ExceptionInfo(path);
        }
        if name.starts_with(constants::PARTIAL_WRITE_PREFIX)
            || name == format!("{}.tmp", constants::EXCEPTION_INFO_FILENAME)
        {
            return StoredEntry::PartialWrite(path);
        }
        let id = name
            .strip_suffix(constants::REPORT_FILE_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .and_then(ReportId::parse);
        match id {
            Some(id) => StoredEntry::Report(PendingReport {
                id,
                created_at: metadata.modified().unwrap_or_else(|_| SystemTime::now()),
                path,
            }),
            None => StoredEntry::Other(path),
        }
    }

    /// Removes a file from the directory. A file that is already gone counts
    /// as removed.
    pub fn remove(&self, path: &Path) -> Result<(), ReporterError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ReporterError::RemoveFailed {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Reads the exception record left by a previous run and deletes the
    /// file, whether or not it could be read.
    pub fn take_exception_info(&self) -> Option<ExceptionInfo> {
        let path = self.exception_info_path();
        let info = match ExceptionInfo::read_from(&path) {
            Ok(info) => info,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Discarding unreadable exception record");
                None
            }
        };
        if let Err(e) = self.remove(&path) {
            error!(error = %e, "Failed to remove exception record");
        }
        info
    }
}
