// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{PendingReport, ReportId, ReportStore, StoredEntry};
use crate::shared::configuration::ReporterConfiguration;
use crate::upload::{
    CompletionSender, Transport, Upload, UploadCompletion, UploadOutcome, UploadRequest,
};
use crate::ReporterError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Lifecycle of a report file.
///
/// `Pending -> Submitted -> Delivered | Retry`, and `Pending -> Expired`.
/// `Retry` leaves the file in place, so the report is `Pending` again for the
/// next sweep. There is no terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    Pending,
    Submitted,
    Delivered,
    Expired,
    Retry,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub expired: usize,
    pub resubmitted: usize,
    /// Reports skipped because they were already being uploaded.
    pub in_flight: usize,
    pub removed_exception_info: bool,
    pub removed_partial_writes: usize,
    pub failed_removals: usize,
}

/// `created_at` is expired when strictly older than `now - retention`.
pub fn is_expired(created_at: SystemTime, now: SystemTime, retention: Duration) -> bool {
    match now.checked_sub(retention) {
        Some(cutoff) => created_at < cutoff,
        None => false,
    }
}

/// Hands report files to the transport and reacts to upload completions.
///
/// Must be driven from a single owner: completions come back on the channel
/// given to [`UploadScheduler::new`] and are applied with
/// [`UploadScheduler::handle_completion`].
pub struct UploadScheduler {
    store: ReportStore,
    config: ReporterConfiguration,
    transport: Arc<dyn Transport>,
    in_flight: HashMap<ReportId, PathBuf>,
    completions: mpsc::UnboundedSender<UploadCompletion>,
}

impl UploadScheduler {
    pub fn new(
        config: ReporterConfiguration,
        transport: Arc<dyn Transport>,
        completions: mpsc::UnboundedSender<UploadCompletion>,
    ) -> Self {
        Self {
            store: ReportStore::new(config.reports_dir()),
            config,
            transport,
            in_flight: HashMap::new(),
            completions,
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, id: &ReportId) -> bool {
        self.in_flight.contains_key(id)
    }

    /// Hands the file to the transport unless this id is already in flight.
    /// Returns the state of the report afterwards.
    pub fn submit(&mut self, id: ReportId, path: PathBuf, request: UploadRequest) -> ReportState {
        if self.in_flight.contains_key(&id) {
            debug!(report.id = %id, "Report already in flight");
            return ReportState::Submitted;
        }
        self.in_flight.insert(id.clone(), path.clone());
        debug!(report.id = %id, path = %path.display(), "Submitting report");
        let completion = CompletionSender::new(id.clone(), self.completions.clone());
        self.transport.submit(Upload { id, path, request }, completion);
        ReportState::Submitted
    }

    pub fn submit_report(&mut self, report: &PendingReport) -> ReportState {
        let request = UploadRequest::for_report(&self.config, &report.id);
        self.submit(report.id.clone(), report.path.clone(), request)
    }

    pub fn persist_and_submit(&mut self, bytes: &[u8]) -> Result<ReportId, ReporterError> {
        let report = self.store.persist(bytes)?;
        self.submit_report(&report);
        Ok(report.id)
    }

    /// Applies an upload outcome. The file is removed only on delivery.
    pub fn handle_completion(&mut self, completion: UploadCompletion) -> ReportState {
        let UploadCompletion { id, outcome } = completion;
        let Some(path) = self.in_flight.remove(&id) else {
            debug!(report.id = %id, "Ignoring completion for unknown report");
            return ReportState::Pending;
        };
        match outcome {
            UploadOutcome::Delivered => {
                if let Err(e) = self.store.remove(&path) {
                    // Delivered again after the next sweep; the server sees the same id.
                    error!(report.id = %id, error = %e, "Failed to remove delivered report");
                }
                info!(report.id = %id, "Report delivered");
                ReportState::Delivered
            }
            UploadOutcome::Failed(reason) => {
                warn!(report.id = %id, reason = %reason, "Report upload failed, will retry");
                ReportState::Retry
            }
        }
    }

    /// Startup pass over the report directory.
    ///
    /// The exception record and partial writes are deleted, expired reports
    /// are deleted and every other report is submitted again.
    pub fn sweep_on_startup(&mut self, now: SystemTime) -> Result<SweepSummary, ReporterError> {
        self.sweep(now, true)
    }

    /// Expires and resubmits reports without touching the exception record.
    pub fn resubmit_pending(&mut self, now: SystemTime) -> Result<SweepSummary, ReporterError> {
        self.sweep(now, false)
    }

    fn sweep(
        &mut self,
        now: SystemTime,
        remove_exception_info: bool,
    ) -> Result<SweepSummary, ReporterError> {
        let mut summary = SweepSummary::default();
        let retention = self.config.retention();

        for entry in self.store.entries()? {
            match entry {
                StoredEntry::ExceptionInfo(path) if remove_exception_info => {
                    info!(path = %path.display(), "Removing existing exception record");
                    match self.store.remove(&path) {
                        Ok(()) => summary.removed_exception_info = true,
                        Err(e) => {
                            error!(error = %e, "Failed to remove exception record");
                            summary.failed_removals += 1;
                        }
                    }
                }
                StoredEntry::ExceptionInfo(_) => {}
                StoredEntry::PartialWrite(path) => match self.store.remove(&path) {
                    Ok(()) => summary.removed_partial_writes += 1,
                    Err(e) => {
                        error!(error = %e, "Failed to remove partial write");
                        summary.failed_removals += 1;
                    }
                },
                StoredEntry::Report(report) if self.is_in_flight(&report.id) => {
                    summary.in_flight += 1;
                }
                StoredEntry::Report(report) if is_expired(report.created_at, now, retention) => {
                    info!(report.id = %report.id, "Removing expired report");
                    match self.store.remove(&report.path) {
                        Ok(()) => summary.expired += 1,
                        Err(e) => {
                            error!(report.id = %report.id, error = %e, "Failed to remove expired report");
                            summary.failed_removals += 1;
                        }
                    }
                }
                StoredEntry::Report(report) => {
                    debug!(report.id = %report.id, "Resubmitting existing report");
                    self.submit_report(&report);
                    summary.resubmitted += 1;
                }
                StoredEntry::Other(path) => {
                    debug!(path = %path.display(), "Ignoring unknown file in report directory");
                }
            }
        }

        info!(
            expired = summary.expired,
            resubmitted = summary.resubmitted,
            in_flight = summary.in_flight,
            "Swept report directory"
        );
        Ok(summary)
    }
}
