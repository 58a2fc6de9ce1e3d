// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::worker::ReporterActions;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What the platform can deliver, resolved once when the reporter starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSourceKind {
    /// Structured JSON diagnostic payloads.
    Diagnostic,
    /// Opaque payloads, uploaded as delivered.
    Legacy,
    Unavailable,
}

impl PayloadSourceKind {
    pub fn payload_kind(self) -> Option<PayloadKind> {
        match self {
            PayloadSourceKind::Diagnostic => Some(PayloadKind::Diagnostic),
            PayloadSourceKind::Legacy => Some(PayloadKind::Legacy),
            PayloadSourceKind::Unavailable => None,
        }
    }
}

/// Selects the ingestion path of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Diagnostic,
    Legacy,
}

/// The OS facility that hands diagnostic payloads to the process.
pub trait PayloadSource: Send {
    fn kind(&self) -> PayloadSourceKind;

    /// Starts delivery into `sink`. Called once, after the startup sweep,
    /// and never for an `Unavailable` source.
    fn start(self: Box<Self>, sink: PayloadSink);
}

/// Forwards batches from any thread to the reporter that owns them.
#[derive(Debug, Clone)]
pub struct PayloadSink {
    sender: mpsc::Sender<ReporterActions>,
    kind: PayloadKind,
}

impl PayloadSink {
    pub(crate) fn new(sender: mpsc::Sender<ReporterActions>, kind: PayloadKind) -> Self {
        Self { sender, kind }
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Queues a batch without blocking. Returns `false` if the reporter is
    /// gone or its mailbox is full, in which case the batch is dropped.
    pub fn deliver(&self, payloads: Vec<Vec<u8>>) -> bool {
        if payloads.is_empty() {
            debug!("Ignoring empty payload batch");
            return true;
        }
        let count = payloads.len();
        match self.sender.try_send(ReporterActions::ReceivePayloads {
            kind: self.kind,
            payloads,
        }) {
            Ok(()) => true,
            Err(e) => {
                warn!(payloads = count, error = %e, "Dropping payload batch");
                false
            }
        }
    }
}

/// Delivers the contents of a fixed list of files as a single batch.
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
    kind: PayloadKind,
}

impl FileSource {
    pub fn new(paths: Vec<PathBuf>, kind: PayloadKind) -> Self {
        Self { paths, kind }
    }
}

impl PayloadSource for FileSource {
    fn kind(&self) -> PayloadSourceKind {
        match self.kind {
            PayloadKind::Diagnostic => PayloadSourceKind::Diagnostic,
            PayloadKind::Legacy => PayloadSourceKind::Legacy,
        }
    }

    fn start(self: Box<Self>, sink: PayloadSink) {
        let payloads = self
            .paths
            .iter()
            .filter_map(|path| match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable payload file");
                    None
                }
            })
            .collect();
        sink.deliver(payloads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_selects_path() {
        assert_eq!(
            PayloadSourceKind::Diagnostic.payload_kind(),
            Some(PayloadKind::Diagnostic)
        );
        assert_eq!(
            PayloadSourceKind::Legacy.payload_kind(),
            Some(PayloadKind::Legacy)
        );
        assert_eq!(PayloadSourceKind::Unavailable.payload_kind(), None);
    }

    #[test]
    fn sink_queues_non_empty_batches() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = PayloadSink::new(tx, PayloadKind::Legacy);
        assert!(sink.deliver(Vec::new()));
        assert!(rx.try_recv().is_err());

        assert!(sink.deliver(vec![b"a".to_vec()]));
        // mailbox of one is now full
        assert!(!sink.deliver(vec![b"b".to_vec()]));
        match rx.try_recv().unwrap() {
            ReporterActions::ReceivePayloads { kind, payloads } => {
                assert_eq!(kind, PayloadKind::Legacy);
                assert_eq!(payloads, vec![b"a".to_vec()]);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn file_source_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, b"{}").unwrap();
        let source = Box::new(FileSource::new(
            vec![good, dir.path().join("missing.json")],
            PayloadKind::Diagnostic,
        ));
        assert_eq!(source.kind(), PayloadSourceKind::Diagnostic);

        let (tx, mut rx) = mpsc::channel(4);
        source.start(PayloadSink::new(tx, PayloadKind::Diagnostic));
        match rx.try_recv().unwrap() {
            ReporterActions::ReceivePayloads { payloads, .. } => {
                assert_eq!(payloads, vec![b"{}".to_vec()])
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
