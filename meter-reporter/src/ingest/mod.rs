// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns delivered payload batches into persisted, submitted reports.

mod source;

pub use source::*;

use crate::diagnostic::{self, DiagnosticPayload, ExceptionInfo};
use crate::store::UploadScheduler;
use crate::symbolizer::{self, ModuleEnumerator, ModuleSnapshot, SymbolResolver};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    /// Reports written and handed to the transport.
    pub persisted: usize,
    /// Of those, how many were forwarded without decoding.
    pub raw: usize,
    pub dropped_simulated: usize,
    pub write_failures: usize,
    /// Whether the exception record of the previous run was attached.
    pub correlated: bool,
}

enum Item {
    Decoded {
        payload: DiagnosticPayload,
        raw: Vec<u8>,
    },
    Raw(Vec<u8>),
}

pub struct Ingestor {
    filter_simulated: bool,
    modules: Box<dyn ModuleEnumerator>,
    resolver: Option<Box<dyn SymbolResolver>>,
    carried_exception: Option<ExceptionInfo>,
}

impl Ingestor {
    pub fn new(
        filter_simulated: bool,
        modules: Box<dyn ModuleEnumerator>,
        resolver: Option<Box<dyn SymbolResolver>>,
    ) -> Self {
        Self {
            filter_simulated,
            modules,
            resolver,
            carried_exception: None,
        }
    }

    /// Holds a record read before the startup sweep removed its file. It is
    /// offered to the next diagnostic batch only.
    pub fn carry_exception_info(&mut self, info: Option<ExceptionInfo>) {
        self.carried_exception = info;
    }

    pub fn ingest(
        &mut self,
        scheduler: &mut UploadScheduler,
        kind: PayloadKind,
        payloads: Vec<Vec<u8>>,
    ) -> IngestSummary {
        if payloads.is_empty() {
            debug!("Ignoring empty payload batch");
            return IngestSummary::default();
        }
        match kind {
            PayloadKind::Diagnostic => self.ingest_diagnostics(scheduler, payloads),
            PayloadKind::Legacy => {
                let mut summary = IngestSummary::default();
                for bytes in payloads {
                    summary.raw += 1;
                    store(scheduler, &bytes, &mut summary);
                }
                summary
            }
        }
    }

    fn ingest_diagnostics(
        &mut self,
        scheduler: &mut UploadScheduler,
        payloads: Vec<Vec<u8>>,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();
        // Consumed whatever happens below, so a record is attached at most once.
        // A record written during this session is newer than a carried one.
        let carried = self.carried_exception.take();
        let exception = scheduler.store().take_exception_info().or(carried);

        let mut items = Vec::with_capacity(payloads.len());
        for bytes in payloads {
            match diagnostic::decode(&bytes) {
                Ok(payload) if self.filter_simulated && payload.is_simulated() => {
                    info!("Skipping simulated payload");
                    summary.dropped_simulated += 1;
                }
                Ok(payload) => items.push(Item::Decoded {
                    payload,
                    raw: bytes,
                }),
                Err(e) => {
                    warn!(bytes = bytes.len(), error = %e, "Forwarding undecodable payload as-is");
                    items.push(Item::Raw(bytes));
                }
            }
        }

        let decoded = items.iter_mut().filter_map(|item| match item {
            Item::Decoded { payload, .. } => Some(payload),
            Item::Raw(_) => None,
        });
        if let Some(found) = diagnostic::correlate(decoded, exception.as_ref()) {
            info!(
                payload = found.payload_index,
                diagnostic = found.diagnostic_index,
                "Attached exception record to crash diagnostic"
            );
            summary.correlated = true;
        } else if exception.is_some() {
            debug!("Exception record did not match the last crash diagnostic");
        }

        let has_frames = items.iter().any(|item| {
            matches!(item, Item::Decoded { payload, .. } if !payload.crash_diagnostics.is_empty())
        });
        let snapshot = if has_frames {
            self.modules.snapshot()
        } else {
            ModuleSnapshot::default()
        };

        for item in items {
            let bytes = match item {
                Item::Decoded { payload, raw } => {
                    let payload =
                        symbolizer::symbolicate(payload, &snapshot, self.resolver.as_deref());
                    match diagnostic::encode(&payload) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            error!(error = %e, "Forwarding payload that could not be re-encoded");
                            summary.raw += 1;
                            raw
                        }
                    }
                }
                Item::Raw(raw) => {
                    summary.raw += 1;
                    raw
                }
            };
            store(scheduler, &bytes, &mut summary);
        }
        summary
    }
}

fn store(scheduler: &mut UploadScheduler, bytes: &[u8], summary: &mut IngestSummary) {
    match scheduler.persist_and_submit(bytes) {
        Ok(_) => summary.persisted += 1,
        Err(e) => {
            error!(error = %e, "Dropping report that could not be written");
            summary.write_failures += 1;
        }
    }
}
