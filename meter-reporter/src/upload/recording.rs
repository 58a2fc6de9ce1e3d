// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{CompletionSender, Transport, Upload, UploadOutcome, UploadRequest};
use crate::store::ReportId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How a [`RecordingTransport`] answers submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    Deliver,
    Fail,
    /// Keep the upload in flight until [`RecordingTransport::release`].
    Hold,
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub id: ReportId,
    pub request: UploadRequest,
    /// File contents at submission time, if the file could be read.
    pub body: Option<Vec<u8>>,
}

#[derive(Debug)]
struct State {
    mode: RecordingMode,
    uploads: Vec<RecordedUpload>,
    held: Vec<CompletionSender>,
}

/// Transport that records what it is asked to send instead of sending it.
/// Useful for dry runs and for tests of code built on the reporter.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    state: Arc<Mutex<State>>,
}

impl RecordingTransport {
    pub fn new(mode: RecordingMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                mode,
                uploads: Vec::new(),
                held: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mode(&self, mode: RecordingMode) {
        self.lock().mode = mode;
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.lock().uploads.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.lock().uploads.len()
    }

    /// Completes every held upload with `outcome`. Returns how many there were.
    pub fn release(&self, outcome: UploadOutcome) -> usize {
        let held = std::mem::take(&mut self.lock().held);
        let count = held.len();
        for completion in held {
            completion.complete(outcome.clone());
        }
        count
    }
}

impl Transport for RecordingTransport {
    fn submit(&self, upload: Upload, completion: CompletionSender) {
        let body = std::fs::read(&upload.path).ok();
        let mut state = self.lock();
        state.uploads.push(RecordedUpload {
            id: upload.id,
            request: upload.request,
            body,
        });
        match state.mode {
            RecordingMode::Hold => state.held.push(completion),
            RecordingMode::Deliver => {
                drop(state);
                completion.complete(UploadOutcome::Delivered);
            }
            RecordingMode::Fail => {
                drop(state);
                completion.complete(UploadOutcome::Failed("recording transport".to_owned()));
            }
        }
    }
}
