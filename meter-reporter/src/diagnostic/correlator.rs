// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{DiagnosticPayload, ExceptionInfo};

/// Where an exception record was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationMatch {
    /// Position of the payload among those passed to [`correlate`].
    pub payload_index: usize,
    pub diagnostic_index: usize,
}

/// Finds the chronologically last crash diagnostic in a batch.
///
/// Payloads are ordered by their end timestamp. A payload whose timestamp is
/// missing or unparseable sorts before every dated one. Equal timestamps keep
/// batch order, so the later payload wins, and within a payload the last
/// diagnostic wins.
pub fn last_crash_diagnostic<'a>(
    payloads: impl IntoIterator<Item = &'a DiagnosticPayload>,
) -> Option<(usize, usize)> {
    payloads
        .into_iter()
        .enumerate()
        .filter(|(_, p)| !p.crash_diagnostics.is_empty())
        // max_by_key returns the last of several equal maxima.
        .max_by_key(|(_, p)| p.end())
        .map(|(i, p)| (i, p.crash_diagnostics.len() - 1))
}

/// Attaches `exception` to the last crash diagnostic of the batch when the
/// two are consistent. Every other diagnostic is left untouched.
pub fn correlate<'a>(
    payloads: impl IntoIterator<Item = &'a mut DiagnosticPayload>,
    exception: Option<&ExceptionInfo>,
) -> Option<CorrelationMatch> {
    let exception = exception?;
    let mut payloads: Vec<&mut DiagnosticPayload> = payloads.into_iter().collect();
    let (payload_index, diagnostic_index) =
        last_crash_diagnostic(payloads.iter().map(|p| &**p))?;

    let payload = &mut payloads[payload_index];
    let (begin, end) = (payload.begin(), payload.end());
    let diagnostic = &mut payload.crash_diagnostics[diagnostic_index];
    if !exception.matches_crash_diagnostic(diagnostic, begin, end) {
        return None;
    }
    diagnostic
        .attach_exception_info(exception.clone())
        .then_some(CorrelationMatch {
            payload_index,
            diagnostic_index,
        })
}
