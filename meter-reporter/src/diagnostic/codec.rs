// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::DiagnosticPayload;
use crate::ReporterError;

/// Parses a JSON diagnostic payload.
///
/// Anything that is not a JSON object with the expected shape is a
/// [`ReporterError::MalformedPayload`]; callers then forward the bytes as-is.
pub fn decode(bytes: &[u8]) -> Result<DiagnosticPayload, ReporterError> {
    serde_json::from_slice(bytes).map_err(ReporterError::MalformedPayload)
}

/// Canonical JSON for `payload`.
///
/// Modelled fields are written in declaration order and unmodelled ones in
/// key order, with absent optional fields omitted. The output for a given
/// payload is always the same bytes.
pub fn encode(payload: &DiagnosticPayload) -> Result<Vec<u8>, ReporterError> {
    serde_json::to_vec(payload).map_err(ReporterError::EncodeFailed)
}
