// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Structured model of an OS diagnostic payload.
//!
//! Only the fields the pipeline reads or enriches are modelled. Everything
//! else is kept in the `other` maps and written back unchanged, so a report
//! never loses data by going through decode and encode.

use super::ExceptionInfo;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type RawFields = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp_begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_simulated: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crash_diagnostics: Vec<CrashDiagnostic>,
    #[serde(flatten)]
    pub other: RawFields,
}

impl DiagnosticPayload {
    /// A payload produced in a simulated environment.
    ///
    /// Either the payload says so explicitly, or one of its crash diagnostics
    /// was produced on a simulator device.
    pub fn is_simulated(&self) -> bool {
        self.is_simulated == Some(true)
            || self.crash_diagnostics.iter().any(|d| {
                d.diagnostic_meta_data
                    .device_type
                    .as_deref()
                    .is_some_and(|t| t.contains("Simulator"))
            })
    }

    pub fn begin(&self) -> Option<DateTime<Utc>> {
        self.time_stamp_begin.as_deref().and_then(parse_timestamp)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.time_stamp_end.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashDiagnostic {
    #[serde(default)]
    pub call_stack_tree: CallStackTree,
    #[serde(default)]
    pub diagnostic_meta_data: CrashMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exception_info: Option<ExceptionInfo>,
    #[serde(flatten)]
    pub other: RawFields,
}

impl CrashDiagnostic {
    pub fn new(call_stack_tree: CallStackTree, diagnostic_meta_data: CrashMetadata) -> Self {
        Self {
            call_stack_tree,
            diagnostic_meta_data,
            exception_info: None,
            other: RawFields::new(),
        }
    }

    pub fn exception_info(&self) -> Option<&ExceptionInfo> {
        self.exception_info.as_ref()
    }

    /// Attaches the exception record. A diagnostic carries at most one, so
    /// this returns `false` and leaves the diagnostic alone if one is present.
    pub fn attach_exception_info(&mut self, info: ExceptionInfo) -> bool {
        if self.exception_info.is_some() {
            return false;
        }
        self.exception_info = Some(info);
        true
    }

    /// Index of the call stack attributed to the crashing thread.
    pub fn faulting_thread_index(&self) -> Option<usize> {
        self.call_stack_tree
            .call_stacks
            .iter()
            .position(|s| s.thread_attributed == Some(true))
    }

    /// Visits every frame of every thread, parents before their sub-frames.
    pub fn for_each_frame_mut(&mut self, mut f: impl FnMut(&mut Frame)) {
        fn visit(frames: &mut [Frame], f: &mut impl FnMut(&mut Frame)) {
            for frame in frames {
                f(&mut *frame);
                visit(&mut frame.sub_frames, &mut *f);
            }
        }
        for stack in &mut self.call_stack_tree.call_stacks {
            visit(&mut stack.call_stack_root_frames, &mut f);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStackTree {
    #[serde(default)]
    pub call_stack_per_thread: bool,
    #[serde(default)]
    pub call_stacks: Vec<CallStack>,
    #[serde(flatten)]
    pub other: RawFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_attributed: Option<bool>,
    #[serde(default)]
    pub call_stack_root_frames: Vec<Frame>,
    #[serde(flatten)]
    pub other: RawFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    #[serde(rename = "binaryUUID", default, skip_serializing_if = "Option::is_none")]
    pub binary_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_into_binary_text_segment: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_name: Option<String>,
    pub address: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_info: Option<SymbolInfo>,
    #[serde(flatten)]
    pub other: RawFields,
}

impl Frame {
    pub fn new(address: u64) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }
}

/// Local symbolication result attached to a frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub module_name: String,
    pub module_offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mangled_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_offset: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_build_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
    #[serde(flatten)]
    pub other: RawFields,
}

/// Parses the timestamp formats found in diagnostic payloads: RFC 3339, or
/// `YYYY-MM-DD HH:MM:SS` (optionally followed by a UTC offset) read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ts| ts.and_utc())
}
