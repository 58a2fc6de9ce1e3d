// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use chrono::{Duration, TimeZone, Utc};

pub trait TestInstance {
    fn test_instance(seed: u64) -> Self;
}

impl TestInstance for Frame {
    fn test_instance(seed: u64) -> Self {
        let mut frame = Frame::new(seed);
        frame.binary_name = Some("demo".to_owned());
        frame.binary_uuid = Some("9E8D8DE6-EE8E-3B4A-8A11-2C7B1A3B2F01".to_owned());
        frame.offset_into_binary_text_segment = Some(seed & 0xffff);
        frame.sample_count = Some(1);
        frame.sub_frames = vec![Frame::new(seed + 0x10_0000)];
        frame
    }
}

impl TestInstance for CrashDiagnostic {
    fn test_instance(seed: u64) -> Self {
        let call_stacks = (0..2u64)
            .map(|thread| CallStack {
                thread_attributed: Some(thread == 1),
                call_stack_root_frames: (0..3u64)
                    .map(|i| Frame::test_instance(0x1000 * seed + 0x100 * (thread * 3 + i)))
                    .collect(),
                other: RawFields::new(),
            })
            .collect();
        let tree = CallStackTree {
            call_stack_per_thread: true,
            call_stacks,
            other: RawFields::new(),
        };
        let metadata = CrashMetadata {
            app_build_version: Some(seed.to_string()),
            app_version: Some("1.0".to_owned()),
            os_version: Some("macOS 14.3 (23D56)".to_owned()),
            device_type: Some("MacBookPro18,1".to_owned()),
            platform_architecture: Some("arm64".to_owned()),
            exception_type: Some(10),
            exception_code: Some(0),
            signal: Some(6),
            termination_reason: Some("Namespace SIGNAL, Code 6 Abort trap: 6".to_owned()),
            other: RawFields::new(),
        };
        CrashDiagnostic::new(tree, metadata)
    }
}

impl TestInstance for ExceptionInfo {
    fn test_instance(seed: u64) -> Self {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        ExceptionInfo {
            name: "panic".to_owned(),
            reason: format!("boom {seed}"),
            call_stack_addresses: (0..4).map(|i| 0x4000 + seed * 0x10 + i).collect(),
            captured_at: base + Duration::minutes(seed as i64),
            thread_name: Some("main".to_owned()),
        }
    }
}

impl TestInstance for DiagnosticPayload {
    fn test_instance(seed: u64) -> Self {
        DiagnosticPayload {
            time_stamp_begin: Some("2024-03-01 00:00:00".to_owned()),
            time_stamp_end: Some("2024-03-02 00:00:00".to_owned()),
            is_simulated: None,
            crash_diagnostics: vec![CrashDiagnostic::test_instance(seed)],
            other: RawFields::new(),
        }
    }
}
