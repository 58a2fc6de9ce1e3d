// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Extension of every persisted report: `{id}.mxdiagnostic`.
pub const REPORT_FILE_EXTENSION: &str = "mxdiagnostic";
/// Reserved file written by the panic hook, next to the reports.
pub const EXCEPTION_INFO_FILENAME: &str = "exception_info.json";
/// Prefix of in-progress atomic writes. Leftovers are removed by the sweep.
pub const PARTIAL_WRITE_PREFIX: &str = ".partial-";
pub const DEFAULT_REPORTS_DIR_NAME: &str = "MeterReporter";

pub const REPORT_ID_HEADER: &str = "MeterReporter-Report-Id";
pub const PLATFORM_HEADER: &str = "MeterReporter-Platform";
pub const HOST_ID_HEADER: &str = "MeterReporter-Host-Id";
pub const REPORT_CONTENT_TYPE: &str = "application/vnd.chimehq-mxdiagnostic";

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

pub const MAILBOX_CAPACITY: usize = 1000;

/// Mach exception type reported for abnormal termination.
pub const EXC_CRASH: i64 = 10;
pub const SIGABRT: i64 = 6;
/// Payload windows are reported with minute granularity.
pub const CAPTURE_WINDOW_SLACK: Duration = Duration::from_secs(60);
