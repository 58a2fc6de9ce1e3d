// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use meter_reporter::shared::configuration::ReporterConfiguration;
use meter_reporter::symbolizer::NoModules;
use meter_reporter::upload::RecordingTransport;
use meter_reporter::ReporterBuilder;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn config(reports_dir: &Path, endpoint: &str) -> ReporterConfiguration {
    let mut config = ReporterConfiguration::for_endpoint(endpoint).unwrap();
    config.set_reports_dir(reports_dir.to_path_buf());
    config
}

pub fn recording_reporter(reports_dir: &Path, transport: &RecordingTransport) -> ReporterBuilder {
    ReporterBuilder::new(config(reports_dir, "https://reports.example.com/v1/report"))
        .transport(Arc::new(transport.clone()))
        .module_enumerator(Box::new(NoModules))
        .install_exception_recorder(false)
}

/// A payload holding one abort crash, delivered for 2024-03-01.
pub fn crash_payload(device_type: &str, simulated: Option<bool>) -> Vec<u8> {
    let mut payload = json!({
        "timeStampBegin": "2024-03-01 00:00:00",
        "timeStampEnd": "2024-03-02 00:00:00",
        "crashDiagnostics": [{
            "callStackTree": {
                "callStackPerThread": true,
                "callStacks": [{
                    "threadAttributed": true,
                    "callStackRootFrames": [{
                        "binaryUUID": "9E8D8DE6-EE8E-3B4A-8A11-2C7B1A3B2F01",
                        "offsetIntoBinaryTextSegment": 4096,
                        "sampleCount": 1,
                        "binaryName": "demo",
                        "address": 4_295_000_000u64,
                        "subFrames": [{ "address": 4_295_000_100u64 }]
                    }]
                }]
            },
            "diagnosticMetaData": {
                "appBuildVersion": "1",
                "appVersion": "1.0",
                "deviceType": device_type,
                "exceptionType": 10,
                "signal": 6,
                "terminationReason": "Namespace SIGNAL, Code 6 Abort trap: 6"
            }
        }],
        "vendorExtension": { "retained": true }
    });
    if let Some(simulated) = simulated {
        payload["isSimulated"] = json!(simulated);
    }
    serde_json::to_vec(&payload).unwrap()
}

/// The file the panic hook writes, as left behind by a run that aborted on
/// 2024-03-01.
pub fn write_exception_info(reports_dir: &Path, reason: &str) {
    std::fs::create_dir_all(reports_dir).unwrap();
    let info = json!({
        "name": "panic",
        "reason": reason,
        "callStackAddresses": [4_295_000_000u64, 4_295_000_100u64],
        "capturedAt": "2024-03-01T12:00:00Z",
        "threadName": "main"
    });
    std::fs::write(
        reports_dir.join("exception_info.json"),
        serde_json::to_vec(&info).unwrap(),
    )
    .unwrap();
}

pub fn report_files(reports_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(reports_dir) else {
        return Vec::new();
    };
    let mut files: Vec<_> = entries
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|x| x == "mxdiagnostic"))
        .collect();
    files.sort();
    files
}

/// Writes a report file as a previous run would have, aged by `age`.
pub fn leftover_report(reports_dir: &Path, id: &str, age: std::time::Duration) -> PathBuf {
    std::fs::create_dir_all(reports_dir).unwrap();
    let path = reports_dir.join(format!("{id}.mxdiagnostic"));
    std::fs::write(&path, b"{}").unwrap();
    let mtime = std::time::SystemTime::now() - age;
    filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(mtime)).unwrap();
    path
}
