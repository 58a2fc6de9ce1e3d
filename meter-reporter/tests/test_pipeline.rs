// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

#[cfg(test)]
mod pipeline_tests {
    use super::common::*;
    use meter_reporter::upload::{RecordingMode, RecordingTransport, UploadOutcome};
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn simulated_payloads_are_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let transport = RecordingTransport::new(RecordingMode::Hold);
        let (handle, join) = recording_reporter(dir.path(), &transport).spawn().unwrap();

        handle
            .receive_payloads(vec![
                crash_payload("iPhone Simulator", None),
                crash_payload("MacBookPro18,1", Some(true)),
                crash_payload("MacBookPro18,1", None),
            ])
            .unwrap();
        handle.sweep().unwrap();
        while transport.upload_count() == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(report_files(dir.path()).len(), 1);
        // The sweep found the report in flight and did not submit it again.
        assert_eq!(transport.upload_count(), 1);
        assert_eq!(transport.release(UploadOutcome::Delivered), 1);
        handle.flush().await.unwrap();
        assert!(report_files(dir.path()).is_empty());

        handle.stop().await.unwrap();
        join.await.unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn previous_panic_is_attached_to_crash() {
        let dir = tempfile::tempdir().unwrap();
        write_exception_info(dir.path(), "index out of bounds at src/main.rs:3:5");
        let transport = RecordingTransport::new(RecordingMode::Deliver);
        let (handle, join) = recording_reporter(dir.path(), &transport).spawn().unwrap();

        assert!(!dir.path().join("exception_info.json").exists());
        handle
            .receive_payloads(vec![crash_payload("MacBookPro18,1", None)])
            .unwrap();
        handle.flush().await.unwrap();

        let uploads = transport.uploads();
        assert_eq!(uploads.len(), 1);
        let body = String::from_utf8(uploads[0].body.clone().unwrap()).unwrap();
        assert!(body.contains("index out of bounds at src/main.rs:3:5"));
        assert!(body.contains("\"vendorExtension\":{\"retained\":true}"));
        assert!(!dir.path().join("exception_info.json").exists());

        handle.stop().await.unwrap();
        join.await.unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn exception_info_is_consumed_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let transport = RecordingTransport::new(RecordingMode::Deliver);
        let (handle, join) = recording_reporter(dir.path(), &transport).spawn().unwrap();

        for pass in 0..3 {
            write_exception_info(dir.path(), &format!("failure number {pass}"));
            handle
                .receive_payloads(vec![
                    crash_payload("MacBookPro18,1", None),
                    crash_payload("MacBookPro18,1", None),
                ])
                .unwrap();
            handle.flush().await.unwrap();
            assert!(!dir.path().join("exception_info.json").exists());
        }

        let bodies: Vec<String> = transport
            .uploads()
            .into_iter()
            .map(|u| String::from_utf8(u.body.unwrap()).unwrap())
            .collect();
        assert_eq!(bodies.len(), 6);
        for pass in 0..3 {
            let reason = format!("failure number {pass}");
            assert_eq!(bodies.iter().filter(|b| b.contains(&reason)).count(), 1);
        }

        handle.stop().await.unwrap();
        join.await.unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn startup_sweep_expires_and_resubmits() {
        let dir = tempfile::tempdir().unwrap();
        let old = leftover_report(dir.path(), "0000000000000000000000000000000a", 8 * DAY);
        leftover_report(dir.path(), "0000000000000000000000000000000b", DAY);
        leftover_report(dir.path(), "0000000000000000000000000000000c", Duration::ZERO);
        std::fs::write(dir.path().join(".partial-abc.tmp"), b"{").unwrap();

        let transport = RecordingTransport::new(RecordingMode::Fail);
        let (handle, join) = recording_reporter(dir.path(), &transport).spawn().unwrap();
        handle.flush().await.unwrap();

        assert!(!old.exists());
        assert!(!dir.path().join(".partial-abc.tmp").exists());
        assert_eq!(transport.upload_count(), 2);
        // Failed uploads stay on disk for the next sweep.
        assert_eq!(report_files(dir.path()).len(), 2);

        let mut ids: Vec<_> = transport
            .uploads()
            .iter()
            .map(|u| {
                u.request
                    .header("MeterReporter-Report-Id")
                    .unwrap()
                    .to_owned()
            })
            .collect();
        ids.sort();
        assert_eq!(
            ids,
            [
                "0000000000000000000000000000000b",
                "0000000000000000000000000000000c"
            ]
        );

        handle.stop().await.unwrap();
        join.await.unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn restart_delivers_what_the_previous_run_left() {
        let dir = tempfile::tempdir().unwrap();

        let failing = RecordingTransport::new(RecordingMode::Fail);
        let (handle, join) = recording_reporter(dir.path(), &failing).spawn().unwrap();
        handle
            .receive_payloads(vec![crash_payload("MacBookPro18,1", None)])
            .unwrap();
        handle
            .receive_legacy_payloads(vec![b"opaque".to_vec()])
            .unwrap();
        handle.flush().await.unwrap();
        handle.stop().await.unwrap();
        join.await.unwrap();
        assert_eq!(report_files(dir.path()).len(), 2);

        let delivering = RecordingTransport::new(RecordingMode::Deliver);
        let (handle, join) = recording_reporter(dir.path(), &delivering).spawn().unwrap();
        handle.flush().await.unwrap();
        assert_eq!(delivering.upload_count(), 2);
        assert!(report_files(dir.path()).is_empty());

        // A second sweep finds nothing left to do.
        handle.sweep().unwrap();
        handle.flush().await.unwrap();
        assert_eq!(delivering.upload_count(), 2);

        handle.stop().await.unwrap();
        join.await.unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn undecodable_payloads_are_uploaded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let transport = RecordingTransport::new(RecordingMode::Deliver);
        let (handle, join) = recording_reporter(dir.path(), &transport).spawn().unwrap();

        handle
            .receive_payloads(vec![b"{\"crashDiagnostics\": 3".to_vec()])
            .unwrap();
        handle.flush().await.unwrap();
        assert_eq!(
            transport.uploads()[0].body.as_deref(),
            Some(&b"{\"crashDiagnostics\": 3"[..])
        );

        handle.stop().await.unwrap();
        join.await.unwrap();
    }
}
