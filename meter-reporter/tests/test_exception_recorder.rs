// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

// The recorder is process-wide, so everything lives in a single test.
#[cfg(all(test, feature = "collector"))]
mod exception_recorder_tests {
    use meter_reporter::collector;
    use meter_reporter::diagnostic::ExceptionInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[cfg_attr(miri, ignore)]
    #[test]
    fn records_panics_and_chains() {
        let previous_calls = Arc::new(AtomicUsize::new(0));
        let counter = previous_calls.clone();
        std::panic::set_hook(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!collector::is_installed());
        assert!(collector::install().unwrap());
        assert!(!collector::install().unwrap());
        assert!(collector::is_installed());

        // Without a destination the hook only chains.
        let _ = std::panic::catch_unwind(|| panic!("before destination"));
        assert_eq!(previous_calls.load(Ordering::SeqCst), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exception_info.json");
        assert!(collector::set_destination(Some(path.clone())));
        assert_eq!(collector::destination(), Some(path.clone()));

        let result = std::thread::Builder::new()
            .name("worker-7".to_owned())
            .spawn(|| {
                let values: Vec<u32> = Vec::new();
                if values.is_empty() {
                    panic!("no values for {}", "worker-7");
                }
            })
            .unwrap()
            .join();
        assert!(result.is_err());
        assert_eq!(previous_calls.load(Ordering::SeqCst), 2);

        let info = ExceptionInfo::read_from(&path).unwrap().unwrap();
        assert_eq!(info.name, "panic");
        assert!(info.reason.starts_with("no values for worker-7 at "));
        assert!(info.reason.contains("test_exception_recorder.rs"));
        assert_eq!(info.thread_name.as_deref(), Some("worker-7"));
        assert!(!info.call_stack_addresses.is_empty());

        // A later panic replaces the record.
        let _ = std::panic::catch_unwind(|| panic!("second"));
        let info = ExceptionInfo::read_from(&path).unwrap().unwrap();
        assert!(info.reason.starts_with("second at "));

        assert!(collector::set_destination(None));
        assert_eq!(collector::destination(), None);
    }
}
