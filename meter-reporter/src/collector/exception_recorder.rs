// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::diagnostic::ExceptionInfo;
use std::any::Any;
use std::panic::{self, PanicHookInfo};
use std::path::PathBuf;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering::SeqCst};
use std::sync::OnceLock;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync>;

static RECORDER: OnceLock<ExceptionRecorder> = OnceLock::new();

/// The process-wide panic hook. At most one exists per process.
pub struct ExceptionRecorder {
    previous_hook: PanicHook,
    destination: AtomicPtr<PathBuf>,
}

impl ExceptionRecorder {
    fn on_panic(&self, panic_info: &PanicHookInfo<'_>) {
        let path = self.destination.load(SeqCst);
        if !path.is_null() {
            // Safety: the pointer comes from Box::into_raw in set_destination
            // and is never freed.
            let path = unsafe { &*path };
            // Best effort; the previous hook must run regardless.
            let _ = exception_info_from_panic(panic_info).write_to(path);
        }
        (self.previous_hook)(panic_info);
    }
}

/// Installs the recorder as the panic hook, chaining to the hook that was
/// installed before. Returns `false` if a recorder was already installed.
///
/// PRECONDITIONS:
///     Not called while the current thread is panicking.
/// SAFETY:
///     Hooks installed later by other code replace this one; they are
///     responsible for chaining to it.
/// ATOMICITY:
///     The recorder is created at most once. A concurrent caller that loses
///     the race returns `false` possibly before the hook is set.
pub fn install() -> anyhow::Result<bool> {
    if std::thread::panicking() {
        anyhow::bail!("cannot install the exception recorder while panicking");
    }
    let mut installed = false;
    RECORDER.get_or_init(|| {
        installed = true;
        ExceptionRecorder {
            previous_hook: panic::take_hook(),
            destination: AtomicPtr::new(ptr::null_mut()),
        }
    });
    if installed {
        panic::set_hook(Box::new(|panic_info| {
            if let Some(recorder) = RECORDER.get() {
                recorder.on_panic(panic_info);
            }
        }));
    }
    Ok(installed)
}

pub fn is_installed() -> bool {
    RECORDER.get().is_some()
}

/// Points the recorder at the file a panic is written to. With `None` the
/// hook only chains. Returns `false` if no recorder is installed.
///
/// PRECONDITIONS:
///     None
/// SAFETY:
///     The replaced path is leaked, since a panicking thread may still be
///     reading it.
/// ATOMICITY:
///     This function uses a swap on an atomic pointer.
pub fn set_destination(path: Option<PathBuf>) -> bool {
    let Some(recorder) = RECORDER.get() else {
        return false;
    };
    let new = path.map_or(ptr::null_mut(), |p| Box::into_raw(Box::new(p)));
    recorder.destination.swap(new, SeqCst);
    true
}

pub fn destination() -> Option<PathBuf> {
    let path = RECORDER.get()?.destination.load(SeqCst);
    if path.is_null() {
        return None;
    }
    // Safety: see set_destination.
    Some(unsafe { (*path).clone() })
}

/// Builds the record written for `panic_info`, including the return
/// addresses of the panicking thread.
pub fn exception_info_from_panic(panic_info: &PanicHookInfo<'_>) -> ExceptionInfo {
    let mut reason = panic_message(panic_info.payload());
    if let Some(location) = panic_info.location() {
        reason = format!(
            "{reason} at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }

    let mut addresses = Vec::new();
    backtrace::trace(|frame| {
        addresses.push(frame.ip() as usize as u64);
        true
    });

    let mut info = ExceptionInfo::new("panic".to_owned(), reason, addresses);
    info.thread_name = std::thread::current().name().map(str::to_owned);
    info
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}
