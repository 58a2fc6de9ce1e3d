// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Local symbolication of crash diagnostic frames.

mod modules;

pub use modules::*;

use crate::diagnostic::{DiagnosticPayload, SymbolInfo};
use symbolic_common::Name;
use symbolic_demangle::{Demangle, DemangleOptions};
#[cfg(unix)]
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// Raw, possibly mangled, symbol name.
    pub name: String,
    pub address: Option<u64>,
}

/// Resolves an address to the symbol containing it.
pub trait SymbolResolver: Send + Sync {
    fn resolve(&self, address: u64) -> Option<ResolvedSymbol>;
}

/// Resolves addresses against the debug info of the running process.
///
/// Only useful when the payload addresses share this process's load
/// addresses, which is why it is not enabled by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct InProcessResolver;

#[cfg(unix)]
impl SymbolResolver for InProcessResolver {
    fn resolve(&self, address: u64) -> Option<ResolvedSymbol> {
        use blazesym::symbolize::source::{Process, Source};
        use blazesym::symbolize::{Input, Symbolized, Symbolizer};

        thread_local! {
            static SYMBOLIZER: Symbolizer = Symbolizer::new();
        }

        let mut process = Process::new(std::process::id().into());
        // https://github.com/libbpf/blazesym/issues/518
        process.map_files = false;
        let src = Source::Process(process);
        SYMBOLIZER.with(
            |symbolizer| match symbolizer.symbolize_single(&src, Input::AbsAddr(address)) {
                Ok(Symbolized::Sym(s)) => Some(ResolvedSymbol {
                    name: s.name.into_owned(),
                    address: Some(s.addr),
                }),
                Ok(Symbolized::Unknown(reason)) => {
                    debug!(address, %reason, "Address not symbolized");
                    None
                }
                Err(e) => {
                    debug!(address, error = %e, "Symbolization failed");
                    None
                }
            },
        )
    }
}

#[cfg(not(unix))]
impl SymbolResolver for InProcessResolver {
    fn resolve(&self, address: u64) -> Option<ResolvedSymbol> {
        let mut resolved = None;
        backtrace::resolve(address as usize as *mut std::ffi::c_void, |symbol| {
            if resolved.is_some() {
                return;
            }
            if let Some(name) = symbol.name() {
                resolved = Some(ResolvedSymbol {
                    name: String::from_utf8_lossy(name.as_bytes()).into_owned(),
                    address: symbol.addr().map(|a| a as usize as u64),
                });
            }
        });
        resolved
    }
}

/// Attaches module name and offset, plus a symbol name when `resolver` knows
/// one, to every frame of every crash diagnostic. Frames outside the known
/// modules are left as they are.
pub fn symbolicate(
    mut payload: DiagnosticPayload,
    snapshot: &ModuleSnapshot,
    resolver: Option<&dyn SymbolResolver>,
) -> DiagnosticPayload {
    if snapshot.is_empty() {
        return payload;
    }
    for diagnostic in &mut payload.crash_diagnostics {
        diagnostic.for_each_frame_mut(|frame| {
            if let Some(info) = symbolicate_address(frame.address, snapshot, resolver) {
                frame.symbol_info = Some(info);
            }
        });
    }
    payload
}

pub fn symbolicate_address(
    address: u64,
    snapshot: &ModuleSnapshot,
    resolver: Option<&dyn SymbolResolver>,
) -> Option<SymbolInfo> {
    let module = snapshot.find(address)?;
    let mut info = SymbolInfo {
        module_name: module.name.clone(),
        module_offset: address - module.base_address,
        ..Default::default()
    };
    if let Some(symbol) = resolver.and_then(|r| r.resolve(address)) {
        let (name, mangled) = demangle(symbol.name);
        info.symbol = Some(name);
        info.mangled_symbol = mangled;
        info.symbol_offset = symbol
            .address
            .and_then(|start| address.checked_sub(start));
    }
    Some(info)
}

/// Returns `(display name, mangled name if it differs)`.
fn demangle(name: String) -> (String, Option<String>) {
    match Name::from(&name).demangle(DemangleOptions::name_only()) {
        Some(demangled) if demangled != name => (demangled, Some(name)),
        _ => (name, None),
    }
}
