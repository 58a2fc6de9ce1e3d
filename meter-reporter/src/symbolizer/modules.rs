// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One loaded image: `[base_address, base_address + size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub path: Option<PathBuf>,
    pub base_address: u64,
    pub size: u64,
}

impl Module {
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base_address && address - self.base_address < self.size
    }
}

/// Point-in-time view of the loaded images, sorted by base address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSnapshot {
    modules: Vec<Module>,
}

impl ModuleSnapshot {
    pub fn new(mut modules: Vec<Module>) -> Self {
        modules.retain(|m| m.size > 0);
        modules.sort_by_key(|m| m.base_address);
        Self { modules }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn find(&self, address: u64) -> Option<&Module> {
        let idx = self
            .modules
            .partition_point(|m| m.base_address <= address);
        let candidate = self.modules.get(idx.checked_sub(1)?)?;
        candidate.contains(address).then_some(candidate)
    }
}

/// Source of module snapshots, queried once per ingested batch.
pub trait ModuleEnumerator: Send + Sync {
    fn snapshot(&self) -> ModuleSnapshot;
}

/// For platforms where the loaded images cannot be listed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModules;

impl ModuleEnumerator for NoModules {
    fn snapshot(&self) -> ModuleSnapshot {
        ModuleSnapshot::default()
    }
}

/// Reads the module list from a `/proc/<pid>/maps` style file.
#[derive(Debug, Clone)]
pub struct ProcMapsEnumerator {
    maps_path: PathBuf,
}

impl ProcMapsEnumerator {
    pub fn new(maps_path: impl Into<PathBuf>) -> Self {
        Self {
            maps_path: maps_path.into(),
        }
    }

    pub fn this_process() -> Self {
        Self::new("/proc/self/maps")
    }
}

impl ModuleEnumerator for ProcMapsEnumerator {
    fn snapshot(&self) -> ModuleSnapshot {
        match std::fs::read_to_string(&self.maps_path) {
            Ok(text) => parse_proc_maps(&text),
            Err(e) => {
                warn!(path = %self.maps_path.display(), error = %e, "Unable to read module map");
                ModuleSnapshot::default()
            }
        }
    }
}

pub fn default_module_enumerator() -> Box<dyn ModuleEnumerator> {
    if cfg!(target_os = "linux") {
        Box::new(ProcMapsEnumerator::this_process())
    } else {
        Box::new(NoModules)
    }
}

const DELETED_SUFFIX: &str = " (deleted)";

/// Every file-backed mapping becomes part of one module spanning from the
/// lowest start to the highest end address seen for that path.
pub fn parse_proc_maps(text: &str) -> ModuleSnapshot {
    let mut ranges: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for line in text.lines() {
        // range, perms, offset, dev, inode; the path is the rest of the line
        let mut rest = line;
        let mut fields = [""; 5];
        for field in &mut fields {
            let trimmed = rest.trim_start();
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            *field = &trimmed[..end];
            rest = &trimmed[end..];
        }
        let range = fields[0];
        let path = rest.trim_start();
        let path = path.strip_suffix(DELETED_SUFFIX).unwrap_or(path);
        if !path.starts_with('/') {
            continue;
        }
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            u64::from_str_radix(start, 16),
            u64::from_str_radix(end, 16),
        ) else {
            continue;
        };
        let entry = ranges.entry(path).or_insert((start, end));
        entry.0 = entry.0.min(start);
        entry.1 = entry.1.max(end);
    }

    ModuleSnapshot::new(
        ranges
            .into_iter()
            .map(|(path, (start, end))| {
                let path = Path::new(path);
                Module {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    path: Some(path.to_path_buf()),
                    base_address: start,
                    size: end.saturating_sub(start),
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d4a6e00000-55d4a6e21000 r--p 00000000 08:01 1311 /usr/bin/demo
55d4a6e21000-55d4a6e90000 r-xp 00021000 08:01 1311 /usr/bin/demo
55d4a7c9b000-55d4a7cbc000 rw-p 00000000 00:00 0    [heap]
7f1c2a000000-7f1c2a028000 r--p 00000000 08:01 2001 /usr/lib/x86_64-linux-gnu/libc.so.6
7f1c2a028000-7f1c2a1bd000 r-xp 00028000 08:01 2001 /usr/lib/x86_64-linux-gnu/libc.so.6
7f1c2a300000-7f1c2a302000 rw-p 00000000 00:00 0
7ffd5e1f0000-7ffd5e211000 rw-p 00000000 00:00 0    [stack]
garbage line
";

    #[test]
    fn parses_file_backed_modules() {
        let snapshot = parse_proc_maps(MAPS);
        let names: Vec<_> = snapshot.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["demo", "libc.so.6"]);

        let demo = &snapshot.modules()[0];
        assert_eq!(demo.base_address, 0x55d4a6e00000);
        assert_eq!(demo.size, 0x55d4a6e90000 - 0x55d4a6e00000);
        assert_eq!(demo.path.as_deref(), Some(Path::new("/usr/bin/demo")));
    }

    #[test]
    fn paths_keep_spaces_and_lose_deleted_marker() {
        let maps = "\
7f00000000-7f00001000 r--p 00000000 08:01 42   /opt/my app/lib meter.so
7f00001000-7f00004000 r-xp 00001000 08:01 42   /opt/my app/lib meter.so
7f10000000-7f10002000 r-xp 00000000 08:01 77   /tmp/old plugin.so (deleted)
";
        let snapshot = parse_proc_maps(maps);
        let modules = snapshot.modules();
        assert_eq!(modules.len(), 2);

        assert_eq!(modules[0].name, "lib meter.so");
        assert_eq!(
            modules[0].path.as_deref(),
            Some(Path::new("/opt/my app/lib meter.so"))
        );
        assert_eq!(modules[0].size, 0x4000);

        assert_eq!(modules[1].name, "old plugin.so");
        assert_eq!(
            modules[1].path.as_deref(),
            Some(Path::new("/tmp/old plugin.so"))
        );
        assert_eq!(snapshot.find(0x7f10001fff).map(|m| m.base_address), Some(0x7f10000000));
    }

    #[test]
    fn find_uses_half_open_ranges() {
        let snapshot = ModuleSnapshot::new(vec![
            Module {
                name: "b".to_owned(),
                path: None,
                base_address: 0x2000,
                size: 0x1000,
            },
            Module {
                name: "a".to_owned(),
                path: None,
                base_address: 0x1000,
                size: 0x800,
            },
        ]);
        assert_eq!(snapshot.find(0x1000).map(|m| m.name.as_str()), Some("a"));
        assert_eq!(snapshot.find(0x17ff).map(|m| m.name.as_str()), Some("a"));
        assert!(snapshot.find(0x1800).is_none());
        assert_eq!(snapshot.find(0x2fff).map(|m| m.name.as_str()), Some("b"));
        assert!(snapshot.find(0x3000).is_none());
        assert!(snapshot.find(0xfff).is_none());
    }

    #[test]
    fn unreadable_maps_give_empty_snapshot() {
        let enumerator = ProcMapsEnumerator::new("/nonexistent/maps");
        assert!(enumerator.snapshot().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn this_process_has_modules() {
        let snapshot = ProcMapsEnumerator::this_process().snapshot();
        assert!(!snapshot.is_empty());
        let here = this_process_has_modules as fn() as usize as u64;
        assert!(snapshot.find(here).is_some());
    }
}
