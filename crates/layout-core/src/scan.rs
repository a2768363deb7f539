use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};
use crate::folder_classify::DirFilter;
use crate::index::TimeIndex;
use crate::resolve::{NameIndex, SIDECAR_SUFFIX};
use crate::sidecar::{self, ScanOutcome};
use crate::ThrottledProgress;

/// Counters from scanning a takeout root
#[derive(Debug, Default, Clone)]
pub struct ScanResult {
    pub directories: u64,
    pub sidecars: u64,
    pub records: u64,
    pub albums: u64,
    /// Sidecars with no matching media file
    pub unresolved: Vec<PathBuf>,
}

/// Scan every year/album folder under `root` into `index`.
///
/// Folders and their entries are visited in sorted order so warnings and
/// which of two same-keyed sidecars gets indexed are stable across runs.
pub fn scan_tree(
    root: &Path,
    filter: &DirFilter,
    index: &mut TimeIndex,
    progress: &ThrottledProgress,
) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    let folders: Vec<String> = read_dir_sorted(root)?
        .into_iter()
        .filter(|name| filter.accepts(name))
        .collect();
    let total = folders.len() as u64;

    for (i, folder) in folders.iter().enumerate() {
        progress.report("scan", i as u64, total, &format!("Scanning {}", folder));
        let dir = root.join(folder);
        if !fs::metadata(&dir).at(&dir)?.is_dir() {
            log::debug!("skip non-directory {}", dir.display());
            continue;
        }

        log::info!("scan dir: {}", folder);
        result.directories += 1;

        let entries = read_dir_sorted(&dir)?;
        let names = NameIndex::new(entries.iter().cloned());

        for name in entries.iter().filter(|n| n.ends_with(SIDECAR_SUFFIX)) {
            result.sidecars += 1;
            match sidecar::scan_sidecar(name, &dir, &names, index)? {
                ScanOutcome::Inserted(_) => result.records += 1,
                ScanOutcome::AlreadyIndexed => {}
                ScanOutcome::Album => result.albums += 1,
                ScanOutcome::Unresolved => result.unresolved.push(dir.join(name)),
            }
        }
    }
    progress.report("scan", total, total, "Scanned");

    Ok(result)
}

/// Entry names of `dir`, sorted. Names that are not valid UTF-8 are skipped.
fn read_dir_sorted(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => log::warn!("skip non UTF-8 name {:?} in {}", raw, dir.display()),
        }
    }
    names.sort();
    Ok(names)
}
