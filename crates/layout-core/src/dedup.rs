use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::fingerprint::{self, Fingerprinter};
use crate::index::TimeIndex;
use crate::media::RecordKey;
use crate::order;
use crate::ThrottledProgress;

/// A removed record and the record it duplicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub removed: PathBuf,
    pub kept: PathBuf,
}

#[derive(Debug, Default)]
pub struct DedupResult {
    pub duplicates: Vec<Duplicate>,
}

/// Remove records whose media file is byte-identical to an earlier record
/// with the same capture time.
///
/// Takeout exports the same capture once per source (album copy, auto
/// upload), e.g. `VID_20200626_124037.mp4` and `VID_20200626_124037(1).mp4`
/// with equal `photoTakenTime`. Within a bucket the first key in
/// [`order::ordered_keys`] order is kept. Records at different timestamps
/// are never compared here; the writer catches those by name.
pub fn deduplicate(
    index: &mut TimeIndex,
    input_root: &Path,
    fingerprinter: &dyn Fingerprinter,
    progress: &ThrottledProgress,
) -> Result<DedupResult> {
    let mut result = DedupResult::default();
    let years = index.years();
    let total = years.len() as u64;

    for (i, year) in years.into_iter().enumerate() {
        progress.report("dedup", i as u64, total, &format!("Deduplicating {}", year));
        for month in index.months(year) {
            let keys = match index.bucket(year, month) {
                Some(bucket) => order::ordered_keys(bucket),
                None => continue,
            };

            let mut first_at: HashMap<DateTime<Utc>, RecordKey> = HashMap::new();
            for key in keys {
                let kept_key = match first_at.entry(key.captured_at) {
                    Entry::Vacant(slot) => {
                        slot.insert(key);
                        continue;
                    }
                    Entry::Occupied(slot) => slot.get().clone(),
                };

                let (Some(kept), Some(candidate)) = (index.get(&kept_key), index.get(&key)) else {
                    continue;
                };
                let kept_path = kept.media_path();
                let candidate_path = candidate.media_path();

                if fingerprint::files_equal(&candidate_path, &kept_path, fingerprinter)? {
                    log::info!(
                        "{} duplicates {}",
                        relative(input_root, &candidate_path).display(),
                        relative(input_root, &kept_path).display()
                    );
                    index.remove(&key);
                    result.duplicates.push(Duplicate {
                        removed: candidate_path,
                        kept: kept_path,
                    });
                }
            }
        }
    }
    progress.report("dedup", total, total, "Deduplicated");

    Ok(result)
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf())
}
