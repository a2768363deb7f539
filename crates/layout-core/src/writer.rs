use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, LayoutError, Result};
use crate::fingerprint::{self, Fingerprinter};
use crate::index::TimeIndex;
use crate::media::{name_with_suffix, MediaRecord, RecordKey};
use crate::order;
use crate::ThrottledProgress;

/// Collision suffix: day of month and time of capture, `_26-124037`
const COLLISION_SUFFIX_FORMAT: &str = "%d-%H%M%S";

/// How output names are chosen.
#[derive(Debug, Clone)]
pub struct NamePolicy {
    pub lowercase_names: bool,
    /// Names expected to collide across unrelated captures (compared case-insensitively)
    pub quiet_collision_names: Vec<String>,
}

impl NamePolicy {
    fn output_name(&self, media_name: &str) -> String {
        if self.lowercase_names {
            media_name.to_lowercase()
        } else {
            media_name.to_string()
        }
    }

    fn is_quiet(&self, name: &str) -> bool {
        self.quiet_collision_names
            .iter()
            .any(|quiet| quiet.to_lowercase() == name.to_lowercase())
    }
}

/// Result of the write phase.
#[derive(Debug, Default)]
pub struct WriteResult {
    /// Media files newly linked into the output
    pub media_linked: u64,
    /// Media files whose output slot already held the same bytes
    pub already_present: u64,
    /// Media files written under a time-suffixed name
    pub collisions: u64,
    pub warnings: Vec<String>,
}

enum LinkOutcome {
    Linked,
    Exists,
}

/// Hardlink every record into `<output>/<year>/<MM>/`.
///
/// Years ascending, months 1..=12, keys in [`order::ordered_keys`] order:
/// the first record to claim an output name keeps it unsuffixed.
pub fn write_layout(
    index: &TimeIndex,
    output_dir: &Path,
    policy: &NamePolicy,
    fingerprinter: &dyn Fingerprinter,
    progress: &ThrottledProgress,
) -> Result<WriteResult> {
    fs::create_dir_all(output_dir).at(output_dir)?;

    let mut result = WriteResult::default();
    let total = index.len() as u64;
    let mut current = 0u64;

    for year in index.years() {
        let year_dir = output_dir.join(year.to_string());
        for month in index.months(year) {
            let Some(bucket) = index.bucket(year, month) else {
                continue;
            };

            let month_dir = year_dir.join(format!("{:02}", month));
            fs::create_dir_all(&month_dir).at(&month_dir)?;

            // output name -> source media path of its first occupant
            let mut written: HashMap<String, PathBuf> = HashMap::new();
            for key in order::ordered_keys(bucket) {
                progress.report("write", current, total, "Linking files");
                current += 1;
                if let Some(record) = bucket.get(&key) {
                    link_record(
                        &key,
                        record,
                        &month_dir,
                        policy,
                        fingerprinter,
                        &mut written,
                        &mut result,
                    )?;
                }
            }
        }
    }
    progress.report("write", total, total, "Linked");

    Ok(result)
}

fn link_record(
    key: &RecordKey,
    record: &MediaRecord,
    month_dir: &Path,
    policy: &NamePolicy,
    fingerprinter: &dyn Fingerprinter,
    written: &mut HashMap<String, PathBuf>,
    result: &mut WriteResult,
) -> Result<()> {
    let source = record.media_path();
    let base_name = policy.output_name(&record.media_name);
    let base_target = month_dir.join(&base_name);

    let (emitted, fresh) = match hard_link(&source, &base_target)? {
        LinkOutcome::Linked => {
            result.media_linked += 1;
            (base_name, true)
        }
        LinkOutcome::Exists if fingerprint::files_equal(&source, &base_target, fingerprinter)? => {
            // album vs auto-upload copy at a different timestamp
            log::debug!("{} already present as {}", source.display(), base_name);
            result.already_present += 1;
            (base_name, false)
        }
        LinkOutcome::Exists => {
            let suffix = key.captured_at.format(COLLISION_SUFFIX_FORMAT).to_string();
            let (name, outcome) =
                link_with_suffix(&source, month_dir, &base_name, &suffix, fingerprinter)?;
            let fresh = matches!(outcome, LinkOutcome::Linked);
            if fresh {
                result.media_linked += 1;
                result.collisions += 1;
            } else {
                result.already_present += 1;
            }
            if !policy.is_quiet(&base_name) {
                let previous = written
                    .get(&base_name)
                    .cloned()
                    .unwrap_or_else(|| base_target.clone());
                let message = format!(
                    "{} taken by different content, linked as {} \
                     (previous={}, current={}, sidecar={})",
                    base_name,
                    name,
                    previous.display(),
                    source.display(),
                    record.sidecar_path(key).display()
                );
                log::warn!("{}", message);
                result.warnings.push(message);
            }
            (name, fresh)
        }
    };

    // Sidecar and edited copy follow the emitted media name, not the takeout name.
    link_sidecar(
        &record.sidecar_path(key),
        &month_dir.join(format!("{}.json", emitted)),
        fresh,
        fingerprinter,
    )?;
    if let Some(edited) = record.edited_path() {
        let edited_name = name_with_suffix(&emitted, "edited");
        link_edited(&edited, key, month_dir, &edited_name, fingerprinter, result)?;
    }

    written.entry(emitted).or_insert(source);
    Ok(())
}

/// Link under `<stem>_<suffix><ext>`, falling back to `<stem>_<suffix>-2<ext>`, ...
///
/// Returns the name that now holds the file's content. `Exists` means the
/// same bytes were already there.
fn link_with_suffix(
    source: &Path,
    month_dir: &Path,
    base_name: &str,
    suffix: &str,
    fingerprinter: &dyn Fingerprinter,
) -> Result<(String, LinkOutcome)> {
    let mut counter = 1u32;
    loop {
        let name = if counter == 1 {
            name_with_suffix(base_name, suffix)
        } else {
            name_with_suffix(base_name, &format!("{}-{}", suffix, counter))
        };
        let target = month_dir.join(&name);
        match hard_link(source, &target)? {
            LinkOutcome::Linked => return Ok((name, LinkOutcome::Linked)),
            LinkOutcome::Exists if fingerprint::files_equal(source, &target, fingerprinter)? => {
                return Ok((name, LinkOutcome::Exists));
            }
            LinkOutcome::Exists => counter += 1,
        }
    }
}

/// Link the sidecar next to its media file.
///
/// When the media slot was already held by the same bytes, the occupant's
/// sidecar stays. A freshly linked media file must not end up beside
/// someone else's sidecar.
fn link_sidecar(
    source: &Path,
    target: &Path,
    fresh_media: bool,
    fingerprinter: &dyn Fingerprinter,
) -> Result<()> {
    if let LinkOutcome::Linked = hard_link(source, target)? {
        return Ok(());
    }
    if !fresh_media || fingerprint::files_equal(source, target, fingerprinter)? {
        log::debug!("{} already exists", target.display());
        return Ok(());
    }
    Err(LayoutError::Link {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::AlreadyExists,
            "sidecar slot holds different content",
        ),
    })
}

/// Link an edited copy as `name`. If `name` holds different bytes the copy
/// gets the record's time suffix, the same way a media collision does.
fn link_edited(
    source: &Path,
    key: &RecordKey,
    month_dir: &Path,
    name: &str,
    fingerprinter: &dyn Fingerprinter,
    result: &mut WriteResult,
) -> Result<()> {
    let target = month_dir.join(name);
    match hard_link(source, &target)? {
        LinkOutcome::Linked => Ok(()),
        LinkOutcome::Exists if fingerprint::files_equal(source, &target, fingerprinter)? => {
            log::debug!("{} already exists", target.display());
            Ok(())
        }
        LinkOutcome::Exists => {
            let suffix = key.captured_at.format(COLLISION_SUFFIX_FORMAT).to_string();
            let (renamed, outcome) =
                link_with_suffix(source, month_dir, name, &suffix, fingerprinter)?;
            if let LinkOutcome::Linked = outcome {
                result.collisions += 1;
            }
            let message = format!(
                "{} taken by different content, linked as {} (current={})",
                name,
                renamed,
                source.display()
            );
            log::warn!("{}", message);
            result.warnings.push(message);
            Ok(())
        }
    }
}

fn hard_link(source: &Path, target: &Path) -> Result<LinkOutcome> {
    match fs::hard_link(source, target) {
        Ok(()) => Ok(LinkOutcome::Linked),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(LinkOutcome::Exists),
        Err(source_err) => Err(LayoutError::Link {
            from: source.to_path_buf(),
            to: target.to_path_buf(),
            source: source_err,
        }),
    }
}
