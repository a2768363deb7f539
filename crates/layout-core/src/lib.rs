pub mod dedup;
pub mod error;
pub mod extras;
pub mod fingerprint;
pub mod folder_classify;
pub mod index;
pub mod media;
pub mod order;
pub mod resolve;
pub mod scan;
pub mod sidecar;
pub mod writer;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use error::{LayoutError, Result};
pub use fingerprint::{Fingerprinter, Sha256Fingerprinter};
pub use index::TimeIndex;
pub use media::{MediaRecord, RecordKey};

/// Names that recur across unrelated captures in a takeout (assistant
/// creations, stylized copies). Collisions on them are not worth a warning.
pub const DEFAULT_QUIET_COLLISION_NAMES: &[&str] = &[
    "color_pop.jpg",
    "effects.jpg",
    "movie.mp4",
    "movie(1).mp4",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Takeout directory holding year and album folders
    pub input: PathBuf,
    /// Root of the YYYY/MM tree
    pub output: PathBuf,
    /// Glob over top-level folder names; all folders when unset
    pub dir_filter: Option<String>,
    pub lowercase_names: bool,
    pub quiet_collision_names: Vec<String>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            dir_filter: None,
            lowercase_names: true,
            quiet_collision_names: DEFAULT_QUIET_COLLISION_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ProcessOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| LayoutError::OptionsFile {
            path: path.to_path_buf(),
            source,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            return Err(LayoutError::Options("input directory is not specified".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(LayoutError::Options("output directory is not specified".into()));
        }
        Ok(())
    }

    fn name_policy(&self) -> writer::NamePolicy {
        writer::NamePolicy {
            lowercase_names: self.lowercase_names,
            quiet_collision_names: self.quiet_collision_names.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    pub total_records: u64,
    pub duplicates_removed: u64,
    pub media_linked: u64,
    pub already_present: u64,
    pub collisions: u64,
    pub unresolved: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Type alias for progress callback. The callback may borrow from the caller.
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Throttled progress reporter: emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(Instant::now() - std::time::Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let Ok(mut last) = self.last_emit.lock() else {
                return;
            };
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Run the full pipeline: scan, deduplicate, link.
pub fn process(
    options: &ProcessOptions,
    progress_callback: &ProgressCallback<'_>,
) -> Result<ProcessResult> {
    process_with(options, &Sha256Fingerprinter, progress_callback)
}

/// [`process`] with a caller-chosen content fingerprint.
pub fn process_with(
    options: &ProcessOptions,
    fingerprinter: &dyn Fingerprinter,
    progress_callback: &ProgressCallback<'_>,
) -> Result<ProcessResult> {
    options.validate()?;
    let tp = ThrottledProgress::new(progress_callback);
    let filter = folder_classify::DirFilter::new(options.dir_filter.as_deref())?;

    log::info!(
        "start (input={}, output={})",
        options.input.display(),
        options.output.display()
    );

    // Stage 1: Scan sidecars into the time index
    let t = Instant::now();
    let mut index = TimeIndex::new();
    let scan = scan::scan_tree(&options.input, &filter, &mut index, &tp)?;
    log::info!(
        "scanning complete ({:.2}s): {} records from {} sidecars in {} folders, {} unresolved",
        t.elapsed().as_secs_f64(),
        scan.records,
        scan.sidecars,
        scan.directories,
        scan.unresolved.len()
    );
    let total_records = index.len() as u64;

    // Stage 2: Deduplicate same-time records
    let t = Instant::now();
    let dedup = dedup::deduplicate(&mut index, &options.input, fingerprinter, &tp)?;
    log::info!(
        "dedup complete ({:.2}s): {} duplicates removed",
        t.elapsed().as_secs_f64(),
        dedup.duplicates.len()
    );

    // Stage 3: Link into YYYY/MM
    let t = Instant::now();
    let write = writer::write_layout(
        &index,
        &options.output,
        &options.name_policy(),
        fingerprinter,
        &tp,
    )?;
    log::info!(
        "linking complete ({:.2}s): {} linked, {} already present, {} renamed",
        t.elapsed().as_secs_f64(),
        write.media_linked,
        write.already_present,
        write.collisions
    );

    let mut warnings: Vec<String> = scan
        .unresolved
        .iter()
        .map(|p| format!("cannot find original file for {}", p.display()))
        .collect();
    warnings.extend(write.warnings);

    Ok(ProcessResult {
        total_records,
        duplicates_removed: dedup.duplicates.len() as u64,
        media_linked: write.media_linked,
        already_present: write.already_present,
        collisions: write.collisions,
        unresolved: scan.unresolved.len() as u64,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_options_from_json_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        File::create(&path)
            .unwrap()
            .write_all(br#"{"input":"/takeout","output":"/photos","dir_filter":"Photos from *"}"#)
            .unwrap();

        let options = ProcessOptions::from_json_file(&path).unwrap();
        assert_eq!(options.input, PathBuf::from("/takeout"));
        assert_eq!(options.dir_filter.as_deref(), Some("Photos from *"));
        assert!(options.lowercase_names);
        assert_eq!(options.quiet_collision_names.len(), DEFAULT_QUIET_COLLISION_NAMES.len());
    }

    #[test]
    fn test_options_file_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ProcessOptions::from_json_file(&path),
            Err(LayoutError::OptionsFile { .. })
        ));
    }

    #[test]
    fn test_missing_input_rejected() {
        let options = ProcessOptions {
            output: PathBuf::from("/photos"),
            ..Default::default()
        };
        let err = process(&options, &|_, _, _, _| {}).unwrap_err();
        assert!(matches!(err, LayoutError::Options(_)));
    }

    #[test]
    fn test_throttled_progress_always_reports_completion() {
        let calls = Mutex::new(Vec::new());
        {
            let cb = |stage: &str, current: u64, total: u64, _: &str| {
                calls.lock().unwrap().push((stage.to_string(), current, total));
            };
            let tp = ThrottledProgress::new(&cb);
            tp.report("scan", 0, 10, "");
            tp.report("scan", 1, 10, "");
            tp.report("scan", 10, 10, "");
        }

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.first(), Some(&("scan".to_string(), 0, 10)));
        assert_eq!(calls.last(), Some(&("scan".to_string(), 10, 10)));
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn test_process_reports_every_stage_to_borrowing_callback() {
        let dir = tempdir().unwrap();
        let photos = dir.path().join("in").join("Photos from 2018");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::write(photos.join("a.jpg"), "a").unwrap();
        std::fs::write(
            photos.join("a.jpg.json"),
            r#"{"photoTakenTime":{"timestamp":"1536681332"}}"#,
        )
        .unwrap();

        let options = ProcessOptions {
            input: dir.path().join("in"),
            output: dir.path().join("out"),
            ..Default::default()
        };
        let stages = Mutex::new(Vec::<String>::new());
        let result = process(&options, &|stage, current, total, _| {
            if current >= total {
                stages.lock().unwrap().push(stage.to_string());
            }
        })
        .unwrap();

        assert_eq!(result.media_linked, 1);
        assert_eq!(stages.into_inner().unwrap(), ["scan", "dedup", "write"]);
    }
}
