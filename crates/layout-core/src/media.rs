use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};

/// Identity of a scanned sidecar within its month bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Sidecar file name as listed in the source directory
    pub sidecar_name: String,
    /// `photoTakenTime`, whole seconds, UTC
    pub captured_at: DateTime<Utc>,
}

impl RecordKey {
    pub fn new(sidecar_name: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            sidecar_name: sidecar_name.into(),
            captured_at,
        }
    }

    /// (year, month) bucket this key belongs to
    pub fn bucket(&self) -> (i32, u32) {
        (self.captured_at.year(), self.captured_at.month())
    }
}

/// A media file on disk described by one sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    /// Directory holding the media file, its sidecar and any edited variant
    pub source_dir: PathBuf,
    /// Real media file name (original casing)
    pub media_name: String,
    /// Locally edited copy, e.g. `IMG_1234-edited.jpg`
    pub edited_name: Option<String>,
}

impl MediaRecord {
    pub fn new(source_dir: impl Into<PathBuf>, media_name: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            media_name: media_name.into(),
            edited_name: None,
        }
    }

    pub fn with_edited(mut self, edited_name: Option<String>) -> Self {
        self.edited_name = edited_name;
        self
    }

    pub fn media_path(&self) -> PathBuf {
        self.source_dir.join(&self.media_name)
    }

    pub fn sidecar_path(&self, key: &RecordKey) -> PathBuf {
        self.source_dir.join(&key.sidecar_name)
    }

    pub fn edited_path(&self) -> Option<PathBuf> {
        self.edited_name.as_ref().map(|n| self.source_dir.join(n))
    }
}

/// Split a file name at its last dot: `("IMG_1", ".jpg")`.
/// Names without a dot have an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    }
}

/// Insert `_<suffix>` before the extension: `img.jpg` + `edited` -> `img_edited.jpg`.
pub fn name_with_suffix(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    format!("{}_{}{}", stem, suffix, ext)
}
