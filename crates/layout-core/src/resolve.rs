use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use unicode_normalization::UnicodeNormalization;

use crate::error::{LayoutError, Result};

/// Suffix identifying a sidecar file
pub const SIDECAR_SUFFIX: &str = ".json";

/// Extensions the exporter is known to mangle, in lookup order
pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "gif", "jpeg", "webm", "webp", "mp4", "mov", "mkv"];

// `<base>.<ext>(<n>)` - the exporter puts the duplicate index after the extension
static DUPLICATE_AFTER_EXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<base>.+)\.(?P<ext>{})\((?P<n>\d+)\)$",
        MEDIA_EXTENSIONS.join("|")
    ))
    .unwrap()
});

/// Case-insensitive view of one directory listing.
///
/// Keys are NFC-normalized and lowercased; values are the names as listed,
/// so lookups always hand back the real casing.
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    names: HashMap<String, String>,
}

impl NameIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = HashMap::new();
        for name in names {
            let name = name.into();
            // first listed name wins when two files differ only by case
            index.entry(fold(&name)).or_insert(name);
        }
        Self { names: index }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.names.get(&fold(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}

/// Map a sidecar file name back to the media file it describes.
///
/// Candidates, first hit wins:
/// 1. the name without `.json`
/// 2. a truncated one-letter extension completed (`NAME.j` -> `NAME.jpg`)
/// 3. the duplicate index moved before the extension (`P1.JPG(1)` -> `P1(1).JPG`)
pub fn resolve_media_name(sidecar_name: &str, index: &NameIndex) -> Result<String> {
    let unresolved = || LayoutError::Resolution {
        sidecar: sidecar_name.to_string(),
    };

    let stripped = sidecar_name
        .strip_suffix(SIDECAR_SUFFIX)
        .filter(|s| !s.is_empty())
        .ok_or_else(unresolved)?;

    if let Some(name) = index.lookup(stripped) {
        return Ok(name.to_string());
    }

    for candidate in complete_truncated_extension(stripped) {
        if let Some(name) = index.lookup(&candidate) {
            return Ok(name.to_string());
        }
    }

    if let Some(candidate) = move_duplicate_index(stripped) {
        if let Some(name) = index.lookup(&candidate) {
            return Ok(name.to_string());
        }
    }

    Err(unresolved())
}

/// Long names get their extension cut down to a single letter.
fn complete_truncated_extension(name: &str) -> Vec<String> {
    let Some((_, tail)) = name.rsplit_once('.') else {
        return Vec::new();
    };
    let mut chars = tail.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return Vec::new();
    };
    if !letter.is_ascii_alphabetic() {
        return Vec::new();
    }
    let letter = letter.to_ascii_lowercase();

    MEDIA_EXTENSIONS
        .iter()
        .filter(|ext| ext.starts_with(letter))
        .map(|ext| format!("{}{}", name, &ext[1..]))
        .collect()
}

fn move_duplicate_index(name: &str) -> Option<String> {
    let caps = DUPLICATE_AFTER_EXT_RE.captures(name)?;
    Some(format!("{}({}).{}", &caps["base"], &caps["n"], &caps["ext"]))
}
