use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{IoContext, LayoutError, Result};
use crate::extras;
use crate::index::TimeIndex;
use crate::media::{MediaRecord, RecordKey};
use crate::resolve::{self, NameIndex};

/// What a sidecar describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sidecar {
    /// Album-level `metadata.json`, not a media item
    Album,
    Item { captured_at: DateTime<Utc> },
}

/// Result of scanning one sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Inserted(RecordKey),
    /// Same sidecar name and timestamp already indexed
    AlreadyIndexed,
    Album,
    /// No media file matches the sidecar; logged and skipped
    Unresolved,
}

/// Parse Google's JSON metadata. Only `albumData` and
/// `photoTakenTime.timestamp` are looked at.
pub fn parse_sidecar(json_bytes: &[u8]) -> Result<Sidecar, String> {
    let data: serde_json::Value =
        serde_json::from_slice(json_bytes).map_err(|e| format!("invalid JSON: {}", e))?;

    if data.get("albumData").is_some() {
        return Ok(Sidecar::Album);
    }

    let raw = data
        .get("photoTakenTime")
        .and_then(|t| t.get("timestamp"))
        .ok_or("photoTakenTime is missing")?;

    let epoch = match raw {
        serde_json::Value::String(s) if s.is_empty() => {
            return Err("photoTakenTime is empty".into())
        }
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| format!("photoTakenTime is not an integer: {:?}", s))?,
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("photoTakenTime is not an integer: {}", n))?,
        other => return Err(format!("photoTakenTime has unexpected type: {}", other)),
    };

    let captured_at = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| format!("photoTakenTime out of range: {}", epoch))?;
    Ok(Sidecar::Item { captured_at })
}

/// Read one sidecar from `dir` and index the media file it describes.
///
/// Malformed timestamps fail the whole run; an unresolvable media name is
/// only a warning.
pub fn scan_sidecar(
    sidecar_name: &str,
    dir: &Path,
    names: &NameIndex,
    index: &mut TimeIndex,
) -> Result<ScanOutcome> {
    let path = dir.join(sidecar_name);
    let bytes = fs::read(&path).at(&path)?;

    let captured_at = match parse_sidecar(&bytes) {
        Ok(Sidecar::Album) => return Ok(ScanOutcome::Album),
        Ok(Sidecar::Item { captured_at }) => captured_at,
        Err(reason) => return Err(LayoutError::MalformedMetadata { path, reason }),
    };

    let key = RecordKey::new(sidecar_name, captured_at);
    if index.contains(&key) {
        return Ok(ScanOutcome::AlreadyIndexed);
    }

    // The JSON title keeps the pre-dedup name, so the sidecar name is the only reliable link.
    let media_name = match resolve::resolve_media_name(sidecar_name, names) {
        Ok(name) => name,
        Err(e) => {
            log::warn!("cannot find original file for {}: {}", path.display(), e);
            return Ok(ScanOutcome::Unresolved);
        }
    };

    let edited = extras::find_edited_variant(&media_name, names);
    let record = MediaRecord::new(dir, media_name).with_edited(edited);
    index.insert(key.clone(), record);
    Ok(ScanOutcome::Inserted(key))
}
