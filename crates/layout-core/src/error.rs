use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    /// Sidecar is missing `photoTakenTime.timestamp` or it is not an integer.
    #[error("cannot process {path}: {reason}")]
    MalformedMetadata { path: PathBuf, reason: String },

    /// No sibling file matches the sidecar name. Recovered by the scanner.
    #[error("cannot determine media file for sidecar {sidecar}")]
    Resolution { sidecar: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot link {from} -> {to}: {source}")]
    Link {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid directory filter {pattern:?}: {source}")]
    Filter {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{0}")]
    Options(String),

    #[error("invalid options file {path}: {source}")]
    OptionsFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

/// Attach the offending path to a bare `io::Error`.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
