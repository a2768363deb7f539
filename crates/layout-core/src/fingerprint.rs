use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{IoContext, Result};

/// Whole-file content hash used to decide whether two files are the same bytes.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, path: &Path) -> Result<String>;
}

/// SHA-256 over the full file, hex encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Fingerprinter;

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<String> {
        let mut file = File::open(path).at(path)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 65536];
        loop {
            let n = file.read(&mut buf).at(path)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Size first, fingerprint only when sizes match. Missing files are errors.
pub fn files_equal(a: &Path, b: &Path, fingerprinter: &dyn Fingerprinter) -> Result<bool> {
    let a_size = fs::metadata(a).at(a)?.len();
    let b_size = fs::metadata(b).at(b)?.len();
    if a_size != b_size {
        return Ok(false);
    }
    Ok(fingerprinter.fingerprint(a)? == fingerprinter.fingerprint(b)?)
}
