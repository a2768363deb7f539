use globset::{Glob, GlobMatcher};

use crate::error::{LayoutError, Result};
use crate::resolve::SIDECAR_SUFFIX;

/// Decides which top-level entries of a takeout root get scanned.
///
/// Hidden entries and stray sidecars are never scanned; an optional glob
/// narrows the rest by name.
#[derive(Debug, Clone, Default)]
pub struct DirFilter {
    matcher: Option<GlobMatcher>,
}

impl DirFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let matcher = pattern
            .map(|p| {
                Glob::new(p)
                    .map(|g| g.compile_matcher())
                    .map_err(|source| LayoutError::Filter {
                        pattern: p.to_string(),
                        source,
                    })
            })
            .transpose()?;
        Ok(Self { matcher })
    }

    pub fn accepts(&self, name: &str) -> bool {
        if is_reserved(name) {
            return false;
        }
        self.matcher.as_ref().map_or(true, |m| m.is_match(name))
    }
}

/// `.`-prefixed entries and sidecars sitting at the top level
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('.') || name.ends_with(SIDECAR_SUFFIX)
}
