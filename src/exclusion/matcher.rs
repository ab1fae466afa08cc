use super::cache::PatternCache;
use super::parser::PatternSet;
use crate::window::WindowIdentity;

/// Whether `identity` is excluded by `patterns`.
///
/// Both sides are already lower-case, so plain string comparison gives the
/// case-insensitive match. A window with no identity is never excluded.
pub fn is_excluded(identity: &WindowIdentity, patterns: &PatternSet) -> bool {
    if identity.is_empty() || patterns.is_empty() {
        return false;
    }
    let identity = identity.as_str();
    patterns.exact.contains(identity)
        || patterns
            .contains
            .iter()
            .any(|fragment| identity.contains(fragment.as_str()))
}

/// Exclusion matcher backed by a [`PatternCache`]
#[derive(Debug, Default)]
pub struct Exclusions {
    cache: PatternCache,
}

impl Exclusions {
    pub fn new() -> Self {
        Self {
            cache: PatternCache::new(),
        }
    }

    /// Check `identity` against the exclusion list `raw`.
    ///
    /// `raw` must be the value just read from settings for the current
    /// event, never one held over from an earlier event. The cache compares
    /// it to the last value and recompiles only when it changed.
    ///
    /// Turning `verbose` on repeats the diagnostics of a cached invalid list
    /// at warn level; the list is not parsed again.
    pub fn is_excluded(&mut self, identity: &WindowIdentity, raw: &str, verbose: bool) -> bool {
        if identity.is_empty() {
            return false;
        }
        is_excluded(identity, self.cache.patterns(raw, verbose))
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }
}
