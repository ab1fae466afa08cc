//! Single-entry memo for the exclusion parser
//!
//! Settings are re-read for every window event, but the exclusion list rarely
//! changes. The cache remembers the last raw string and its compiled
//! patterns, so the parser only runs again when the text actually differs.
//! Diagnostics are kept with the entry so they can be repeated at `warn`
//! when verbose logging is switched on, without parsing again.

use tracing::{debug, warn};

use super::parser::{self, PatternError, PatternSet};

#[derive(Debug)]
struct CacheEntry {
    last_raw: String,
    patterns: PatternSet,
    errors: Vec<PatternError>,
}

/// Compiled patterns keyed on the raw string they came from.
///
/// Lookups take `&mut self`. A host that shares one cache between threads
/// must hold a `Mutex` across the whole lookup so each distinct raw value is
/// still parsed at most once.
#[derive(Debug, Default)]
pub struct PatternCache {
    entry: Option<CacheEntry>,
    compilations: usize,
    verbose: bool,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patterns for `raw`, parsing only when it differs from the last call.
    ///
    /// A list with syntax errors is cached as an empty set, so its
    /// diagnostics are logged once per distinct value rather than per event.
    /// `verbose` raises those diagnostics from `debug` to `warn`; switching it
    /// on repeats the stored diagnostics of the cached entry once.
    pub fn patterns(&mut self, raw: &str, verbose: bool) -> &PatternSet {
        let entry = match self.entry.take() {
            Some(entry) if entry.last_raw == raw => {
                if verbose && !self.verbose && !entry.errors.is_empty() {
                    log_errors(raw, &entry.errors, true);
                }
                entry
            }
            _ => self.compile(raw, verbose),
        };
        self.verbose = verbose;
        &self.entry.insert(entry).patterns
    }

    fn compile(&mut self, raw: &str, verbose: bool) -> CacheEntry {
        self.compilations += 1;
        let result = parser::parse(raw);
        if !result.is_ok() {
            log_errors(raw, &result.errors, verbose);
        } else {
            debug!(
                exact = result.patterns.exact.len(),
                contains = result.patterns.contains.len(),
                "Compiled exclusion list"
            );
        }
        CacheEntry {
            last_raw: raw.to_string(),
            errors: result.errors.clone(),
            patterns: result.usable(),
        }
    }

    /// Number of times the parser has run
    pub fn compilations(&self) -> usize {
        self.compilations
    }
}

fn log_errors(raw: &str, errors: &[PatternError], verbose: bool) {
    if verbose {
        warn!(raw = %raw, count = errors.len(), "Invalid exclusion list, excluding nothing");
        for error in errors {
            warn!("  {error}");
        }
    } else {
        debug!(raw = %raw, count = errors.len(), "Invalid exclusion list, excluding nothing");
        for error in errors {
            debug!("  {error}");
        }
    }
}
