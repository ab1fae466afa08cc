//! User settings for the opacity daemon
//!
//! Stored as JSON in `~/.config/xopacity/config.json`. The daemon re-reads
//! the file for every window event, so edits take effect without a restart.
//! Environment variables override values from the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::constants::config::{APP_DIR, ENV_EXCLUDED_WINDOWS, ENV_OPACITY_PERCENT, FILENAME};

/// The four keys the daemon understands. Missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Opacity in percent; clamped by the policy, 70 when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_opacity_percentage: Option<f64>,

    /// Comma separated exclusion list, see [`crate::exclusion::parser`]
    pub excluded_windows: String,

    /// Log the identity of every new window at info level
    pub show_new_window_names: bool,

    /// Log exclusion list diagnostics at warn level instead of debug
    pub show_debug_logs: bool,
}

impl Settings {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse settings JSON")
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// Unparseable numbers are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_OPACITY_PERCENT) {
            match raw.trim().parse::<f64>() {
                Ok(percent) => self.window_opacity_percentage = Some(percent),
                Err(e) => error!(var = %ENV_OPACITY_PERCENT, value = %raw, error = ?e, "failed to parse env var"),
            }
        }
        if let Some(raw) = lookup(ENV_EXCLUDED_WINDOWS) {
            self.excluded_windows = raw;
        }
    }
}

/// Where settings come from.
///
/// Every call returns a fresh snapshot with defaults filled in; it must not
/// fail, since a broken config should never stop the daemon.
pub trait SettingsSource {
    fn read(&self) -> Settings;
}

/// Settings file on disk plus environment overrides
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    last_error: RefCell<Option<String>>,
    last_non_finite: Cell<Option<u64>>,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_error: RefCell::new(None),
            last_non_finite: Cell::new(None),
        }
    }

    /// `~/.config/xopacity/config.json`, or `./xopacity/config.json` when
    /// there is no config dir.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings from the file alone. A missing file yields defaults.
    pub fn load(&self) -> Result<Settings> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Settings::from_json(&contents)
                .context(format!("Invalid settings file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e).context(format!("Failed to read settings file {}", self.path.display())),
        }
    }

    /// Write a default settings file so the user has something to edit.
    /// Does nothing when the file already exists.
    pub fn write_default_if_missing(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let defaults = Settings {
            window_opacity_percentage: Some(crate::constants::opacity::DEFAULT_PERCENT),
            ..Settings::default()
        };
        let contents = serde_json::to_string_pretty(&defaults)
            .context("Failed to serialize default settings")?;
        fs::write(&self.path, contents)
            .context(format!("Failed to write settings file to {}", self.path.display()))?;
        info!(path = %self.path.display(), "Generated settings file for user to edit (env vars still override)");
        Ok(())
    }

    /// Log a load failure once per distinct message; the file is re-read on
    /// every event and the same error would otherwise flood the log.
    fn report(&self, failure: Option<String>) {
        let mut last = self.last_error.borrow_mut();
        if *last == failure {
            return;
        }
        match &failure {
            Some(message) => error!(path = %self.path.display(), error = %message, "Failed to load settings, using defaults"),
            None if last.is_some() => info!(path = %self.path.display(), "Settings file is valid again"),
            None => {}
        }
        *last = failure;
    }

    /// Settings from the file with overrides from `lookup` applied
    fn read_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Settings {
        let mut settings = match self.load() {
            Ok(settings) => {
                self.report(None);
                settings
            }
            Err(e) => {
                self.report(Some(format!("{e:#}")));
                Settings::default()
            }
        };
        settings.apply_overrides(lookup);

        // Compared by bit pattern, since NaN never equals itself
        let non_finite = settings
            .window_opacity_percentage
            .filter(|percent| !percent.is_finite());
        let bits = non_finite.map(f64::to_bits);
        if bits != self.last_non_finite.get() {
            if let Some(percent) = non_finite {
                warn!(percent = percent, "windowOpacityPercentage is not a number, using default");
            }
            self.last_non_finite.set(bits);
        }
        if non_finite.is_some() {
            settings.window_opacity_percentage = None;
        }
        settings
    }
}

impl SettingsSource for FileSettings {
    fn read(&self) -> Settings {
        self.read_with(|key| env::var(key).ok())
    }
}
