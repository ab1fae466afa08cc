//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the daemon, kept in one
//! place so the policy, config loader and X11 binding agree on them.

/// Opacity policy bounds (percentages)
pub mod opacity {
    /// Used when `windowOpacityPercentage` is absent or not a finite number
    pub const DEFAULT_PERCENT: f64 = 70.0;

    /// Lowest percentage a user can configure
    pub const MIN_PERCENT: f64 = 30.0;

    /// Fully opaque
    pub const MAX_PERCENT: f64 = 100.0;
}

/// X11 protocol constants
pub mod x11 {
    /// `_NET_WM_WINDOW_OPACITY` value for a fully opaque window
    pub const OPACITY_OPAQUE: u32 = u32::MAX;

    /// Upper bound (in 32-bit units) when reading text properties
    pub const TEXT_PROPERTY_LENGTH: u32 = 1024;
}

/// Configuration file and environment constants
pub mod config {
    /// Directory under `$XDG_CONFIG_HOME`
    pub const APP_DIR: &str = "xopacity";

    /// Settings file name
    pub const FILENAME: &str = "config.json";

    /// Env override for `windowOpacityPercentage`
    pub const ENV_OPACITY_PERCENT: &str = "XOPACITY_OPACITY_PERCENT";

    /// Env override for `excludedWindows`
    pub const ENV_EXCLUDED_WINDOWS: &str = "XOPACITY_EXCLUDED_WINDOWS";
}

/// Log text shared between modules
pub mod log {
    /// Stand-in when a window has no resource class
    pub const UNKNOWN_CLASS: &str = "<unknown>";
}
