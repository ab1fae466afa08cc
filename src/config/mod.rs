//! Configuration management for xopacity
//!
//! - **settings**: the JSON settings file, env overrides and the
//!   `SettingsSource` seam the daemon reads through

pub mod settings;

// Re-export commonly used types
pub use settings::{FileSettings, Settings, SettingsSource};
