//! Opacity policy
//!
//! Decides which opacity a window gets: eligible windows (normal, not
//! full-screen, not excluded) receive the configured fraction, everything
//! else is left untouched.

use tracing::{debug, error};

use crate::config::Settings;
use crate::constants::log::UNKNOWN_CLASS;
use crate::constants::opacity::{DEFAULT_PERCENT, MAX_PERCENT, MIN_PERCENT};
use crate::exclusion::Exclusions;
use crate::window::{HostWindow, WindowIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Dialogs, docks, menus and other non-normal window types
    NotNormal,
    FullScreen,
    Excluded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Set the window's opacity to this fraction
    Apply(f64),
    Skip(SkipReason),
}

/// Configured percentage as a fraction in `[0.30, 1.00]`.
///
/// Unset or non-finite values fall back to 70%.
pub fn opacity_fraction(percent: Option<f64>) -> f64 {
    let percent = percent
        .filter(|p| p.is_finite())
        .unwrap_or(DEFAULT_PERCENT);
    percent.clamp(MIN_PERCENT, MAX_PERCENT) / 100.0
}

/// What should happen to `window` under `settings`.
///
/// `settings` must be the snapshot read for the current event; see
/// [`Exclusions::is_excluded`].
pub fn decide(
    window: &impl HostWindow,
    settings: &Settings,
    exclusions: &mut Exclusions,
) -> Decision {
    if !window.is_normal_window() {
        return Decision::Skip(SkipReason::NotNormal);
    }
    if window.is_full_screen() {
        return Decision::Skip(SkipReason::FullScreen);
    }
    let identity = WindowIdentity::of(window);
    if exclusions.is_excluded(&identity, &settings.excluded_windows, settings.show_debug_logs) {
        return Decision::Skip(SkipReason::Excluded);
    }
    Decision::Apply(opacity_fraction(settings.window_opacity_percentage))
}

/// Decide and, when eligible, set the window's opacity.
///
/// A failed opacity change is logged and swallowed; the window keeps its
/// previous opacity until the next event that reaches it.
pub fn apply(
    window: &impl HostWindow,
    settings: &Settings,
    exclusions: &mut Exclusions,
) -> Decision {
    let decision = decide(window, settings, exclusions);
    match decision {
        Decision::Apply(opacity) => {
            if let Err(e) = window.set_opacity(opacity) {
                let class = window.resource_class();
                error!(
                    class = %class.as_deref().unwrap_or(UNKNOWN_CLASS),
                    error = %e,
                    "Error setting opacity for window"
                );
            }
        }
        Decision::Skip(reason) => {
            debug!(reason = ?reason, "Leaving window opacity unchanged");
        }
    }
    decision
}
