use std::fmt;

use anyhow::Result;

/// What the opacity policy needs to know about a client window.
///
/// The X11 binding implements this over a live connection; tests use a plain
/// struct.
pub trait HostWindow {
    /// `_NET_WM_WINDOW_TYPE_NORMAL` (or no type at all)
    fn is_normal_window(&self) -> bool;

    fn is_full_screen(&self) -> bool;

    /// Class part of `WM_CLASS`
    fn resource_class(&self) -> Option<String>;

    /// Instance part of `WM_CLASS`
    fn resource_name(&self) -> Option<String>;

    /// Window title
    fn caption(&self) -> Option<String>;

    /// Set opacity as a fraction in `0.0..=1.0`.
    fn set_opacity(&self, opacity: f64) -> Result<()>;
}

/// Lower-cased string a window is matched against.
///
/// Picked from the first non-empty of resource class, resource name and
/// caption; empty when the window has none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowIdentity(String);

impl WindowIdentity {
    pub fn new(
        resource_class: Option<&str>,
        resource_name: Option<&str>,
        caption: Option<&str>,
    ) -> Self {
        let candidate = [resource_class, resource_name, caption]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        Self(candidate.to_lowercase())
    }

    pub fn of(window: &impl HostWindow) -> Self {
        Self::new(
            window.resource_class().as_deref(),
            window.resource_name().as_deref(),
            window.caption().as_deref(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WindowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
