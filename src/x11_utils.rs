use anyhow::{Context, Result};
use tracing::debug;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::x11::{OPACITY_OPAQUE, TEXT_PROPERTY_LENGTH};
use crate::window::HostWindow;

/// Application context holding immutable shared state
pub struct AppContext<'a> {
    pub conn: &'a RustConnection,
    pub screen: &'a Screen,
    pub atoms: &'a CachedAtoms,
}

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug)]
pub struct CachedAtoms {
    pub utf8_string: Atom,
    pub net_wm_name: Atom,
    pub net_client_list: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_normal: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_window_opacity: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            utf8_string: intern(conn, "UTF8_STRING")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
            net_wm_window_type: intern(conn, "_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_normal: intern(conn, "_NET_WM_WINDOW_TYPE_NORMAL")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern(conn, "_NET_WM_STATE_FULLSCREEN")?,
            net_wm_window_opacity: intern(conn, "_NET_WM_WINDOW_OPACITY")?,
        })
    }
}

/// Managed client windows, in `_NET_CLIENT_LIST` order
pub fn client_list(ctx: &AppContext) -> Result<Vec<Window>> {
    let prop = ctx
        .conn
        .get_property(
            false,
            ctx.screen.root,
            ctx.atoms.net_client_list,
            AtomEnum::WINDOW,
            0,
            u32::MAX,
        )
        .context("Failed to query _NET_CLIENT_LIST property")?
        .reply()
        .context("Failed to get window list from X11 server")?;
    if prop.value.is_empty() {
        // No EWMH window manager running, or no clients yet
        return Ok(Vec::new());
    }
    Ok(prop
        .value32()
        .ok_or_else(|| anyhow::anyhow!("Invalid return from _NET_CLIENT_LIST"))?
        .collect())
}

/// Split a `WM_CLASS` value (`instance\0class\0`) into `(instance, class)`.
pub fn split_wm_class(value: &[u8]) -> (Option<String>, Option<String>) {
    let mut parts = value
        .split(|b| *b == 0)
        .map(|part| String::from_utf8_lossy(part).into_owned());
    let instance = parts.next().filter(|s| !s.is_empty());
    let class = parts.next().filter(|s| !s.is_empty());
    (instance, class)
}

/// `_NET_WM_WINDOW_OPACITY` CARDINAL for an opacity fraction
pub fn opacity_to_cardinal(opacity: f64) -> u32 {
    (opacity.clamp(0.0, 1.0) * f64::from(OPACITY_OPAQUE)).round() as u32
}

/// EWMH: a window without `_NET_WM_WINDOW_TYPE` is normal unless it is
/// transient for another window (then it is a dialog).
pub fn is_normal_type(types: &[Atom], normal: Atom, transient: bool) -> bool {
    if types.is_empty() {
        !transient
    } else {
        types.contains(&normal)
    }
}

/// Snapshot of one client window's properties, able to set its opacity
pub struct ClientWindow<'a> {
    pub window: Window,
    pub normal: bool,
    pub full_screen: bool,
    pub class: Option<String>,
    pub instance: Option<String>,
    pub caption: Option<String>,
    conn: &'a RustConnection,
    opacity_atom: Atom,
}

impl<'a> ClientWindow<'a> {
    /// Read everything the opacity policy looks at in one go
    pub fn query(ctx: &AppContext<'a>, window: Window) -> Result<Self> {
        let atoms = ctx.atoms;

        let wm_class = get_property(ctx.conn, window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into())?;
        let (instance, class) = split_wm_class(&wm_class.value);

        let types: Vec<Atom> = get_property(ctx.conn, window, atoms.net_wm_window_type, AtomEnum::ATOM.into())?
            .value32()
            .map(|v| v.collect())
            .unwrap_or_default();
        let transient = !get_property(ctx.conn, window, AtomEnum::WM_TRANSIENT_FOR.into(), AtomEnum::WINDOW.into())?
            .value
            .is_empty();

        let full_screen = get_property(ctx.conn, window, atoms.net_wm_state, AtomEnum::ATOM.into())?
            .value32()
            .is_some_and(|mut states| states.any(|s| s == atoms.net_wm_state_fullscreen));

        Ok(Self {
            window,
            normal: is_normal_type(&types, atoms.net_wm_window_type_normal, transient),
            full_screen,
            class,
            instance,
            caption: window_caption(ctx.conn, window, atoms)?,
            conn: ctx.conn,
            opacity_atom: atoms.net_wm_window_opacity,
        })
    }
}

impl HostWindow for ClientWindow<'_> {
    fn is_normal_window(&self) -> bool {
        self.normal
    }

    fn is_full_screen(&self) -> bool {
        self.full_screen
    }

    fn resource_class(&self) -> Option<String> {
        self.class.clone()
    }

    fn resource_name(&self) -> Option<String> {
        self.instance.clone()
    }

    fn caption(&self) -> Option<String> {
        self.caption.clone()
    }

    fn set_opacity(&self, opacity: f64) -> Result<()> {
        let value = opacity_to_cardinal(opacity);
        debug!(window = self.window, opacity = opacity, value = value, "Setting _NET_WM_WINDOW_OPACITY");
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.opacity_atom,
                AtomEnum::CARDINAL,
                &[value],
            )
            .context(format!("Failed to send opacity change for window {}", self.window))?
            .check()
            .context(format!("X server rejected opacity change for window {}", self.window))?;
        Ok(())
    }
}

fn get_property(
    conn: &RustConnection,
    window: Window,
    property: Atom,
    type_: Atom,
) -> Result<GetPropertyReply> {
    conn.get_property(false, window, property, type_, 0, TEXT_PROPERTY_LENGTH)
        .context(format!("Failed to query property {property} for window {window}"))?
        .reply()
        .context(format!("Failed to get property {property} reply for window {window}"))
}

/// `_NET_WM_NAME` (UTF-8), falling back to `WM_NAME`
fn window_caption(conn: &RustConnection, window: Window, atoms: &CachedAtoms) -> Result<Option<String>> {
    let net_name = get_property(conn, window, atoms.net_wm_name, atoms.utf8_string)?;
    let prop = if net_name.value.is_empty() {
        get_property(conn, window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())?
    } else {
        net_name
    };
    Ok(Some(String::from_utf8_lossy(&prop.value).into_owned()).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_wm_class() {
        assert_eq!(
            split_wm_class(b"konsole\0Konsole\0"),
            (Some("konsole".into()), Some("Konsole".into()))
        );
        assert_eq!(
            split_wm_class(b"Navigator\0firefox"),
            (Some("Navigator".into()), Some("firefox".into()))
        );
    }

    #[test]
    fn test_split_wm_class_missing_parts() {
        assert_eq!(split_wm_class(b""), (None, None));
        assert_eq!(split_wm_class(b"only\0"), (Some("only".into()), None));
        assert_eq!(split_wm_class(b"\0Class\0"), (None, Some("Class".into())));
    }

    #[test]
    fn test_opacity_to_cardinal() {
        assert_eq!(opacity_to_cardinal(1.0), OPACITY_OPAQUE);
        assert_eq!(opacity_to_cardinal(0.0), 0);
        assert_eq!(opacity_to_cardinal(0.5), 0x8000_0000);
        assert_eq!(opacity_to_cardinal(0.25), 1_073_741_824);
        assert_eq!(opacity_to_cardinal(2.0), OPACITY_OPAQUE);
    }

    #[test]
    fn test_is_normal_type() {
        let normal = 100;
        let dialog = 101;
        assert!(is_normal_type(&[], normal, false));
        assert!(!is_normal_type(&[], normal, true));
        assert!(is_normal_type(&[normal], normal, false));
        assert!(is_normal_type(&[normal], normal, true));
        assert!(!is_normal_type(&[dialog], normal, false));
    }
}
