//! Opacity daemon - watches X11 clients and applies the opacity policy

mod event_handler;
mod session_state;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::config::{FileSettings, SettingsSource};
use crate::exclusion::Exclusions;
use crate::policy::{self, Decision, SkipReason};
use crate::window::WindowIdentity;
use crate::x11_utils::{client_list, AppContext, CachedAtoms, ClientWindow};

use event_handler::handle_event;
use session_state::SessionState;

/// Long-lived daemon state: the X11 context, where settings come from, the
/// exclusion cache and the clients seen so far.
pub struct Daemon<'a, S: SettingsSource> {
    ctx: AppContext<'a>,
    settings: S,
    exclusions: Exclusions,
    session: SessionState,
}

impl<'a, S: SettingsSource> Daemon<'a, S> {
    pub fn new(ctx: AppContext<'a>, settings: S) -> Self {
        Self {
            ctx,
            settings,
            exclusions: Exclusions::new(),
            session: SessionState::new(),
        }
    }

    /// Apply the policy to every current client. Returns how many windows
    /// were eligible for the configured opacity.
    pub fn apply_all(&mut self) -> Result<usize> {
        let clients = client_list(&self.ctx).context("Failed to get initial list of client windows")?;
        self.session.update_clients(&clients);
        Ok(self.apply_to(&clients, false))
    }

    /// Re-read `_NET_CLIENT_LIST` and apply the policy to clients that were
    /// not there before.
    pub fn refresh_clients(&mut self) -> Result<()> {
        let clients = client_list(&self.ctx)?;
        let appeared = self.session.update_clients(&clients);
        if !appeared.is_empty() {
            self.apply_to(&appeared, true);
        }
        Ok(())
    }

    /// One trigger: settings are read once, then each window is handled.
    /// A window that fails (usually because it closed meanwhile) is logged
    /// and skipped.
    fn apply_to(&mut self, windows: &[Window], new: bool) -> usize {
        let settings = self.settings.read();
        let mut applied = 0;
        for &window in windows {
            let client = match ClientWindow::query(&self.ctx, window) {
                Ok(client) => client,
                Err(e) => {
                    warn!(window = window, error = %format!("{e:#}"), "Failed to read client window");
                    continue;
                }
            };
            if new && settings.show_new_window_names {
                info!(
                    window = window,
                    class = ?client.class,
                    name = ?client.instance,
                    caption = ?client.caption,
                    "New window"
                );
            }
            if let Decision::Apply(_) = policy::apply(&client, &settings, &mut self.exclusions) {
                applied += 1;
            }
        }
        debug!(
            windows = windows.len(),
            applied = applied,
            compilations = self.exclusions.cache().compilations(),
            "Handled window trigger"
        );
        applied
    }

    fn root(&self) -> Window {
        self.ctx.screen.root
    }

    fn client_list_atom(&self) -> Atom {
        self.ctx.atoms.net_client_list
    }
}

fn connect() -> Result<(RustConnection, usize)> {
    let (conn, screen_num) = x11rb::connect(None)
        .context("Failed to connect to X11 server. Is DISPLAY set correctly?")?;
    info!(screen = screen_num, "Connected to X11 server");
    Ok((conn, screen_num))
}

pub fn run_daemon(settings: FileSettings, once: bool) -> Result<()> {
    let (conn, screen_num) = connect()?;
    let screen = &conn.setup().roots[screen_num];

    if let Err(e) = settings.write_default_if_missing() {
        warn!(error = %format!("{e:#}"), "Could not create default settings file");
    }
    info!(path = %settings.path().display(), "Reading settings from file on every event");

    // Pre-cache atoms once at startup (eliminates roundtrip overhead)
    let atoms = CachedAtoms::new(&conn)
        .context("Failed to cache X11 atoms at startup")?;

    conn.change_window_attributes(
        screen.root,
        &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
    )
    .context("Failed to set event mask on root window")?;
    conn.flush()
        .context("Failed to flush X11 connection after selecting root events")?;

    let ctx = AppContext {
        conn: &conn,
        screen,
        atoms: &atoms,
    };
    let mut daemon = Daemon::new(ctx, settings);

    let applied = daemon.apply_all()?;
    info!(count = applied, "Applied opacity to existing windows");
    if once {
        return Ok(());
    }

    info!("Opacity daemon running");

    loop {
        let event = conn.wait_for_event()
            .context("Failed to wait for X11 event")?;
        let _ = handle_event(&mut daemon, event)
            .inspect_err(|err| error!(error = ?err, "Event handling error"));
    }
}

/// Print every client with its identity and the policy's decision, without
/// touching any window.
pub fn list_clients(settings: &impl SettingsSource) -> Result<()> {
    let (conn, screen_num) = connect()?;
    let screen = &conn.setup().roots[screen_num];
    let atoms = CachedAtoms::new(&conn)
        .context("Failed to cache X11 atoms")?;
    let ctx = AppContext {
        conn: &conn,
        screen,
        atoms: &atoms,
    };

    let settings = settings.read();
    let mut exclusions = Exclusions::new();
    for window in client_list(&ctx)? {
        let client = match ClientWindow::query(&ctx, window) {
            Ok(client) => client,
            Err(e) => {
                warn!(window = window, error = %format!("{e:#}"), "Failed to read client window");
                continue;
            }
        };
        let identity = WindowIdentity::of(&client);
        let decision = match policy::decide(&client, &settings, &mut exclusions) {
            Decision::Apply(opacity) => format!("opacity {:.0}%", opacity * 100.0),
            Decision::Skip(SkipReason::NotNormal) => "skip (not a normal window)".to_string(),
            Decision::Skip(SkipReason::FullScreen) => "skip (full-screen)".to_string(),
            Decision::Skip(SkipReason::Excluded) => "skip (excluded)".to_string(),
        };
        println!("{window:#010x}  {:<28}  {decision}", identity.as_str());
    }
    Ok(())
}
