use anyhow::Result;
use tracing::debug;
use x11rb::protocol::Event;

use super::Daemon;
use crate::config::SettingsSource;

/// The window manager rewrites `_NET_CLIENT_LIST` on the root window
/// whenever a client is managed or unmanaged; that is the only event the
/// daemon acts on.
pub fn handle_event<S: SettingsSource>(daemon: &mut Daemon<'_, S>, event: Event) -> Result<()> {
    match event {
        Event::PropertyNotify(event)
            if event.window == daemon.root() && event.atom == daemon.client_list_atom() =>
        {
            daemon.refresh_clients()?;
        }
        Event::Error(error) => {
            debug!(error = ?error, "X11 error event");
        }
        _ => (),
    }
    Ok(())
}
