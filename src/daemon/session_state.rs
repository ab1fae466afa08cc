use std::collections::HashSet;
use x11rb::protocol::xproto::Window;

/// Runtime state for client tracking
/// Window IDs are session-only and never persisted
#[derive(Debug, Default)]
pub struct SessionState {
    /// Clients seen in the last `_NET_CLIENT_LIST` snapshot
    pub known_clients: HashSet<Window>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known set with `current` and return the clients that were
    /// not in the previous snapshot, in `current` order, each at most once.
    pub fn update_clients(&mut self, current: &[Window]) -> Vec<Window> {
        let previous = std::mem::take(&mut self.known_clients);
        let mut appeared = Vec::new();
        for &window in current {
            if self.known_clients.insert(window) && !previous.contains(&window) {
                appeared.push(window);
            }
        }
        appeared
    }
}
