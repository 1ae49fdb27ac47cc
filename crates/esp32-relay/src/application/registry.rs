//! Connection registry: one slot per [`Role`].
//!
//! The registry is the only state shared between connection tasks.  Each
//! slot sits behind its own mutex since the two are never updated together,
//! and no lock is held across an `.await` (every operation is synchronous).
//!
//! # Invariants
//!
//! - A slot holds at most one connection.
//! - A slot is cleared only by the teardown of the connection it holds
//!   ([`Registry::release_if_current`]), so a slow-closing old socket can
//!   never evict the live replacement that took its slot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::peer::{ConnectionId, Peer};
use crate::domain::role::Role;

/// Holds the current HTML client and the current device, if any.
///
/// Construct one per relay instance and share it behind an `Arc`; there is no
/// process-wide singleton, so several relays can coexist (e.g. in tests).
#[derive(Debug, Default)]
pub struct Registry {
    html: Mutex<Option<Peer>>,
    device: Mutex<Option<Peer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `peer` as the device and returns the displaced device, if any.
    ///
    /// The displaced connection is not closed; it simply stops being routed to.
    pub fn claim_device(&self, peer: Peer) -> Option<Peer> {
        self.slot(Role::Device).replace(peer)
    }

    /// Installs `peer` as the HTML client and returns the displaced one, if any.
    ///
    /// Callers only invoke this when classifying a previously unassigned
    /// connection, so each connection claims the slot at most once.
    pub fn claim_html(&self, peer: Peer) -> Option<Peer> {
        self.slot(Role::Html).replace(peer)
    }

    /// Clears the `role` slot only if it currently holds connection `id`.
    ///
    /// Returns `true` if the slot was cleared, `false` if it was empty or held
    /// a different connection (in which case nothing changes).
    pub fn release_if_current(&self, role: Role, id: ConnectionId) -> bool {
        let mut slot = self.slot(role);
        match slot.as_ref() {
            Some(current) if current.id() == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the connection occupying the `role` slot.
    pub fn get(&self, role: Role) -> Option<Peer> {
        self.slot(role).clone()
    }

    /// Whether the `role` slot is occupied.
    pub fn is_occupied(&self, role: Role) -> bool {
        self.slot(role).is_some()
    }

    fn slot(&self, role: Role) -> MutexGuard<'_, Option<Peer>> {
        let slot = match role {
            Role::Html => &self.html,
            Role::Device => &self.device,
        };
        // A panic while holding the guard cannot leave an `Option<Peer>` half
        // written, so a poisoned slot is still consistent.
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
