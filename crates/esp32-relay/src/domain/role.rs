//! Peer roles and the per-connection role state machine.
//!
//! ```text
//!              ┌──────────► Html    (terminal)
//! Unassigned ──┤
//!              └──────────► Device  (terminal)
//! ```
//!
//! A connection starts `Unassigned` and is classified by its first
//! meaningful message.  Once assigned, the role never changes for the
//! lifetime of the socket.

use std::fmt;

use thiserror::Error;

/// The two peer categories the relay connects.  Each role owns one slot in
/// the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The browser control page.
    Html,
    /// The ESP32 device.
    Device,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Html => f.write_str("html"),
            Role::Device => f.write_str("device"),
        }
    }
}

/// Attempted to assign a role to a connection that already has one.
#[derive(Debug, Error, PartialEq)]
#[error("connection already classified as {current}; cannot become {requested}")]
pub struct RoleError {
    pub current: Role,
    pub requested: Role,
}

/// Classification state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleState {
    #[default]
    Unassigned,
    Assigned(Role),
}

impl RoleState {
    /// The fixed role, if the connection has been classified.
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Unassigned => None,
            RoleState::Assigned(role) => Some(*role),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, RoleState::Unassigned)
    }

    /// Moves `Unassigned` to `Assigned(role)`.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError`] if a role was already assigned, even if it is
    /// the same one.
    pub fn assign(&mut self, role: Role) -> Result<(), RoleError> {
        match *self {
            RoleState::Unassigned => {
                *self = RoleState::Assigned(role);
                Ok(())
            }
            RoleState::Assigned(current) => Err(RoleError {
                current,
                requested: role,
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
