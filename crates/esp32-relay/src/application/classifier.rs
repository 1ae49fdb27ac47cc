//! Role classifier for connections that have not declared a role yet.
//!
//! Only consulted while a connection is [`RoleState::Unassigned`]; once a
//! role is fixed the relay hands every envelope straight to the router.
//!
//! [`RoleState::Unassigned`]: crate::domain::RoleState::Unassigned

use crate::domain::messages::Envelope;
use crate::domain::role::Role;

/// What the first meaningful message says about an unclassified connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Answer with a pong and keep waiting; a peer may probe before it
    /// declares itself.
    Probe,

    /// Fix the connection's role.
    Assign {
        role: Role,
        /// Reply to the new HTML client with the device's connectivity.
        /// Set for the implicit handshake, not for a leading position command.
        send_status: bool,
    },
}

/// Decides the role of an unclassified connection from one envelope.
///
/// | Envelope                    | Outcome                     |
/// |-----------------------------|-----------------------------|
/// | `DeviceAnnounce`            | Device                      |
/// | `Ping`                      | Probe (stays unassigned)    |
/// | `Position`                  | Html, command is then routed|
/// | `Result` / `Other`          | Html + status reply         |
pub fn classify(envelope: &Envelope) -> Classification {
    match envelope {
        Envelope::DeviceAnnounce => Classification::Assign {
            role: Role::Device,
            send_status: false,
        },
        Envelope::Ping => Classification::Probe,
        Envelope::Position(_) => Classification::Assign {
            role: Role::Html,
            send_status: false,
        },
        // A result report from a socket that never announced itself is not a
        // device; it falls through to the implicit browser handshake.
        Envelope::Result(_) | Envelope::Other => Classification::Assign {
            role: Role::Html,
            send_status: true,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::messages::PositionCommand;

    #[test]
    fn test_announce_assigns_device() {
        assert_eq!(
            classify(&Envelope::DeviceAnnounce),
            Classification::Assign {
                role: Role::Device,
                send_status: false
            }
        );
    }

    #[test]
    fn test_ping_does_not_assign() {
        assert_eq!(classify(&Envelope::Ping), Classification::Probe);
    }

    #[test]
    fn test_position_assigns_html_without_status() {
        let env = Envelope::Position(PositionCommand {
            raw: r#"{"row":1,"col":2}"#.to_string(),
            row: json!(1),
            col: json!(2),
        });
        assert_eq!(
            classify(&env),
            Classification::Assign {
                role: Role::Html,
                send_status: false
            }
        );
    }

    #[test]
    fn test_other_assigns_html_with_status() {
        assert_eq!(
            classify(&Envelope::Other),
            Classification::Assign {
                role: Role::Html,
                send_status: true
            }
        );
    }

    #[test]
    fn test_unannounced_result_is_treated_as_handshake() {
        assert_eq!(
            classify(&Envelope::Result(true)),
            Classification::Assign {
                role: Role::Html,
                send_status: true
            }
        );
    }
}
