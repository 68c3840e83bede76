//! Relay connection lifecycle.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::events::ServerEvent;
use crate::domain::ConnectionId;

/// Outbound queue of one connection.
pub type EventSender = mpsc::UnboundedSender<Arc<ServerEvent>>;
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<ServerEvent>>;

/// Lifecycle of a relay connection.
///
/// `Connecting -> Authenticated -> Active -> Disconnected`. A connection only
/// exists in the registry once its credential has been verified, so no event
/// is ever processed in `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Upgrade requested, credential not yet verified
    Connecting,
    /// Identity bound, no event processed yet
    Authenticated,
    /// At least one event accepted
    Active,
    /// Terminal; room cleanup has already run
    Disconnected,
}

impl ConnectionState {
    /// Whether events may be processed in this state.
    pub fn accepts_events(self) -> bool {
        matches!(self, Self::Authenticated | Self::Active)
    }

    /// State after an event has been accepted.
    pub fn on_event(self) -> Self {
        match self {
            Self::Authenticated | Self::Active => Self::Active,
            other => other,
        }
    }
}

/// What the transport gets back from a successful connect: its id and the
/// queue of events to write to the socket.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub events: EventReceiver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_authenticated_states_accept_events() {
        assert!(!ConnectionState::Connecting.accepts_events());
        assert!(ConnectionState::Authenticated.accepts_events());
        assert!(ConnectionState::Active.accepts_events());
        assert!(!ConnectionState::Disconnected.accepts_events());
    }

    #[test]
    fn test_first_event_activates() {
        assert_eq!(ConnectionState::Authenticated.on_event(), ConnectionState::Active);
        assert_eq!(ConnectionState::Active.on_event(), ConnectionState::Active);
        assert_eq!(
            ConnectionState::Disconnected.on_event(),
            ConnectionState::Disconnected
        );
    }
}
