//! Event fan-out to external listeners.

use tether_types::{PermissionRequest, StreamEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A stream event paired with the session it belongs to.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub event: StreamEvent,
}

/// Fan-out point decoupling decoding from presentation.
///
/// Two logical channels: the stream-event channel and the
/// permission-request channel. Subscribing returns a broadcast receiver;
/// dropping the receiver unsubscribes.
#[derive(Debug, Clone)]
pub struct EventBus {
    stream_tx: broadcast::Sender<SessionEvent>,
    permission_tx: broadcast::Sender<PermissionRequest>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (stream_tx, _) = broadcast::channel(capacity);
        let (permission_tx, _) = broadcast::channel(capacity);
        Self {
            stream_tx,
            permission_tx,
        }
    }

    /// Subscribe to the stream-event channel.
    pub fn subscribe_stream(&self) -> broadcast::Receiver<SessionEvent> {
        self.stream_tx.subscribe()
    }

    /// Subscribe to the permission-request channel.
    pub fn subscribe_permissions(&self) -> broadcast::Receiver<PermissionRequest> {
        self.permission_tx.subscribe()
    }

    /// Deliver a stream event. Having no subscribers is not an error.
    pub fn emit_stream(&self, session_id: Uuid, event: StreamEvent) {
        let _ = self.stream_tx.send(SessionEvent { session_id, event });
    }

    /// Deliver a permission request on the side channel.
    pub fn emit_permission(&self, request: PermissionRequest) {
        let _ = self.permission_tx.send(request);
    }
}
