//! Event routing: decides who hears about what
//!
//! The router holds no session state of its own. Every method takes the
//! registry it should act on, reads it, updates it through its operations,
//! and writes outbound frames through the handles the registry holds.

use crate::session_registry::{ConnectionHandle, SessionId, SessionRegistry};
use log::{debug, error, info, warn};
use shared::{encode, InboundMessage, OutboundMessage};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

/// Events sent from connection tasks to the router task
#[derive(Debug)]
pub enum ServerEvent {
    /// A WebSocket handshake completed; the reply carries the assigned id,
    /// or `None` if the server refused the connection
    Connect {
        connection: ConnectionHandle,
        reply: oneshot::Sender<Option<SessionId>>,
    },
    /// A frame from an admitted session decoded successfully
    Inbound {
        session_id: SessionId,
        message: InboundMessage,
    },
    /// The session's connection closed or failed
    Disconnect { session_id: SessionId },
}

/// Stateless fan-out policy
#[derive(Debug, Clone, Default)]
pub struct Router {
    max_clients: Option<usize>,
}

impl Router {
    /// Creates a router; `max_clients` caps admissions when set
    pub fn new(max_clients: Option<usize>) -> Self {
        Self { max_clients }
    }

    /// Applies one event to the registry
    pub fn handle_event(&self, registry: &mut SessionRegistry, event: ServerEvent) {
        match event {
            ServerEvent::Connect { connection, reply } => {
                let admitted = self.admit(registry, connection);
                if reply.send(admitted).is_err() {
                    // Handler went away before learning its id
                    if let Some(id) = admitted {
                        self.handle_disconnect(registry, &id);
                    }
                }
            }
            ServerEvent::Inbound {
                session_id,
                message,
            } => {
                self.handle_inbound(registry, &session_id, message);
            }
            ServerEvent::Disconnect { session_id } => {
                self.handle_disconnect(registry, &session_id);
            }
        }
    }

    /// Registers a connection and sends it `id_assigned` then `initial_state`
    ///
    /// Returns `None` without allocating an id when the server is full.
    pub fn admit(
        &self,
        registry: &mut SessionRegistry,
        connection: ConnectionHandle,
    ) -> Option<SessionId> {
        if let Some(max_clients) = self.max_clients {
            if registry.len() >= max_clients {
                warn!(
                    "Refusing connection from {}: server full ({} clients)",
                    connection.peer(),
                    max_clients
                );
                return None;
            }
        }

        let id = registry.register(connection);

        self.send_to(registry, &id, &OutboundMessage::IdAssigned { id: id.to_string() });

        let states = registry.snapshot();
        self.send_to(registry, &id, &OutboundMessage::InitialState { states });

        Some(id)
    }

    /// Handles a decoded message from `sender`
    ///
    /// Returns how many connections the resulting broadcast was queued on.
    /// Messages from sessions that are no longer registered are dropped
    /// silently; they lost a race with their own disconnect.
    pub fn handle_inbound(
        &self,
        registry: &mut SessionRegistry,
        sender: &SessionId,
        message: InboundMessage,
    ) -> usize {
        if !registry.contains(sender) {
            debug!(
                "Ignoring {} from unregistered session {}",
                message.message_type(),
                sender
            );
            return 0;
        }

        debug!("Message received from {}", sender);

        match message {
            InboundMessage::PositionUpdate { position } => {
                registry.update_position(sender, position);
                self.broadcast(
                    registry,
                    &OutboundMessage::MoveUpdate {
                        id: sender.to_string(),
                        position,
                    },
                )
            }
            InboundMessage::ChatMessage { text } => {
                info!("Message from client {} \"{}\" streamed to all clients", sender, text);
                self.broadcast(
                    registry,
                    &OutboundMessage::ChatReceived {
                        sender_id: sender.to_string(),
                        text,
                    },
                )
            }
            InboundMessage::Unknown { raw_type } => {
                warn!("Unknown message type {:?} from {}", raw_type, sender);
                0
            }
        }
    }

    /// Removes a session and tells everyone left
    ///
    /// Returns false, without broadcasting, if the session was never
    /// admitted or has already been removed.
    pub fn handle_disconnect(&self, registry: &mut SessionRegistry, id: &SessionId) -> bool {
        if !registry.remove(id) {
            return false;
        }

        self.broadcast(registry, &OutboundMessage::Disconnected { id: id.to_string() });
        true
    }

    fn send_to(&self, registry: &SessionRegistry, id: &SessionId, message: &OutboundMessage) {
        let Some(connection) = registry.connection(id) else {
            return;
        };
        let Some(frame) = Self::frame(message) else {
            return;
        };

        if let Err(e) = connection.send(frame) {
            warn!("Failed to send to client {}: {}", id, e);
        }
    }

    /// Queues `message` on every registered connection
    ///
    /// The frame is encoded once. A recipient that is closed or backed up
    /// is logged and skipped; the rest still get the frame.
    fn broadcast(&self, registry: &SessionRegistry, message: &OutboundMessage) -> usize {
        let Some(frame) = Self::frame(message) else {
            return 0;
        };

        let mut delivered = 0;
        registry.for_each_connection(|id, connection| match connection.send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Skipping client {} during broadcast: {}", id, e),
        });

        debug!("Broadcast reached {}/{} clients", delivered, registry.len());
        delivered
    }

    fn frame(message: &OutboundMessage) -> Option<Message> {
        match encode(message) {
            Ok(text) => Some(Message::text(text)),
            Err(e) => {
                error!("Failed to encode {:?}: {}", message, e);
                None
            }
        }
    }
}
