//! Client-side mirror of the relay's state

use log::debug;
use shared::{OutboundMessage, Position};
use std::collections::BTreeMap;

/// One line of chat as received from the relay
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub sender: String,
    pub text: String,
}

/// What this client currently believes about the shared space
///
/// Built from `initial_state` and kept current by applying every message
/// the relay sends. There is no join event on the wire, so a client we have
/// never seen shows up with its first `move_update`.
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    client_id: Option<String>,
    positions: BTreeMap<String, Position>,
    chat_log: Vec<ChatLine>,
}

impl WorldView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one relay message into the view
    pub fn apply(&mut self, message: &OutboundMessage) {
        match message {
            OutboundMessage::IdAssigned { id } => {
                self.client_id = Some(id.clone());
            }
            OutboundMessage::InitialState { states } => {
                self.positions = states
                    .iter()
                    .map(|state| (state.id.clone(), state.position))
                    .collect();
            }
            OutboundMessage::MoveUpdate { id, position } => {
                self.positions.insert(id.clone(), *position);
            }
            OutboundMessage::ChatReceived { sender_id, text } => {
                self.chat_log.push(ChatLine {
                    sender: sender_id.clone(),
                    text: text.clone(),
                });
            }
            OutboundMessage::Disconnected { id } => {
                if self.positions.remove(id).is_none() {
                    debug!("Departure of {} we never saw", id);
                }
            }
        }
    }

    /// Identity the relay gave us, once `id_assigned` has arrived
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Known clients and their positions, sorted by id
    pub fn players(&self) -> impl Iterator<Item = (&str, Position)> {
        self.positions.iter().map(|(id, position)| (id.as_str(), *position))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn chat_log(&self) -> &[ChatLine] {
        &self.chat_log
    }

    /// Human-readable line for a relay message
    pub fn describe(&self, message: &OutboundMessage) -> String {
        match message {
            OutboundMessage::IdAssigned { id } => format!("* you are {}", id),
            OutboundMessage::InitialState { states } => {
                format!("* {} client(s) connected", states.len())
            }
            OutboundMessage::MoveUpdate { id, position } => format!(
                "* {} moved to ({}, {})",
                self.label(id),
                position.x,
                position.y
            ),
            OutboundMessage::ChatReceived { sender_id, text } => {
                format!("<{}> {}", self.label(sender_id), text)
            }
            OutboundMessage::Disconnected { id } => format!("* {} left", self.label(id)),
        }
    }

    /// Listing of every known client, one per line
    pub fn roster(&self) -> String {
        self.players()
            .map(|(id, position)| format!("  {} at ({}, {})", self.label(id), position.x, position.y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn label(&self, id: &str) -> String {
        if self.client_id() == Some(id) {
            format!("{} (you)", id)
        } else {
            id.to_string()
        }
    }
}
