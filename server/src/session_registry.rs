//! Session tracking for the relay server
//!
//! This module owns everything the server knows about its connected clients:
//! - Identity assignment (`client_1`, `client_2`, ... never reused)
//! - The outbound channel used to reach each client
//! - Each client's last reported position
//!
//! The registry is a plain owned value. The router task holds the only
//! instance, so every operation here runs to completion before the next
//! event is looked at and no locking is needed.

use crate::error::SendError;
use log::info;
use shared::{ClientState, Position, ID_PREFIX};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Identity of a session, unique for the lifetime of the process
///
/// Rendered on the wire as `client_<n>`. Ordering follows admission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ID_PREFIX, self.0)
    }
}

/// Write side of a client connection
///
/// Cloning is cheap; every clone feeds the same bounded queue, which the
/// connection's writer task drains into the socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    peer: SocketAddr,
    sender: mpsc::Sender<Message>,
}

impl ConnectionHandle {
    pub fn new(peer: SocketAddr, sender: mpsc::Sender<Message>) -> Self {
        Self { peer, sender }
    }

    /// Remote address of the client
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Queues a frame without waiting
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        self.sender.try_send(message).map_err(SendError::from)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A connected client as the server sees it
#[derive(Debug)]
pub struct Session {
    /// Identity assigned at admission
    pub id: SessionId,
    /// Last position reported by this client
    pub position: Position,
    connection: ConnectionHandle,
}

impl Session {
    /// Creates a session at the origin
    pub fn new(id: SessionId, connection: ConnectionHandle) -> Self {
        Self {
            id,
            position: Position::ORIGIN,
            connection,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }
}

/// Authoritative map of live sessions
///
/// Ids come from a counter that only moves forward, so a removed client's
/// id is never handed out again. Operations on unknown ids are silent
/// no-ops: a message that races with its sender's disconnect must not
/// bring the session back.
pub struct SessionRegistry {
    /// Live sessions keyed by their id
    sessions: BTreeMap<SessionId, Session>,
    /// Counter value for the next admitted client
    next_session_id: u64,
}

impl SessionRegistry {
    /// Creates an empty registry; the first id handed out is `client_1`
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_session_id: 1,
        }
    }

    /// Admits a connection and returns its freshly allocated id
    ///
    /// The session starts at the origin and is visible to every read that
    /// follows, including the snapshot taken for its own initial state.
    pub fn register(&mut self, connection: ConnectionHandle) -> SessionId {
        let id = SessionId(self.next_session_id);
        self.next_session_id += 1;

        info!("Client {} connected from {}", id, connection.peer());
        self.sessions.insert(id, Session::new(id, connection));

        id
    }

    /// Removes a session
    ///
    /// Returns true if the session was found and removed, false if it was
    /// already gone. Error and close can both fire for the same connection,
    /// so the second call is expected and harmless.
    pub fn remove(&mut self, id: &SessionId) -> bool {
        if let Some(session) = self.sessions.remove(id) {
            info!("Client {} disconnected", session.id);
            true
        } else {
            false
        }
    }

    /// Overwrites the stored position of a live session
    ///
    /// Only the position field changes; id and connection stay as they
    /// were. Returns false without touching anything if the id is unknown.
    pub fn update_position(&mut self, id: &SessionId, position: Position) -> bool {
        if let Some(session) = self.sessions.get_mut(id) {
            session.position = position;
            true
        } else {
            false
        }
    }

    /// Point-in-time copy of every session's id and position, in admission order
    pub fn snapshot(&self) -> Vec<ClientState> {
        self.sessions
            .values()
            .map(|session| ClientState {
                id: session.id.to_string(),
                position: session.position,
            })
            .collect()
    }

    /// Calls `f` with the handle of every live session
    ///
    /// The callback decides what to do with a handle whose queue is closed
    /// or full; the walk always visits every session.
    pub fn for_each_connection<F>(&self, mut f: F)
    where
        F: FnMut(&SessionId, &ConnectionHandle),
    {
        for (id, session) in &self.sessions {
            f(id, session.connection());
        }
    }

    /// Handle of a single session, if it is still registered
    pub fn connection(&self, id: &SessionId) -> Option<&ConnectionHandle> {
        self.sessions.get(id).map(Session::connection)
    }

    pub fn position(&self, id: &SessionId) -> Option<Position> {
        self.sessions.get(id).map(|session| session.position)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
