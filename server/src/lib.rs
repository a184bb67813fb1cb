//! # Position Relay Server Library
//!
//! This library provides the relay server for the shared 2D space. Clients
//! connect over WebSocket, receive an identity, report their position and
//! chat, and hear about everyone else's moves, messages and departures.
//!
//! ## Core Responsibilities
//!
//! ### Admission
//! Every accepted connection is given the next `client_<n>` identity, told
//! that identity, and sent the current position of every connected client
//! (itself included).
//!
//! ### Fan-out
//! Position updates and chat messages are relayed to every connected
//! client, the sender included. Departures are announced to everyone who
//! is left. There is no interest management: everybody hears everything.
//!
//! ### Containment
//! Malformed frames are dropped without closing the connection. A client
//! that stops reading only loses its own frames; broadcasts to everyone
//! else carry on.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Connection tasks decode frames and forward them over a channel to one
//! router task that owns the session registry. Registry mutations and the
//! broadcasts they trigger are applied one event at a time, which rules out
//! duplicate or missing sessions while an event is being handled.
//!
//! ### Non-Blocking Writes
//! Each connection has a bounded outbound queue drained by its own writer
//! task. The router only ever `try_send`s into those queues, so a slow or
//! dead peer can never stall a broadcast.
//!
//! ## Module Organization
//!
//! - `session_registry`: identities, connection handles and positions
//! - `router`: admission, fan-out and disconnect handling
//! - `network`: TCP accept loop, WebSocket handshake and per-connection loop
//! - `error`: send failures on a client's outbound queue
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = Server::bind("0.0.0.0:3000", ServerConfig::default()).await?;
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod network;
pub mod router;
pub mod session_registry;

pub use error::SendError;
pub use network::{Server, ServerConfig};
pub use router::{Router, ServerEvent};
pub use session_registry::{ConnectionHandle, Session, SessionId, SessionRegistry};
