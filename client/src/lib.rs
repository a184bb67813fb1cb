//! # Relay Client Library
//!
//! A headless client for the position relay. It connects over WebSocket,
//! keeps a local mirror of every client's position and the chat log, and
//! can be driven either from a terminal or by a random-walk bot.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! The client's view of the shared space, rebuilt from `initial_state` and
//! kept current by every relay message that follows.
//!
//! ### Input Module (`input`)
//! Parses terminal lines into commands (`/move`, `/who`, `/quit`, chat) and
//! generates the bot's random walk.
//!
//! ### Network Module (`network`)
//! Owns the WebSocket connection, encodes outgoing messages and feeds
//! incoming ones into the world view.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut client = Client::connect("ws://127.0.0.1:3000").await?;
//!
//!     // id_assigned, then initial_state
//!     client.next_message().await?;
//!     client.next_message().await?;
//!
//!     client.send_position(5.0, 7.0).await?;
//!     client.send_chat("hello").await?;
//!
//!     println!("{}", client.world().roster());
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod network;
pub mod world;
