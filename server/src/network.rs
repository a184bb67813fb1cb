//! Server network layer handling WebSocket connections and the router loop

use crate::router::{Router, ServerEvent};
use crate::session_registry::{ConnectionHandle, SessionId, SessionRegistry};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::decode;
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::accept_async;

/// Depth of the queue between connection tasks and the router
const EVENT_QUEUE_SIZE: usize = 1024;

/// Smallest usable outbound queue: admission queues two frames at once
const MIN_SEND_BUFFER: usize = 2;

pub type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Tunables for a relay server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Refuse new connections once this many clients are registered
    pub max_clients: Option<usize>,
    /// Frames that may wait for one client before further frames are dropped
    pub send_buffer: usize,
}

impl ServerConfig {
    fn effective_send_buffer(&self) -> usize {
        self.send_buffer.max(MIN_SEND_BUFFER)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: None,
            send_buffer: 64,
        }
    }
}

/// Relay server: an accept loop feeding a single router task
///
/// Connection tasks never touch the registry. They forward decoded
/// messages over a channel and the router applies them one at a time, so
/// all registry mutations and the broadcasts they cause are serialized.
pub struct Server {
    listener: TcpListener,
    registry: SessionRegistry,
    router: Router,
    config: ServerConfig,

    event_tx: mpsc::Sender<ServerEvent>,
    event_rx: mpsc::Receiver<ServerEvent>,
}

impl Server {
    pub async fn bind(addr: &str, config: ServerConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("WebSocket server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_SIZE);

        Ok(Server {
            listener,
            registry: SessionRegistry::new(),
            router: Router::new(config.max_clients),
            config,
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until the process is stopped
    pub async fn run(self) -> ServerResult<()> {
        let Server {
            listener,
            mut registry,
            router,
            config,
            event_tx,
            mut event_rx,
        } = self;

        tokio::spawn(accept_loop(
            listener,
            event_tx,
            config.effective_send_buffer(),
        ));

        info!("Server started successfully");

        while let Some(event) = event_rx.recv().await {
            router.handle_event(&mut registry, event);
        }

        info!("Server shutting down");
        Ok(())
    }
}

/// Accepts TCP connections and spawns a handler for each
async fn accept_loop(listener: TcpListener, events: mpsc::Sender<ServerEvent>, send_buffer: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tokio::spawn(handle_connection(stream, peer, events.clone(), send_buffer));
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// Drives one client connection from handshake to teardown
///
/// Inbound frames are decoded here; anything that fails to decode is
/// logged and dropped while the connection stays up. However the read
/// side ends (close frame, EOF, transport error, or a failed write), the
/// router hears about it exactly once.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    events: mpsc::Sender<ServerEvent>,
    send_buffer: usize,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };

    let (mut write_half, mut read_half) = ws_stream.split();
    let (tx, mut rx) = mpsc::channel::<Message>(send_buffer);

    let (reply_tx, reply_rx) = oneshot::channel();
    let connect = ServerEvent::Connect {
        connection: ConnectionHandle::new(peer, tx),
        reply: reply_tx,
    };
    if events.send(connect).await.is_err() {
        return;
    }

    let session_id = match reply_rx.await {
        Ok(Some(id)) => id,
        Ok(None) => {
            let frame = CloseFrame {
                code: CloseCode::Again,
                reason: "server full".into(),
            };
            let _ = write_half.send(Message::Close(Some(frame))).await;
            return;
        }
        Err(_) => return,
    };

    let mut writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = write_half.send(message).await {
                debug!("Write to {} failed: {}", peer, e);
                return;
            }
        }
        let _ = write_half.close().await;
    });

    loop {
        let frame = tokio::select! {
            frame = read_half.next() => frame,
            _ = &mut writer => {
                warn!("Lost write side of client {}, closing connection", session_id);
                break;
            }
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    warn!("Dropping non UTF-8 frame from client {}", session_id);
                    continue;
                }
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("Transport error on client {}: {}", session_id, e);
                break;
            }
        };

        if !forward_frame(&events, session_id, &text).await {
            break;
        }
    }

    let _ = events.send(ServerEvent::Disconnect { session_id }).await;
}

/// Decodes one text frame and passes it to the router
///
/// Returns false only if the router is gone.
async fn forward_frame(events: &mpsc::Sender<ServerEvent>, session_id: SessionId, text: &str) -> bool {
    match decode(text) {
        Ok(message) => events
            .send(ServerEvent::Inbound {
                session_id,
                message,
            })
            .await
            .is_ok(),
        Err(e) => {
            warn!("Dropping frame from client {}: {}", session_id, e);
            true
        }
    }
}
