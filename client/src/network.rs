use crate::input::{parse_command, Command, Wanderer, WANDER_STEP};
use crate::world::WorldView;
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{decode_outbound, encode_inbound, InboundMessage, OutboundMessage, Position};
use std::error::Error;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type ClientResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// A connection to the relay plus everything learned over it
pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    world: WorldView,
}

impl Client {
    pub async fn connect(url: &str) -> ClientResult<Self> {
        info!("Connecting to {}...", url);
        let (ws, _) = connect_async(url).await?;

        Ok(Client {
            ws,
            world: WorldView::new(),
        })
    }

    pub fn world(&self) -> &WorldView {
        &self.world
    }

    pub async fn send(&mut self, message: &InboundMessage) -> ClientResult<()> {
        let text = encode_inbound(message)?;
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    pub async fn send_position(&mut self, x: f64, y: f64) -> ClientResult<()> {
        self.send(&InboundMessage::PositionUpdate {
            position: Position::new(x, y),
        })
        .await
    }

    pub async fn send_chat(&mut self, text: &str) -> ClientResult<()> {
        self.send(&InboundMessage::ChatMessage {
            text: text.to_string(),
        })
        .await
    }

    /// Sends a raw text frame, bypassing the encoder
    pub async fn send_raw(&mut self, text: &str) -> ClientResult<()> {
        self.ws.send(Message::text(text.to_string())).await?;
        Ok(())
    }

    /// Waits for the next relay message and folds it into the world view
    ///
    /// Returns `None` once the relay closes the connection. Frames that do
    /// not decode are logged and skipped.
    pub async fn next_message(&mut self) -> ClientResult<Option<OutboundMessage>> {
        while let Some(frame) = self.ws.next().await {
            match frame? {
                Message::Text(text) => match decode_outbound(text.as_str()) {
                    Ok(message) => {
                        self.world.apply(&message);
                        return Ok(Some(message));
                    }
                    Err(e) => warn!("Ignoring frame from server: {}", e),
                },
                Message::Close(frame) => {
                    if let Some(frame) = frame {
                        info!("Server closed the connection: {}", frame.reason.as_str());
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }

        Ok(None)
    }

    pub async fn close(&mut self) -> ClientResult<()> {
        self.ws.close(None).await?;
        Ok(())
    }

    /// Reads commands from stdin and prints relay traffic until either side quits
    pub async fn run_interactive(&mut self) -> ClientResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                message = self.next_message() => match message? {
                    Some(message) => println!("{}", self.world.describe(&message)),
                    None => break,
                },
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_command(&line).await? {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        if let Err(e) = self.close().await {
            warn!("Error while closing connection: {}", e);
        }
        Ok(())
    }

    /// Returns false when the user asked to quit
    async fn handle_command(&mut self, line: &str) -> ClientResult<bool> {
        match parse_command(line) {
            Some(Command::Move(position)) => {
                self.send(&InboundMessage::PositionUpdate { position })
                    .await?
            }
            Some(Command::Chat(text)) => self.send(&InboundMessage::ChatMessage { text }).await?,
            Some(Command::Who) => println!("{}", self.world.roster()),
            Some(Command::Quit) => return Ok(false),
            Some(Command::Invalid(hint)) => eprintln!("{}", hint),
            None => {}
        }
        Ok(true)
    }

    /// Posts a random walk every `period` and prints relay traffic
    pub async fn run_wander(&mut self, period: Duration) -> ClientResult<()> {
        let mut rng = StdRng::from_entropy();
        let mut wanderer = Wanderer::new(WANDER_STEP);
        let mut ticker = interval(period);

        loop {
            tokio::select! {
                message = self.next_message() => match message? {
                    Some(message) => println!("{}", self.world.describe(&message)),
                    None => break,
                },
                _ = ticker.tick() => {
                    let position = wanderer.next_position(&mut rng);
                    if let Err(e) = self.send(&InboundMessage::PositionUpdate { position }).await {
                        error!("Error sending position: {}", e);
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
