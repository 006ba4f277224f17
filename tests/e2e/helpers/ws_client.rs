use anyhow::{bail, Result};
use futures::{SinkExt, StreamExt};
use piper_stream_server::domain::protocol::ServerEvent;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    pub async fn send_json(&mut self, json: serde_json::Value) -> Result<()> {
        self.send_raw(&json.to_string()).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Next server event, or `None` once the server closed the socket
    pub async fn recv(&mut self) -> Result<Option<ServerEvent>> {
        loop {
            let message = match tokio::time::timeout(RECV_TIMEOUT, self.stream.next()).await {
                Ok(Some(Ok(message))) => message,
                Ok(Some(Err(
                    WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Protocol(_),
                ))) => return Ok(None),
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(None) => return Ok(None),
                Err(_) => bail!("timed out waiting for a server event"),
            };
            match message {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Collect events up to and including the first one matching `last`
    pub async fn recv_until(
        &mut self,
        last: impl Fn(&ServerEvent) -> bool,
    ) -> Result<Vec<ServerEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await? {
            let done = last(&event);
            events.push(event);
            if done {
                return Ok(events);
            }
        }
        bail!("connection closed after {} events", events.len())
    }

    /// Drain everything until the server closes the connection
    pub async fn recv_to_close(&mut self) -> Result<Vec<ServerEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await? {
            events.push(event);
        }
        Ok(events)
    }
}
