// Transport abstraction over the duplex connection
//
// The connection task owns its transport through these traits; production
// code speaks WebSocket via tokio-tungstenite, tests inject a scripted
// in-memory implementation.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use groundlink_common::Result;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::debug;
use url::Url;

/// Opens duplex connections to the telemetry source.
#[async_trait]
pub trait Transport: Send + 'static {
    type Conn: Connection + 'static;

    async fn connect(&mut self, endpoint: &Url) -> Result<Self::Conn>;
}

/// One live duplex connection carrying text frames.
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Next inbound text frame. `None` means the peer closed the stream.
    async fn recv(&mut self) -> Option<Result<String>>;

    async fn close(&mut self);
}

/// Production WebSocket transport.
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    type Conn = WsConnection;

    async fn connect(&mut self, endpoint: &Url) -> Result<WsConnection> {
        let (stream, _) = connect_async(endpoint.clone()).await?;
        Ok(WsConnection { stream })
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.stream.send(Message::Text(frame)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        debug!("dropping non-UTF-8 binary frame");
                        continue;
                    }
                },
                // The library answers pings on the next flush.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(Message::Close(_)) => return None,
                Ok(Message::Frame(_)) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
