//! Binance futures kline WebSocket stream.
//!
//! Connects to the per-symbol kline channel and forwards parsed events over
//! a channel. Malformed frames are logged and dropped; a connection failure
//! or server close ends the forwarding task, which closes the channel. The
//! consumer treats a closed channel as the end of the live run; reconnecting
//! is not this layer's job.

use crate::types::KlineEvent;
use crate::Result;
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Kline payload within a stream message.
#[derive(Debug, Deserialize)]
struct WsKline {
    /// Bar open time (ms).
    t: i64,
    o: String,
    h: String,
    l: String,
    c: String,
    v: String,
    /// Whether this bar is closed (final).
    x: bool,
}

#[derive(Debug, Deserialize)]
struct WsKlineMessage {
    k: WsKline,
}

/// Kline stream subscription for one symbol/interval pair.
pub struct KlineStream {
    ws_url: String,
}

impl KlineStream {
    /// Production futures stream base URL.
    pub const DEFAULT_WS_URL: &'static str = "wss://fstream.binance.com/ws";

    pub fn new(ws_url: Option<String>) -> Self {
        Self {
            ws_url: ws_url.unwrap_or_else(|| Self::DEFAULT_WS_URL.to_string()),
        }
    }

    /// Subscribe to kline events for a symbol/interval.
    ///
    /// Returns a channel receiver that yields every kline update (closed or
    /// not). The channel closes when the stream ends or errors.
    pub async fn subscribe(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<mpsc::Receiver<KlineEvent>> {
        let url = format!(
            "{}/{}@kline_{}",
            self.ws_url,
            symbol.to_lowercase(),
            interval
        );
        let (tx, rx) = mpsc::channel(1000);

        // Connect before spawning so subscription failures surface to the caller.
        let (ws_stream, _) = connect_async(&url).await?;
        info!(url = %url, "Subscribed to kline stream");

        tokio::spawn(async move {
            if let Err(e) = Self::ws_loop(ws_stream, &tx).await {
                warn!(error = %e, "Kline stream terminated with error");
            }
        });

        Ok(rx)
    }

    async fn ws_loop(
        ws_stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        tx: &mpsc::Sender<KlineEvent>,
    ) -> Result<()> {
        let (mut write, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let Some(event) = parse_kline_event(&text) else {
                        warn!(payload = %text, "Dropping malformed kline message");
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        info!("Kline receiver dropped, closing stream");
                        return Ok(());
                    }
                }
                Ok(Message::Ping(data)) => {
                    write.send(Message::Pong(data)).await?;
                }
                Ok(Message::Pong(_)) => {
                    debug!("Received websocket pong");
                }
                Ok(Message::Close(_)) => {
                    info!("Kline stream closed by server");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Kline stream receive error: {}", e);
                    return Err(e.into());
                }
                _ => {}
            }
        }

        info!("Kline stream ended");
        Ok(())
    }
}

/// Parse a raw stream frame into a kline event.
///
/// Returns `None` for frames that are not well-formed kline messages.
fn parse_kline_event(text: &str) -> Option<KlineEvent> {
    let msg: WsKlineMessage = serde_json::from_str(text).ok()?;
    let open_time = Utc.timestamp_millis_opt(msg.k.t).single()?;
    Some(KlineEvent {
        open_time,
        open: msg.k.o.parse().ok()?,
        high: msg.k.h.parse().ok()?,
        low: msg.k.l.parse().ok()?,
        close: msg.k.c.parse().ok()?,
        volume: msg.k.v.parse().ok()?,
        is_closed: msg.k.x,
    })
}
