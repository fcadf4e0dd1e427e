//! Realtime channel over GraphQL-over-WebSocket (`graphql-transport-ws`).
//!
//! The channel is only created when the host reports a realtime-capable
//! environment. Handshake parameters are computed at connect time, so a token
//! stored after the channel was created is still used.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};

use crate::auth::store::{current_token, TokenStore};
use crate::error::{CrmError, ErrorEnvelope, Result};

type RealtimeWebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket subprotocol spoken by the backend.
pub const GRAPHQL_TRANSPORT_WS: &str = "graphql-transport-ws";

const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);
const SUBSCRIPTION_BUFFER: usize = 16;

/// Whether the host environment can hold a realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeCapability {
    Available,
    Unavailable,
}

/// Stream of `next` payloads for one subscription.
pub type RealtimeSubscription = ReceiverStream<Result<Value>>;

#[derive(Debug, Serialize, Deserialize)]
struct WsFrame {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl WsFrame {
    fn new(frame_type: &str, id: Option<String>, payload: Option<Value>) -> Self {
        Self {
            frame_type: frame_type.to_string(),
            id,
            payload,
        }
    }
}

/// Factory-built handle for the subscription endpoint.
#[derive(Clone)]
pub struct RealtimeChannel {
    url: String,
    store: Arc<dyn TokenStore>,
    ack_timeout: Duration,
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("url", &self.url)
            .field("ack_timeout", &self.ack_timeout)
            .finish_non_exhaustive()
    }
}

impl RealtimeChannel {
    /// Build the channel, or `None` when the host has no realtime capability.
    pub fn create(
        capability: RealtimeCapability,
        url: impl Into<String>,
        store: Arc<dyn TokenStore>,
    ) -> Option<Self> {
        match capability {
            RealtimeCapability::Available => Some(Self {
                url: url.into(),
                store,
                ack_timeout: DEFAULT_ACK_TIMEOUT,
            }),
            RealtimeCapability::Unavailable => None,
        }
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handshake parameters, reading the token now rather than at setup.
    ///
    /// With no stored token this carries the literal `Bearer undefined`.
    pub fn connection_params(&self) -> Value {
        let token = current_token(self.store.as_ref());
        let token = token.as_deref().unwrap_or("undefined");
        json!({
            "headers": {
                "Authorization": format!("Bearer {token}"),
            }
        })
    }

    /// Open the socket, send `connection_init`, and wait for `connection_ack`.
    pub async fn connect(&self) -> Result<RealtimeConnection> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|err| CrmError::Configuration(format!("invalid realtime URL: {err}")))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
        );

        let (mut socket, _) = connect_async(request)
            .await
            .map_err(|err| CrmError::Realtime(format!("websocket connect failed: {err}")))?;
        debug!(url = %self.url, "realtime socket open");

        let init = WsFrame::new("connection_init", None, Some(self.connection_params()));
        send_frame(&mut socket, &init).await?;

        tokio::time::timeout(self.ack_timeout, await_ack(&mut socket))
            .await
            .map_err(|_| CrmError::Realtime("connection_ack timeout".to_string()))??;
        debug!(url = %self.url, "realtime connection acknowledged");

        Ok(RealtimeConnection { socket })
    }
}

/// An acknowledged connection, ready for one subscription.
pub struct RealtimeConnection {
    socket: RealtimeWebSocket,
}

impl std::fmt::Debug for RealtimeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConnection").finish_non_exhaustive()
    }
}

impl RealtimeConnection {
    /// Start a subscription; the connection moves into a background task that
    /// forwards every `next` payload until `complete`, an error, or close.
    pub async fn subscribe(
        mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<RealtimeSubscription> {
        let id = uuid::Uuid::new_v4().to_string();
        let subscribe = WsFrame::new(
            "subscribe",
            Some(id.clone()),
            Some(json!({ "query": query.into(), "variables": variables })),
        );
        send_frame(&mut self.socket, &subscribe).await?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        tokio::spawn(forward_frames(self.socket, id, tx));
        Ok(ReceiverStream::new(rx))
    }

    /// Close the socket without subscribing.
    pub async fn close(mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .map_err(|err| CrmError::Realtime(format!("websocket close failed: {err}")))
    }
}

async fn forward_frames(
    mut socket: RealtimeWebSocket,
    id: String,
    tx: mpsc::Sender<Result<Value>>,
) {
    while let Some(message) = socket.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Ping(payload)) => {
                let _ = socket.send(Message::Pong(payload)).await;
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                let _ = tx
                    .send(Err(CrmError::Realtime(format!("websocket read failed: {err}"))))
                    .await;
                break;
            }
        };

        let frame: WsFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(err) => {
                let _ = tx.send(Err(CrmError::from(err))).await;
                break;
            }
        };

        if frame.id.as_deref().is_some_and(|frame_id| frame_id != id) {
            continue;
        }

        match frame.frame_type.as_str() {
            "next" => {
                let payload = frame.payload.unwrap_or(Value::Null);
                let item = match ErrorEnvelope::from_graphql_body(&payload) {
                    Some(envelope) => Err(CrmError::from(envelope)),
                    None => Ok(payload),
                };
                if tx.send(item).await.is_err() {
                    break;
                }
            }
            "error" => {
                let _ = tx.send(Err(CrmError::from(subscription_error(frame.payload)))).await;
                break;
            }
            "complete" => break,
            "ping" => {
                let pong = WsFrame::new("pong", None, frame.payload);
                if send_frame(&mut socket, &pong).await.is_err() {
                    break;
                }
            }
            "pong" => {}
            other => {
                warn!(frame_type = other, "unexpected realtime frame");
            }
        }
    }

    debug!(subscription_id = %id, "realtime subscription ended");
    let _ = socket.close(None).await;
}

async fn await_ack(socket: &mut RealtimeWebSocket) -> Result<()> {
    while let Some(message) = socket.next().await {
        let message =
            message.map_err(|err| CrmError::Realtime(format!("websocket read failed: {err}")))?;
        let text = match message {
            Message::Text(text) => text,
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
                continue;
            }
            Message::Close(_) => break,
            _ => continue,
        };
        let frame: WsFrame = serde_json::from_str(&text)?;
        match frame.frame_type.as_str() {
            "connection_ack" => return Ok(()),
            "ping" => {
                send_frame(socket, &WsFrame::new("pong", None, frame.payload)).await?;
            }
            other => {
                return Err(CrmError::Realtime(format!(
                    "expected connection_ack, got {other}"
                )));
            }
        }
    }
    Err(CrmError::Realtime("connection closed before ack".to_string()))
}

async fn send_frame(socket: &mut RealtimeWebSocket, frame: &WsFrame) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    socket
        .send(Message::Text(text))
        .await
        .map_err(|err| CrmError::Realtime(format!("websocket send failed: {err}")))
}

fn subscription_error(payload: Option<Value>) -> ErrorEnvelope {
    let errors = match payload {
        Some(Value::Array(errors)) => Value::Array(errors),
        Some(single @ Value::Object(_)) => Value::Array(vec![single]),
        _ => return ErrorEnvelope::unknown(),
    };
    ErrorEnvelope::from_graphql_body(&json!({ "errors": errors }))
        .unwrap_or_else(ErrorEnvelope::unknown)
}
