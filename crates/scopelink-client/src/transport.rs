//! WebSocket transport: decodes server frames into notifications and
//! writes outbound requests as JSON-RPC
//!
//! One long-lived task owns the socket. When the socket ends it reports
//! `ConnectionLost` to the replica and waits for a reconnect signal;
//! requests submitted while disconnected are dropped. Reconnect signals
//! received while a socket is live are discarded.

use futures::{SinkExt, StreamExt};
use scopelink_core::{Error, Notification, OutboundRequest, Result, ServerFrame};
use scopelink_replica::Outbound;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMsg, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// `Outbound` that hands requests to the transport task.
pub struct ChannelOutbound {
    tx: mpsc::UnboundedSender<OutboundRequest>,
}

impl ChannelOutbound {
    pub fn new(tx: mpsc::UnboundedSender<OutboundRequest>) -> Self {
        Self { tx }
    }
}

impl Outbound for ChannelOutbound {
    fn submit(&self, request: OutboundRequest) {
        if let Err(e) = self.tx.send(request) {
            warn!("Transport gone, dropping {}", e.0.method());
        }
    }
}

/// Channels the transport task reads from and writes to.
pub struct TransportLinks {
    pub inbound: mpsc::Sender<Notification>,
    pub outbound: mpsc::UnboundedReceiver<OutboundRequest>,
    pub reconnect: mpsc::Receiver<()>,
    pub cancel: CancellationToken,
}

enum Ended {
    Cancelled,
    Lost(Error),
}

#[derive(Debug, Clone)]
pub struct Transport {
    url: String,
    token: Option<String>,
}

impl Transport {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token,
        }
    }

    pub async fn connect(&self) -> Result<WsStream> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::connect_failed(&self.url, e.to_string()))?;
        info!("Connected to {}", self.url);
        Ok(ws)
    }

    /// Drive `first`, then any reconnected sockets, until cancelled.
    pub async fn run(self, first: WsStream, mut links: TransportLinks) {
        let mut req_id: u64 = 0;
        let mut socket = Some(first);

        loop {
            if let Some(ws) = socket.take() {
                match self.drive(ws, &mut links, &mut req_id).await {
                    Ended::Cancelled => return,
                    Ended::Lost(e) => {
                        warn!("Connection to {} lost: {}", self.url, e);
                        if links.inbound.send(Notification::ConnectionLost).await.is_err() {
                            return;
                        }
                    }
                }
            }

            tokio::select! {
                _ = links.cancel.cancelled() => return,
                signal = links.reconnect.recv() => {
                    if signal.is_none() {
                        return;
                    }
                    match self.connect().await {
                        Ok(ws) => socket = Some(ws),
                        Err(e) => {
                            let report = Notification::TransportError {
                                code: -1,
                                message: e.to_string(),
                            };
                            if links.inbound.send(report).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                request = links.outbound.recv() => match request {
                    Some(r) => warn!("Not connected, dropping {}", r.method()),
                    None => return,
                },
            }
        }
    }

    async fn drive(&self, ws: WsStream, links: &mut TransportLinks, req_id: &mut u64) -> Ended {
        let (mut ws_tx, mut ws_rx) = ws.split();

        if let Some(token) = &self.token {
            *req_id += 1;
            let auth = OutboundRequest::Auth {
                token: token.clone(),
            }
            .to_rpc(format!("req-{}", req_id));
            match serde_json::to_string(&auth) {
                Ok(json) => {
                    if let Err(e) = ws_tx.send(WsMsg::Text(json)).await {
                        return Ended::Lost(Error::connection_closed(e.to_string()));
                    }
                }
                Err(e) => warn!("Failed to encode auth request: {}", e),
            }
        }

        loop {
            tokio::select! {
                _ = links.cancel.cancelled() => {
                    let _ = ws_tx.send(WsMsg::Close(None)).await;
                    return Ended::Cancelled;
                }

                msg = ws_rx.next() => match msg {
                    Some(Ok(WsMsg::Text(text))) => {
                        let frame = match ServerFrame::decode(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                let preview: String = text.chars().take(100).collect();
                                warn!("Undecodable frame ({}): {}", e, preview);
                                continue;
                            }
                        };
                        if let Some(notification) = frame.into_notification() {
                            if links.inbound.send(notification).await.is_err() {
                                return Ended::Cancelled;
                            }
                        }
                    }
                    Some(Ok(WsMsg::Close(_))) | None => {
                        return Ended::Lost(Error::connection_closed("closed by server"));
                    }
                    Some(Err(e)) => return Ended::Lost(Error::connection_closed(e.to_string())),
                    _ => {} // Binary, Ping, Pong: ignore
                },

                signal = links.reconnect.recv() => {
                    if signal.is_none() {
                        return Ended::Cancelled;
                    }
                    debug!("Already connected to {}, ignoring reconnect", self.url);
                }

                request = links.outbound.recv() => {
                    let Some(request) = request else {
                        return Ended::Cancelled;
                    };
                    *req_id += 1;
                    let rpc = request.to_rpc(format!("req-{}", req_id));
                    debug!("Sending {} ({})", rpc.method, rpc.id);
                    match serde_json::to_string(&rpc) {
                        Ok(json) => {
                            if let Err(e) = ws_tx.send(WsMsg::Text(json)).await {
                                return Ended::Lost(Error::connection_closed(e.to_string()));
                            }
                        }
                        Err(e) => warn!("Failed to encode {}: {}", rpc.method, e),
                    }
                }
            }
        }
    }
}
