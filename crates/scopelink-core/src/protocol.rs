//! WebSocket protocol: JSON push events in, JSON-RPC style requests out
//!
//! Wire format:
//!
//! Server → Client (event push, no id):
//!   { "event": "client.joined", "data": { "scope": "lobby", "name": "alice" } }
//!
//! Server → Client (RPC response):
//!   { "id": "req-3", "result": { "ok": true } }
//!   { "id": "req-3", "error": { "code": 4, "message": "no such scope" } }
//!
//! Client → Server (RPC request):
//!   { "id": "req-3", "method": "scope.leave", "params": { "scope": "lobby" } }

use crate::error::{Error, Result};
use crate::types::{FunctionDef, ModulePackage, ScopeName, ScopeSnapshot};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Server → Client: notifications
// ---------------------------------------------------------------------------

/// A state-change notification asserted by the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Notification {
    #[serde(rename = "scope.created")]
    ScopeCreated { scope: ScopeName },

    #[serde(rename = "scope.deleted")]
    ScopeDeleted { scope: ScopeName },

    #[serde(rename = "client.joined")]
    ClientJoined { scope: ScopeName, name: String },

    #[serde(rename = "client.left")]
    ClientLeft { scope: ScopeName, name: String },

    #[serde(rename = "variable.defined")]
    VariableDefined {
        scope: ScopeName,
        id: String,
        definition: String,
    },

    #[serde(rename = "function.defined")]
    FunctionDefined {
        scope: ScopeName,
        id: String,
        #[serde(flatten)]
        def: FunctionDef,
    },

    #[serde(rename = "scope.message")]
    Message {
        scope: ScopeName,
        sender: String,
        text: String,
    },

    #[serde(rename = "package.loaded")]
    PackageLoaded { package: ModulePackage },

    #[serde(rename = "package.unloaded")]
    PackageUnloaded { name: String },

    #[serde(rename = "scope.entered")]
    EnteredScope {
        scope: ScopeName,
        #[serde(flatten)]
        snapshot: ScopeSnapshot,
    },

    #[serde(rename = "init")]
    InitInfo {
        #[serde(default)]
        scopes: Vec<ScopeName>,
        #[serde(default)]
        packages: Vec<ModulePackage>,
    },

    /// Generic error code reported by the server or the transport.
    #[serde(rename = "error")]
    TransportError {
        code: i32,
        #[serde(default)]
        message: String,
    },

    /// Synthesized locally when the socket closes; never sent by the server.
    #[serde(skip)]
    ConnectionLost,
}

impl Notification {
    /// Short name of the event kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScopeCreated { .. } => "scope.created",
            Self::ScopeDeleted { .. } => "scope.deleted",
            Self::ClientJoined { .. } => "client.joined",
            Self::ClientLeft { .. } => "client.left",
            Self::VariableDefined { .. } => "variable.defined",
            Self::FunctionDefined { .. } => "function.defined",
            Self::Message { .. } => "scope.message",
            Self::PackageLoaded { .. } => "package.loaded",
            Self::PackageUnloaded { .. } => "package.unloaded",
            Self::EnteredScope { .. } => "scope.entered",
            Self::InitInfo { .. } => "init",
            Self::TransportError { .. } => "error",
            Self::ConnectionLost => "connection.lost",
        }
    }

    /// Encode for the wire. `ConnectionLost` has no wire form.
    pub fn to_json(&self) -> Result<String> {
        if matches!(self, Self::ConnectionLost) {
            return Err(Error::invalid_message("connection.lost is local-only"));
        }
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Server → Client: RPC response
// ---------------------------------------------------------------------------

/// RPC response to an outbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// RPC error detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// Anything the server may send on the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    Event(Notification),
    Response(RpcResponse),
}

impl ServerFrame {
    /// Decode a text frame. Frames with an `event` key are notifications,
    /// frames with an `id` key are RPC responses.
    pub fn decode(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if value.get("event").is_some() {
            let event = serde_json::from_value(value)
                .map_err(|e| Error::invalid_message(format!("bad event: {}", e)))?;
            Ok(Self::Event(event))
        } else if value.get("id").is_some() {
            let response = serde_json::from_value(value)
                .map_err(|e| Error::invalid_message(format!("bad response: {}", e)))?;
            Ok(Self::Response(response))
        } else {
            Err(Error::invalid_message("frame has neither event nor id"))
        }
    }

    /// The notification this frame applies to the replica, if any.
    /// Successful responses carry no state; error responses surface as
    /// transport errors.
    pub fn into_notification(self) -> Option<Notification> {
        match self {
            Self::Event(n) => Some(n),
            Self::Response(RpcResponse {
                error: Some(err), ..
            }) => Some(Notification::TransportError {
                code: err.code,
                message: err.message,
            }),
            Self::Response(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server: JSON-RPC style
// ---------------------------------------------------------------------------

/// RPC request sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Requests the client issues to the authority. All are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    Auth { token: String },
    EnterScope { scope: ScopeName },
    LeaveScope { scope: ScopeName },
    SendMessage { scope: ScopeName, text: String },
}

impl OutboundRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::EnterScope { .. } => "scope.enter",
            Self::LeaveScope { .. } => "scope.leave",
            Self::SendMessage { .. } => "scope.message",
        }
    }

    pub fn to_rpc(&self, id: impl Into<String>) -> RpcRequest {
        let params = match self {
            Self::Auth { token } => serde_json::json!({ "token": token }),
            Self::EnterScope { scope } | Self::LeaveScope { scope } => {
                serde_json::json!({ "scope": scope.as_str() })
            }
            Self::SendMessage { scope, text } => {
                serde_json::json!({ "scope": scope.as_str(), "text": text })
            }
        };
        RpcRequest {
            id: id.into(),
            method: self.method().to_string(),
            params,
        }
    }
}
