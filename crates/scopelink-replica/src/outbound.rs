//! Outbound requests to the authority
//!
//! Everything here is fire-and-forget: the replica never waits for, or
//! reacts to, the outcome of a request.

use scopelink_core::{OutboundRequest, ScopeName};
use std::sync::Mutex;

pub trait Outbound: Send + Sync {
    fn submit(&self, request: OutboundRequest);

    fn leave_scope(&self, scope: &ScopeName) {
        self.submit(OutboundRequest::LeaveScope {
            scope: scope.clone(),
        });
    }

    fn send_message(&self, scope: &ScopeName, text: &str) {
        self.submit(OutboundRequest::SendMessage {
            scope: scope.clone(),
            text: text.to_string(),
        });
    }

    fn enter_scope(&self, scope: &ScopeName) {
        self.submit(OutboundRequest::EnterScope {
            scope: scope.clone(),
        });
    }
}

/// Drops every request.
pub struct NullOutbound;

impl Outbound for NullOutbound {
    fn submit(&self, request: OutboundRequest) {
        tracing::debug!("No transport attached, dropping {}", request.method());
    }
}

/// Keeps every request in memory, in submission order.
#[derive(Default)]
pub struct RecordingOutbound {
    requests: Mutex<Vec<OutboundRequest>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Outbound for RecordingOutbound {
    fn submit(&self, request: OutboundRequest) {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
    }
}
