//! Replica event loop
//!
//! A single task owns the `Replica`. It takes notifications from the
//! transport and commands from the terminal, one at a time, so a query never
//! observes a half-applied notification.

use crate::command::Command;
use crate::config::ClientConfig;
use crate::transport::{ChannelOutbound, Transport, TransportLinks};
use scopelink_core::{Error, Notification, Result, ScopeName};
use scopelink_replica::{LinkState, Observation, Replica, ReplicaError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of a command, for the terminal to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Scopes(Vec<ScopeName>),
    Clients(Vec<String>),
    Current(Option<ScopeName>),
    Observations(Vec<Observation>),
    Rejected(ReplicaError),
    Notice(String),
}

impl Reply {
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Scopes(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
            Self::Clients(clients) => clients.clone(),
            Self::Current(Some(scope)) => vec![format!("Current scope: {}", scope)],
            Self::Current(None) => vec!["No current scope".to_string()],
            Self::Observations(obs) => obs.iter().flat_map(|o| o.lines()).collect(),
            Self::Rejected(e) => vec![e.to_string()],
            Self::Notice(text) => vec![text.clone()],
        }
    }
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Reply>,
}

/// Cloneable handle to a running `ClientRuntime`.
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: mpsc::Sender<Request>,
    observations: broadcast::Sender<Observation>,
    cancel: CancellationToken,
}

impl RuntimeHandle {
    /// Observations produced by incoming notifications.
    ///
    /// Delivery is lossy: the channel holds the last 1024 observations, and a
    /// receiver that falls further behind gets `RecvError::Lagged(n)` and
    /// never sees the skipped ones. Command replies are not affected.
    pub fn subscribe(&self) -> broadcast::Receiver<Observation> {
        self.observations.subscribe()
    }

    pub async fn execute(&self, command: Command) -> Result<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Request {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::Internal("runtime stopped".to_string()))?;
        reply_rx
            .await
            .map_err(|_| Error::Internal("runtime dropped the reply".to_string()))
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

pub struct ClientRuntime {
    replica: Replica,
    autofocus: bool,
    observations: broadcast::Sender<Observation>,
    reconnect: mpsc::Sender<()>,
}

impl ClientRuntime {
    pub fn new(replica: Replica, autofocus: bool, reconnect: mpsc::Sender<()>) -> Self {
        let (observations, _) = broadcast::channel(1024);
        Self {
            replica,
            autofocus,
            observations,
            reconnect,
        }
    }

    /// Spawn the event loop. It stops when `cancel` fires or the inbound
    /// channel closes.
    pub fn spawn(
        self,
        inbound: mpsc::Receiver<Notification>,
        cancel: CancellationToken,
    ) -> RuntimeHandle {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let handle = RuntimeHandle {
            commands: commands_tx,
            observations: self.observations.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(self.run(inbound, commands_rx, cancel));
        handle
    }

    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<Notification>,
        mut commands: mpsc::Receiver<Request>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                notification = inbound.recv() => {
                    let Some(notification) = notification else {
                        info!("Inbound channel closed");
                        break;
                    };
                    self.on_notification(notification);
                }

                request = commands.recv() => {
                    let Some(Request { command, reply }) = request else {
                        break;
                    };
                    let result = self.on_command(command);
                    let _ = reply.send(result);
                }
            }
        }
        debug!("Runtime stopped");
    }

    fn publish(&self, observation: Observation) {
        // No subscribers is fine; nobody is watching.
        let _ = self.observations.send(observation);
    }

    fn on_notification(&mut self, notification: Notification) {
        let observation = self.replica.apply(notification);
        let entered = match &observation {
            Observation::EnteredScope { scope, .. } => Some(scope.clone()),
            _ => None,
        };
        self.publish(observation);

        if let Some(scope) = entered {
            if self.autofocus && self.replica.current_scope().is_none() {
                if let Ok(focused) = self.replica.focus_scope(scope.as_str()) {
                    self.publish(focused);
                }
            }
        }
    }

    fn on_command(&mut self, command: Command) -> Reply {
        let r = &mut self.replica;
        match command {
            Command::Scopes => Reply::Scopes(r.list_known_scopes()),
            Command::Clients => Reply::Clients(r.list_current_scope_clients()),
            Command::Variables => Reply::Observations(r.dump_current_scope_variables()),
            Command::Functions => Reply::Observations(r.dump_current_scope_functions()),
            Command::Packages => Reply::Observations(r.dump_all_packages()),
            Command::Current => Reply::Current(r.current_scope().cloned()),
            Command::Open(name) => into_reply(r.focus_scope(&name)),
            Command::Leave(name) => into_reply(r.leave_scope(&name)),
            Command::Say(text) => into_reply(r.send_message(&text)),
            Command::Enter(name) => Reply::Observations(vec![r.request_enter(&name)]),
            Command::Reconnect => {
                if r.link_state() == LinkState::Connected {
                    return Reply::Notice("Already connected".to_string());
                }
                match self.reconnect.try_send(()) {
                    Ok(()) => Reply::Notice("Reconnecting...".to_string()),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        Reply::Notice("Reconnect already in progress".to_string())
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        Reply::Notice("Transport has shut down".to_string())
                    }
                }
            }
            Command::Quit => Reply::Notice("Bye".to_string()),
        }
    }
}

fn into_reply(result: std::result::Result<Observation, ReplicaError>) -> Reply {
    match result {
        Ok(observation) => Reply::Observations(vec![observation]),
        Err(e) => Reply::Rejected(e),
    }
}

/// Dial the server and start the transport and runtime tasks.
pub async fn start_client(
    config: &ClientConfig,
    cancel: CancellationToken,
) -> Result<RuntimeHandle> {
    let url = config.server_url()?;
    let transport = Transport::new(url.as_str(), config.server.token.clone());
    let first = transport.connect().await?;

    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (reconnect_tx, reconnect_rx) = mpsc::channel(1);

    let links = TransportLinks {
        inbound: inbound_tx,
        outbound: outbound_rx,
        reconnect: reconnect_rx,
        cancel: cancel.clone(),
    };
    tokio::spawn(transport.run(first, links));

    let replica = Replica::new(Arc::new(ChannelOutbound::new(outbound_tx)));
    let runtime = ClientRuntime::new(replica, config.session.autofocus, reconnect_tx);
    Ok(runtime.spawn(inbound_rx, cancel))
}
