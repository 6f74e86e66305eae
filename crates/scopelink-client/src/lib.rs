//! Scopelink Client - WebSocket transport, replica event loop, and terminal commands

pub mod command;
pub mod config;
pub mod render;
pub mod runtime;
pub mod transport;

pub use command::{Command, CommandError};
pub use config::ClientConfig;
pub use render::Renderer;
pub use runtime::{start_client, ClientRuntime, Reply, RuntimeHandle};
pub use transport::{ChannelOutbound, Transport};
