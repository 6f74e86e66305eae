//! Error types for Scopelink

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage(message.into())
    }

    pub fn connect_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn connection_closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed(reason.into())
    }
}
