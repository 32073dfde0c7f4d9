use std::path::PathBuf;

use shared::error::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid gateway url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to connect websocket {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("websocket send failed: {0}")]
    Send(String),
    #[error("websocket receive failed: {0}")]
    Receive(String),
    #[error("websocket closed by peer")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid panel configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("panel event queue is full; intent dropped")]
    QueueFull,
    #[error("panel client has shut down")]
    Shutdown,
}
