//! Text-frame transport seam between the connection manager and the socket.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};
use url::Url;

use crate::error::TransportError;

pub type TextSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// One open link. The stream ends (or yields an error) when the link is lost.
pub struct Session {
    pub sink: TextSink,
    pub stream: TextStream,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Session, TransportError>;
}

pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Session, TransportError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|err| TransportError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        let (ws_writer, ws_reader) = ws_stream.split();

        let sink = ws_writer
            .with(|text: String| future::ready(Ok::<_, WsError>(Message::Text(text))))
            .sink_map_err(|err| TransportError::Send(err.to_string()));

        let stream = ws_reader.filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Close(_)) => Some(Err(TransportError::Closed)),
                // pings are answered by tungstenite itself
                Ok(_) => None,
                Err(err) => Some(Err(TransportError::Receive(err.to_string()))),
            })
        });

        Ok(Session {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

/// Accepts `ws://`/`wss://` URLs as-is, rewrites `http(s)://` to the matching
/// websocket scheme, and treats a bare host as `ws://<host>/ws`.
pub fn normalize_gateway_url(raw: &str) -> Result<String, TransportError> {
    let raw = raw.trim();
    let candidate = if let Some(rest) = raw.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = raw.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if raw.contains("://") {
        raw.to_string()
    } else {
        crate::config::gateway_for_host(raw)
    };

    let url = Url::parse(&candidate).map_err(|err| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(TransportError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            })
        }
    }
    if url.host_str().is_none() {
        return Err(TransportError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_gateway_urls() {
        assert_eq!(
            normalize_gateway_url("ws://192.168.1.40/ws").expect("ws"),
            "ws://192.168.1.40/ws"
        );
        assert_eq!(
            normalize_gateway_url("http://192.168.1.40/ws").expect("http"),
            "ws://192.168.1.40/ws"
        );
        assert_eq!(
            normalize_gateway_url("https://panel.example/ws").expect("https"),
            "wss://panel.example/ws"
        );
        assert_eq!(
            normalize_gateway_url("192.168.1.40").expect("bare host"),
            "ws://192.168.1.40/ws"
        );
    }

    #[test]
    fn rejects_non_websocket_urls() {
        assert!(matches!(
            normalize_gateway_url("ftp://192.168.1.40/ws"),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(matches!(
            normalize_gateway_url("ws://"),
            Err(TransportError::InvalidUrl { .. })
        ));
    }
}
