//! Connection manager: one live session at a time, a full-state request on
//! every successful handshake, and an unconditional fixed-delay reconnect.

use std::{fmt, sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use shared::protocol::Intent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::transport::{Connector, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connecting { attempt: u64 },
    Opened { attempt: u64 },
    Feedback(String),
    Closed { reason: String },
}

impl LinkEvent {
    pub fn state(&self) -> Option<ConnectionState> {
        match self {
            Self::Connecting { .. } => Some(ConnectionState::Connecting),
            Self::Opened { .. } => Some(ConnectionState::Open),
            Self::Closed { .. } => Some(ConnectionState::Closed),
            Self::Feedback(_) => None,
        }
    }
}

enum SessionEnd {
    Lost(String),
    Shutdown,
}

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    url: String,
    reconnect_delay: Duration,
    logger: bool,
    outbound: mpsc::Receiver<Intent>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        url: impl Into<String>,
        reconnect_delay: Duration,
        logger: bool,
        outbound: mpsc::Receiver<Intent>,
    ) -> Self {
        Self {
            connector,
            url: url.into(),
            reconnect_delay,
            logger,
            outbound,
        }
    }

    /// Runs until the outbound queue or the event receiver is dropped. Link
    /// loss never ends the loop.
    pub async fn run<E>(self, events: mpsc::Sender<E>)
    where
        E: From<LinkEvent> + Send + 'static,
    {
        let Self {
            connector,
            url,
            reconnect_delay,
            logger,
            mut outbound,
        } = self;

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            if logger {
                info!(attempt, %url, "link: trying to open websocket");
            }
            if !emit(&events, LinkEvent::Connecting { attempt }).await {
                return;
            }

            let connect = connector.connect(&url);
            tokio::pin!(connect);
            let connected = loop {
                tokio::select! {
                    result = &mut connect => break result,
                    intent = outbound.recv() => match intent {
                        Some(intent) => drop_intent(&intent, ConnectionState::Connecting),
                        None => return,
                    },
                }
            };

            let reason = match connected {
                Ok(session) => {
                    match run_session(session, attempt, &mut outbound, &events, logger).await {
                        SessionEnd::Lost(reason) => reason,
                        SessionEnd::Shutdown => return,
                    }
                }
                Err(err) => err.to_string(),
            };

            warn!(attempt, %reason, delay_ms = reconnect_delay.as_millis() as u64, "link: closed; reconnect scheduled");
            if !emit(&events, LinkEvent::Closed { reason }).await {
                return;
            }

            let delay = tokio::time::sleep(reconnect_delay);
            tokio::pin!(delay);
            loop {
                tokio::select! {
                    _ = &mut delay => break,
                    intent = outbound.recv() => match intent {
                        Some(intent) => drop_intent(&intent, ConnectionState::Closed),
                        None => return,
                    },
                }
            }
        }
    }
}

async fn run_session<E>(
    session: Session,
    attempt: u64,
    outbound: &mut mpsc::Receiver<Intent>,
    events: &mpsc::Sender<E>,
    logger: bool,
) -> SessionEnd
where
    E: From<LinkEvent> + Send + 'static,
{
    let Session {
        mut sink,
        mut stream,
    } = session;

    if !emit(events, LinkEvent::Opened { attempt }).await {
        return SessionEnd::Shutdown;
    }

    // Written before the outbound queue is polled, so it always leads.
    let resync = match Intent::full_resync().encode() {
        Ok(text) => text,
        Err(err) => return SessionEnd::Lost(err.to_string()),
    };
    if logger {
        info!(attempt, "link: websocket opened; requesting full update");
    }
    if let Err(err) = sink.send(resync).await {
        return SessionEnd::Lost(err.to_string());
    }

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(text)) => {
                    if logger {
                        info!(feedback = %text, "link: feedback");
                    }
                    if !emit(events, LinkEvent::Feedback(text)).await {
                        return SessionEnd::Shutdown;
                    }
                }
                Some(Err(err)) => return SessionEnd::Lost(err.to_string()),
                None => return SessionEnd::Lost("stream ended".to_string()),
            },
            intent = outbound.recv() => match intent {
                Some(intent) => {
                    let text = match intent.encode() {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(intent = intent.name(), %err, "link: failed to encode intent");
                            continue;
                        }
                    };
                    if logger {
                        info!(intent = intent.name(), message = %text, "link: intent sent");
                    }
                    if let Err(err) = sink.send(text).await {
                        return SessionEnd::Lost(err.to_string());
                    }
                }
                None => {
                    let _ = sink.close().await;
                    return SessionEnd::Shutdown;
                }
            },
        }
    }
}

async fn emit<E>(events: &mpsc::Sender<E>, event: LinkEvent) -> bool
where
    E: From<LinkEvent>,
{
    events.send(E::from(event)).await.is_ok()
}

fn drop_intent(intent: &Intent, state: ConnectionState) {
    debug!(intent = intent.name(), %state, "link: not open; intent dropped");
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
