use std::sync::Arc;

use shared::{
    domain::{ButtonId, ChannelId, VarName},
    protocol::Intent,
};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod presentation;
pub mod reconciler;
pub mod transport;
pub mod ui_state;

pub use codec::{Codec, Feedback};
pub use config::{load_settings, PanelConfig};
pub use connection::{ConnectionManager, ConnectionState, LinkEvent};
pub use error::{ClientError, ConfigError, TransportError};
pub use presentation::{slider_layout, slider_layouts, SliderLayout};
pub use reconciler::Reconciler;
pub use transport::{normalize_gateway_url, Connector, Session, WsConnector};
pub use ui_state::{AnalogDisplay, LabelDisplay, ToggleDisplay, UiChange, UiSnapshot, UiStateModel};

const INBOX_CAPACITY: usize = 256;
const OUTBOUND_CAPACITY: usize = 64;
const NOTICE_CAPACITY: usize = 256;

/// Everything the reactor reacts to, from the link or from the user.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Link(LinkEvent),
    Intent(Intent),
}

impl From<LinkEvent> for PanelEvent {
    fn from(event: LinkEvent) -> Self {
        Self::Link(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelNotice {
    Link(ConnectionState),
    Changed(UiChange),
}

/// Handle to a running panel: a connection manager task and the reactor
/// task that owns the UI-state model. Dropping the handle stops both.
pub struct PanelClient {
    config: Arc<PanelConfig>,
    codec: Codec,
    inbox: mpsc::Sender<PanelEvent>,
    snapshots: watch::Receiver<UiSnapshot>,
    notices: broadcast::Sender<PanelNotice>,
    tasks: Vec<JoinHandle<()>>,
}

impl PanelClient {
    /// Connects to `config.gateway_url` over a real websocket.
    pub fn connect(config: Arc<PanelConfig>) -> Result<Self, ClientError> {
        Self::start(config, Arc::new(WsConnector))
    }

    pub fn start(
        config: Arc<PanelConfig>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let url = normalize_gateway_url(&config.gateway_url)?;

        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(UiSnapshot::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let reactor = Reactor {
            reconciler: Reconciler::new(Arc::clone(&config)),
            model: UiStateModel::default(),
            connection: ConnectionState::default(),
            revision: 0,
            outbound: outbound_tx,
            snapshots: snapshot_tx,
            notices: notices.clone(),
        };
        let manager = ConnectionManager::new(
            connector,
            url.clone(),
            config.reconnect_delay(),
            config.logger,
            outbound_rx,
        );

        info!(%url, decimals = config.decimals, "panel: starting");
        let tasks = vec![
            tokio::spawn(reactor.run(inbox_rx)),
            tokio::spawn(manager.run(inbox_tx.clone())),
        ];

        Ok(Self {
            codec: Codec::new(Arc::clone(&config)),
            config,
            inbox: inbox_tx,
            snapshots: snapshot_rx,
            notices,
            tasks,
        })
    }

    pub fn press(&self, button: impl Into<ButtonId>) -> Result<(), ClientError> {
        let intent = self.codec.press(button.into())?;
        self.submit(intent)
    }

    pub fn toggle(&self, channel: impl Into<ChannelId>) -> Result<(), ClientError> {
        let intent = self.codec.toggle(channel.into())?;
        self.submit(intent)
    }

    /// `raw` is in display units; it is scaled to the wire representation.
    pub fn tune(&self, channel: impl Into<ChannelId>, raw: f64) -> Result<(), ClientError> {
        let intent = self.codec.tune(channel.into(), raw)?;
        self.submit(intent)
    }

    pub fn set(&self, name: impl Into<VarName>, raw: f64) -> Result<(), ClientError> {
        let intent = self.codec.set(name.into(), raw)?;
        self.submit(intent)
    }

    fn submit(&self, intent: Intent) -> Result<(), ClientError> {
        self.inbox
            .try_send(PanelEvent::Intent(intent))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(event) => {
                    warn!(?event, "panel: inbox full; intent dropped");
                    ClientError::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => ClientError::Shutdown,
            })
    }

    pub fn snapshot(&self) -> UiSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<UiSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<PanelNotice> {
        self.notices.subscribe()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn sliders(&self) -> Vec<SliderLayout> {
        slider_layouts(&self.config)
    }

    pub async fn shutdown(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            task.abort();
            let _ = task.await;
        }
        info!("panel: stopped");
    }
}

impl Drop for PanelClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Sole owner of the UI-state model. Each event is handled to completion
/// before the next one is taken from the inbox.
struct Reactor {
    reconciler: Reconciler,
    model: UiStateModel,
    connection: ConnectionState,
    revision: u64,
    outbound: mpsc::Sender<Intent>,
    snapshots: watch::Sender<UiSnapshot>,
    notices: broadcast::Sender<PanelNotice>,
}

impl Reactor {
    async fn run(mut self, mut inbox: mpsc::Receiver<PanelEvent>) {
        while let Some(event) = inbox.recv().await {
            self.handle(event);
        }
        debug!("panel: inbox closed; reactor stopped");
    }

    fn handle(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Link(LinkEvent::Feedback(text)) => {
                if let Some(change) = self.reconciler.apply(&mut self.model, &text) {
                    self.publish();
                    let _ = self.notices.send(PanelNotice::Changed(change));
                }
            }
            PanelEvent::Link(link) => {
                let Some(state) = link.state() else {
                    return;
                };
                if state == ConnectionState::Open {
                    // rebuilt from the resync reply
                    self.model.reset();
                }
                self.set_connection(state);
            }
            PanelEvent::Intent(intent) => self.forward(intent),
        }
    }

    fn forward(&mut self, intent: Intent) {
        if self.connection != ConnectionState::Open {
            debug!(intent = intent.name(), state = %self.connection, "panel: link not open; intent dropped");
            return;
        }
        match self.outbound.try_send(intent) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(intent)) => {
                warn!(intent = intent.name(), "panel: outbound queue full; intent dropped");
            }
            Err(mpsc::error::TrySendError::Closed(intent)) => {
                warn!(intent = intent.name(), "panel: connection manager gone; intent dropped");
            }
        }
    }

    fn set_connection(&mut self, state: ConnectionState) {
        self.connection = state;
        self.publish();
        let _ = self.notices.send(PanelNotice::Link(state));
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshots.send_replace(UiSnapshot {
            revision: self.revision,
            connection: self.connection,
            model: self.model.clone(),
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
