use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    codec::{Codec, Feedback},
    config::PanelConfig,
    ui_state::{AnalogDisplay, LabelDisplay, ToggleDisplay, UiChange, UiStateModel},
};

/// Applies controller feedback to the UI-state model. Unrecognized and
/// unparsable messages are dropped without touching the model.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: Arc<PanelConfig>,
    codec: Codec,
}

impl Reconciler {
    pub fn new(config: Arc<PanelConfig>) -> Self {
        Self {
            codec: Codec::new(Arc::clone(&config)),
            config,
        }
    }

    pub fn apply(&self, model: &mut UiStateModel, text: &str) -> Option<UiChange> {
        let change = self.derive_change(text)?;
        model.apply(&change);
        Some(change)
    }

    fn derive_change(&self, text: &str) -> Option<UiChange> {
        match self.codec.classify(text) {
            Feedback::Label { text, slot, active } => Some(UiChange::Label {
                slot,
                display: LabelDisplay {
                    text,
                    color: self.config.color(active).to_string(),
                },
            }),
            Feedback::Toggle { channel, on } => {
                if !self.config.is_registered_toggle(&channel) {
                    warn!(channel = %channel, "reconcile: feedback for unknown toggle ignored");
                    return None;
                }
                Some(UiChange::Toggle {
                    id: channel,
                    display: ToggleDisplay {
                        checked: on,
                        label: if on { "ON" } else { "OFF" },
                        color: self.config.color(on).to_string(),
                    },
                })
            }
            Feedback::Analog { id, wire_value } => {
                if !self.config.is_registered_analog(&id) {
                    warn!(id = %id, "reconcile: feedback for unknown analog control ignored");
                    return None;
                }
                let scale = match self.config.scale() {
                    Ok(scale) => scale,
                    Err(err) => {
                        warn!(%err, "reconcile: analog feedback dropped");
                        return None;
                    }
                };
                Some(UiChange::Analog {
                    id,
                    display: AnalogDisplay {
                        value: scale.from_wire(wire_value),
                        readout: scale.readout(wire_value),
                    },
                })
            }
            Feedback::Unrecognized => {
                debug!(len = text.len(), "reconcile: unrecognized feedback dropped");
                None
            }
        }
    }
}
