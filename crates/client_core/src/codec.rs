//! Intent encoding and feedback classification.
//!
//! Feedback carries no type tag; its category is decided by shape. The
//! classifiers run in a fixed order (bare label, then `dfb`, then `afb`) and
//! the first one to claim a message decides it. A classifier claims a message
//! as soon as its key is present, even if the rest of the payload turns out to
//! be unusable, so a malformed `dfb` object never falls through to `afb`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use shared::{
    domain::{ButtonId, ChannelId, ControlId, ControlKind, ModeSlot, VarName},
    error::ProtocolError,
    protocol::{
        AnalogFeedback, Intent, ToggleFeedback, ANALOG_FEEDBACK_KEY, TOGGLE_FEEDBACK_KEY,
    },
};

use crate::config::PanelConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Label {
        text: String,
        slot: ModeSlot,
        active: bool,
    },
    Toggle {
        channel: ControlId,
        on: bool,
    },
    Analog {
        id: ControlId,
        wire_value: i64,
    },
    Unrecognized,
}

struct Inbound<'a> {
    raw: &'a str,
    parsed: Option<Value>,
}

impl Inbound<'_> {
    fn object_with_key(&self, key: &str) -> Option<&Value> {
        match &self.parsed {
            Some(value @ Value::Object(map)) if map.contains_key(key) => Some(value),
            _ => None,
        }
    }
}

type Classifier = fn(&Codec, &Inbound<'_>) -> Option<Feedback>;

const CLASSIFIERS: [(&str, Classifier); 3] = [
    ("label", classify_label),
    ("toggle", classify_toggle),
    ("analog", classify_analog),
];

#[derive(Debug, Clone)]
pub struct Codec {
    config: Arc<PanelConfig>,
}

impl Codec {
    pub fn new(config: Arc<PanelConfig>) -> Self {
        Self { config }
    }

    pub fn press(&self, button: ButtonId) -> Result<Intent, ProtocolError> {
        self.require(ControlKind::Button)?;
        if !self.config.is_known_button(&button) {
            return Err(ProtocolError::UnknownButton(button));
        }
        Ok(Intent::press(button))
    }

    pub fn toggle(&self, channel: ChannelId) -> Result<Intent, ProtocolError> {
        self.require(ControlKind::Toggle)?;
        Ok(Intent::toggle(channel))
    }

    pub fn tune(&self, channel: ChannelId, raw: f64) -> Result<Intent, ProtocolError> {
        self.require(ControlKind::AnalogOutput)?;
        Intent::tune(channel, raw, self.config.scale()?)
    }

    pub fn set(&self, name: VarName, raw: f64) -> Result<Intent, ProtocolError> {
        self.require(ControlKind::ControlVariable)?;
        Intent::set(name, raw, self.config.scale()?)
    }

    fn require(&self, kind: ControlKind) -> Result<(), ProtocolError> {
        if self.config.family_enabled(kind) {
            Ok(())
        } else {
            Err(ProtocolError::FamilyDisabled(kind))
        }
    }

    /// Never fails: text that parses as nothing known is `Unrecognized`.
    pub fn classify(&self, text: &str) -> Feedback {
        let inbound = Inbound {
            raw: text,
            parsed: serde_json::from_str(text).ok(),
        };

        for (name, classifier) in CLASSIFIERS {
            if let Some(feedback) = classifier(self, &inbound) {
                tracing::trace!(classifier = name, ?feedback, "codec: classified feedback");
                return feedback;
            }
        }
        Feedback::Unrecognized
    }
}

fn classify_label(codec: &Codec, inbound: &Inbound<'_>) -> Option<Feedback> {
    let config = &codec.config;
    if !config.use_button {
        return None;
    }
    let rule = config.label_rule(inbound.raw)?;
    Some(Feedback::Label {
        text: rule.text.clone(),
        slot: rule.slot,
        active: rule.active,
    })
}

fn classify_toggle(codec: &Codec, inbound: &Inbound<'_>) -> Option<Feedback> {
    if !codec.config.use_toggle {
        return None;
    }
    let value = inbound.object_with_key(TOGGLE_FEEDBACK_KEY)?;
    let feedback = match ToggleFeedback::deserialize(value) {
        Ok(feedback) => Feedback::Toggle {
            channel: feedback.channel(),
            on: feedback.is_on(),
        },
        Err(_) => Feedback::Unrecognized,
    };
    Some(feedback)
}

fn classify_analog(codec: &Codec, inbound: &Inbound<'_>) -> Option<Feedback> {
    if !(codec.config.use_pwm || codec.config.use_avar) {
        return None;
    }
    let value = inbound.object_with_key(ANALOG_FEEDBACK_KEY)?;
    let feedback = match AnalogFeedback::deserialize(value) {
        Ok(feedback) => match feedback.wire_value() {
            Some(wire_value) => Feedback::Analog {
                id: feedback.id(),
                wire_value,
            },
            None => Feedback::Unrecognized,
        },
        Err(_) => Feedback::Unrecognized,
    };
    Some(feedback)
}
