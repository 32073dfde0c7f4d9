use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ButtonId, ChannelId, ControlId, VarName},
    error::ProtocolError,
    scale::ScaleFactor,
};

/// A wire field the controller may send either as a JSON string or as a JSON
/// integer (`{"dfb":"12"}` and `{"dfb":12}` are both seen in practice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncScope {
    Update,
}

/// Client → controller messages. Field names are the wire keys; the
/// controller dispatches on whichever key it recognises first, in variant
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Intent {
    FullResync { all: ResyncScope },
    ButtonPress { but: ButtonId },
    ToggleFlip { d_o: ChannelId },
    AnalogTune { a_o: ChannelId, value: Scalar },
    VariableSet { set: VarName, value: Scalar },
}

impl Intent {
    pub fn full_resync() -> Self {
        Self::FullResync {
            all: ResyncScope::Update,
        }
    }

    pub fn press(button: ButtonId) -> Self {
        Self::ButtonPress { but: button }
    }

    pub fn toggle(channel: ChannelId) -> Self {
        Self::ToggleFlip { d_o: channel }
    }

    pub fn tune(channel: ChannelId, raw: f64, scale: ScaleFactor) -> Result<Self, ProtocolError> {
        let wire = scale.to_wire(raw)?;
        Ok(Self::AnalogTune {
            a_o: channel,
            value: Scalar::Text(wire.to_string()),
        })
    }

    pub fn set(name: VarName, raw: f64, scale: ScaleFactor) -> Result<Self, ProtocolError> {
        let wire = scale.to_wire(raw)?;
        Ok(Self::VariableSet {
            set: name,
            value: Scalar::Text(wire.to_string()),
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Controller-side decode. Anything that is not one of the five shapes is
    /// `None`.
    pub fn decode(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FullResync { .. } => "all",
            Self::ButtonPress { .. } => "but",
            Self::ToggleFlip { .. } => "d_o",
            Self::AnalogTune { .. } => "a_o",
            Self::VariableSet { .. } => "set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleFeedback {
    pub dfb: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Scalar>,
}

impl ToggleFeedback {
    pub fn channel(&self) -> ControlId {
        ControlId::new(self.dfb.as_text())
    }

    /// Only `"1"` (or `1`) switches the output on; anything else reads as off.
    pub fn is_on(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.as_text().trim() == "1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogFeedback {
    pub afb: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
}

impl AnalogFeedback {
    pub fn id(&self) -> ControlId {
        ControlId::new(self.afb.as_text())
    }

    pub fn wire_value(&self) -> Option<i64> {
        self.value.as_ref().and_then(Scalar::as_i64)
    }
}

pub const TOGGLE_FEEDBACK_KEY: &str = "dfb";
pub const ANALOG_FEEDBACK_KEY: &str = "afb";

/// Controller → client messages, as the controller produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackMessage {
    /// Sent as a bare text frame, not JSON.
    Label(String),
    Toggle(ToggleFeedback),
    Analog(AnalogFeedback),
}

impl FeedbackMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            Self::Label(label) => Ok(label.clone()),
            Self::Toggle(feedback) => Ok(serde_json::to_string(feedback)?),
            Self::Analog(feedback) => Ok(serde_json::to_string(feedback)?),
        }
    }
}
