use thiserror::Error;

use crate::domain::{ButtonId, ControlKind};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{0} controls are disabled on this panel")]
    FamilyDisabled(ControlKind),
    #[error("button '{0}' is not one of the configured buttons")]
    UnknownButton(ButtonId),
    #[error("value {0} is not a finite number")]
    NonFiniteValue(f64),
    #[error("scaled value {0} does not fit a wire integer")]
    ValueOutOfRange(f64),
    #[error("decimal count {requested} exceeds the supported maximum of {max}")]
    DecimalsOutOfRange { requested: u32, max: u32 },
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
