//! Client-side view of controller state. Only the reconciler writes to it.

use std::collections::BTreeMap;

use shared::domain::{ControlId, ModeSlot};

use crate::connection::ConnectionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDisplay {
    pub text: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleDisplay {
    pub checked: bool,
    pub label: &'static str,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalogDisplay {
    pub value: f64,
    pub readout: String,
}

/// What a single feedback message changed, so observers can redraw one
/// control instead of the whole panel.
#[derive(Debug, Clone, PartialEq)]
pub enum UiChange {
    Label {
        slot: ModeSlot,
        display: LabelDisplay,
    },
    Toggle {
        id: ControlId,
        display: ToggleDisplay,
    },
    Analog {
        id: ControlId,
        display: AnalogDisplay,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiStateModel {
    state: Option<LabelDisplay>,
    mode: Option<LabelDisplay>,
    toggles: BTreeMap<ControlId, ToggleDisplay>,
    analogs: BTreeMap<ControlId, AnalogDisplay>,
}

impl UiStateModel {
    pub fn slot(&self, slot: ModeSlot) -> Option<&LabelDisplay> {
        match slot {
            ModeSlot::State => self.state.as_ref(),
            ModeSlot::Mode => self.mode.as_ref(),
        }
    }

    pub fn toggle(&self, id: &ControlId) -> Option<&ToggleDisplay> {
        self.toggles.get(id)
    }

    pub fn analog(&self, id: &ControlId) -> Option<&AnalogDisplay> {
        self.analogs.get(id)
    }

    pub fn toggles(&self) -> impl Iterator<Item = (&ControlId, &ToggleDisplay)> {
        self.toggles.iter()
    }

    pub fn analogs(&self) -> impl Iterator<Item = (&ControlId, &AnalogDisplay)> {
        self.analogs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.mode.is_none()
            && self.toggles.is_empty()
            && self.analogs.is_empty()
    }

    /// Forget everything; called when a new session opens so the panel is
    /// rebuilt purely from the resync reply.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn apply(&mut self, change: &UiChange) {
        match change {
            UiChange::Label { slot, display } => {
                let target = match slot {
                    ModeSlot::State => &mut self.state,
                    ModeSlot::Mode => &mut self.mode,
                };
                *target = Some(display.clone());
            }
            UiChange::Toggle { id, display } => {
                self.toggles.insert(id.clone(), display.clone());
            }
            UiChange::Analog { id, display } => {
                self.analogs.insert(id.clone(), display.clone());
            }
        }
    }
}

/// Published to observers after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    pub revision: u64,
    pub connection: ConnectionState,
    pub model: UiStateModel,
}
