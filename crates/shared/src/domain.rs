use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(ButtonId);
id_newtype!(ChannelId);
id_newtype!(VarName);
// Key carried by feedback messages; covers toggle pins, analog channels and
// variable names alike.
id_newtype!(ControlId);

impl From<ChannelId> for ControlId {
    fn from(value: ChannelId) -> Self {
        Self(value.0)
    }
}

impl From<VarName> for ControlId {
    fn from(value: VarName) -> Self {
        Self(value.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Toggle,
    AnalogOutput,
    ControlVariable,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Button => "button",
            Self::Toggle => "toggle",
            Self::AnalogOutput => "analog output",
            Self::ControlVariable => "control variable",
        };
        f.write_str(name)
    }
}

/// Which half of the combined button display a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSlot {
    State,
    Mode,
}

impl fmt::Display for ModeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State => f.pad("state"),
            Self::Mode => f.pad("mode"),
        }
    }
}
