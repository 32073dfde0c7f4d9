use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{ButtonId, ChannelId, ControlId, ControlKind, ModeSlot},
    error::ProtocolError,
    scale::{ScaleFactor, MAX_DECIMALS},
};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "panel.toml";

/// How a bare label from the controller maps onto the combined display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub text: String,
    pub slot: ModeSlot,
    pub active: bool,
}

impl LabelRule {
    fn new(text: &str, slot: ModeSlot, active: bool) -> Self {
        Self {
            text: text.to_string(),
            slot,
            active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderSpec {
    pub id: ControlId,
    pub range: [f64; 2],
    pub num: u32,
}

impl SliderSpec {
    fn new(id: &str, min: f64, max: f64, num: u32) -> Self {
        Self {
            id: ControlId::new(id),
            range: [min, max],
            num,
        }
    }
}

/// Process-wide panel settings. Built once at startup and shared immutably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub gateway_url: String,
    pub logger: bool,
    pub color_on: String,
    pub color_off: String,
    pub use_button: bool,
    pub use_toggle: bool,
    pub use_pwm: bool,
    pub use_avar: bool,
    pub decimals: u32,
    pub reconnect_delay_ms: u64,
    pub button_ids: Vec<ButtonId>,
    pub labels: Vec<LabelRule>,
    pub toggle_channels: Vec<ChannelId>,
    pub analog_controls: Vec<ControlId>,
    pub sliders: Vec<SliderSpec>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            gateway_url: "ws://127.0.0.1:8080/ws".into(),
            logger: true,
            color_on: "#048".into(),
            color_off: "#888".into(),
            use_button: true,
            use_toggle: true,
            use_pwm: true,
            use_avar: true,
            decimals: 1,
            reconnect_delay_ms: 2000,
            button_ids: ["bON", "bOFF", "bAUTO", "bMAN"]
                .into_iter()
                .map(ButtonId::from)
                .collect(),
            labels: vec![
                LabelRule::new("ON", ModeSlot::State, true),
                LabelRule::new("OFF", ModeSlot::State, false),
                LabelRule::new("AUTO", ModeSlot::Mode, true),
                LabelRule::new("MAN", ModeSlot::Mode, false),
            ],
            toggle_channels: vec![ChannelId::from("12"), ChannelId::from("14")],
            analog_controls: ["5", "15", "tSET", "rhSET"]
                .into_iter()
                .map(ControlId::from)
                .collect(),
            sliders: vec![
                SliderSpec::new("5", 0.0, 100.0, 5),
                SliderSpec::new("15", 5.0, 35.0, 6),
                SliderSpec::new("tSET", 0.0, 40.0, 8),
                SliderSpec::new("rhSET", 0.0, 100.0, 5),
            ],
        }
    }
}

impl PanelConfig {
    pub fn scale(&self) -> Result<ScaleFactor, ProtocolError> {
        ScaleFactor::new(self.decimals)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn color(&self, active: bool) -> &str {
        if active {
            &self.color_on
        } else {
            &self.color_off
        }
    }

    pub fn family_enabled(&self, kind: ControlKind) -> bool {
        match kind {
            ControlKind::Button => self.use_button,
            ControlKind::Toggle => self.use_toggle,
            ControlKind::AnalogOutput => self.use_pwm,
            ControlKind::ControlVariable => self.use_avar,
        }
    }

    pub fn is_known_button(&self, button: &ButtonId) -> bool {
        self.button_ids.contains(button)
    }

    pub fn label_rule(&self, text: &str) -> Option<&LabelRule> {
        self.labels.iter().find(|rule| rule.text == text)
    }

    pub fn is_registered_toggle(&self, id: &ControlId) -> bool {
        self.toggle_channels.iter().any(|ch| ch.as_str() == id.as_str())
    }

    pub fn is_registered_analog(&self, id: &ControlId) -> bool {
        self.analog_controls.contains(id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway_url must not be empty".into()));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "decimals must be at most {MAX_DECIMALS}, got {}",
                self.decimals
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconnect_delay_ms must be greater than zero".into(),
            ));
        }
        if self.color_on.trim().is_empty() || self.color_off.trim().is_empty() {
            return Err(ConfigError::Invalid("display colors must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for rule in &self.labels {
            if rule.text.is_empty() {
                return Err(ConfigError::Invalid("button labels must not be empty".into()));
            }
            if !seen.insert(rule.text.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "button label '{}' is listed twice",
                    rule.text
                )));
            }
        }

        for slider in &self.sliders {
            let [min, max] = slider.range;
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::Invalid(format!(
                    "slider '{}' needs a finite range with min < max, got [{min}, {max}]",
                    slider.id
                )));
            }
            if slider.num == 0 {
                return Err(ConfigError::Invalid(format!(
                    "slider '{}' needs at least one tick",
                    slider.id
                )));
            }
        }

        Ok(())
    }
}

pub fn gateway_for_host(host: &str) -> String {
    format!("ws://{}/ws", host.trim())
}

/// Loads `panel.toml` (or `path`), applies environment overrides and
/// validates the result. A missing default file is not an error.
pub fn load_settings(path: Option<&Path>) -> Result<PanelConfig, ConfigError> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with<F>(path: Option<&Path>, lookup: F) -> Result<PanelConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_config_file(&default_path)?
            } else {
                PanelConfig::default()
            }
        }
    };

    apply_env_overrides(&mut settings, lookup);
    settings.validate()?;
    Ok(settings)
}

fn read_config_file(path: &Path) -> Result<PanelConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides<F>(settings: &mut PanelConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("PANEL_HOST") {
        settings.gateway_url = gateway_for_host(&v);
    }
    if let Some(v) = lookup("APP__HOST") {
        settings.gateway_url = gateway_for_host(&v);
    }

    if let Some(v) = lookup("PANEL_GATEWAY_URL") {
        settings.gateway_url = v;
    }
    if let Some(v) = lookup("APP__GATEWAY_URL") {
        settings.gateway_url = v;
    }

    for key in ["PANEL_LOGGER", "APP__LOGGER"] {
        if let Some(parsed) = lookup(key).as_deref().and_then(parse_flag) {
            settings.logger = parsed;
        }
    }

    for key in ["PANEL_DECIMALS", "APP__DECIMALS"] {
        if let Some(v) = lookup(key) {
            if let Ok(parsed) = v.trim().parse::<u32>() {
                settings.decimals = parsed;
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
