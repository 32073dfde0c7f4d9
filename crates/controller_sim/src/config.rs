use std::{fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "controller.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PwmSpec {
    pub channel: u8,
    pub min: i64,
    pub max: i64,
}

/// Simulated board layout. Defaults match the stock firmware: toggles on
/// GPIO 12 and 14, PWM on 5 (0..1000) and 15 (50..350), variables tSET and
/// rhSET.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub digital_outputs: Vec<u8>,
    pub pwm_channels: Vec<PwmSpec>,
    pub variables: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            digital_outputs: vec![12, 14],
            pwm_channels: vec![
                PwmSpec {
                    channel: 5,
                    min: 0,
                    max: 1000,
                },
                PwmSpec {
                    channel: 15,
                    min: 50,
                    max: 350,
                },
            ],
            variables: vec!["tSET".into(), "rhSET".into()],
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from<F>(path: &Path, lookup: F) -> anyhow::Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        toml::from_str::<Settings>(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?
    } else {
        Settings::default()
    };

    if let Some(v) = lookup("SIM_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    for pwm in &settings.pwm_channels {
        if pwm.min >= pwm.max {
            bail!(
                "pwm channel {} needs min < max, got {}..{}",
                pwm.channel,
                pwm.min,
                pwm.max
            );
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
