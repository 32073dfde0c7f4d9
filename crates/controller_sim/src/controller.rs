//! Board state behind the simulated controller. Each intent mutates the
//! simulated pins and yields the feedback frames to broadcast.

use std::collections::HashMap;

use shared::protocol::{AnalogFeedback, FeedbackMessage, Intent, Scalar, ToggleFeedback};
use tracing::{debug, info};

use crate::config::{PwmSpec, Settings};

#[derive(Debug, Clone)]
struct PwmOutput {
    spec: PwmSpec,
    value: i64,
    duty: u8,
}

#[derive(Debug, Clone)]
pub struct Controller {
    state_pin: bool,
    mode_pin: bool,
    digital_outputs: Vec<u8>,
    levels: HashMap<u8, bool>,
    pwm: Vec<PwmOutput>,
    variables: Vec<(String, i64)>,
}

impl Controller {
    pub fn new(settings: &Settings) -> Self {
        Self {
            state_pin: false,
            mode_pin: false,
            digital_outputs: settings.digital_outputs.clone(),
            levels: HashMap::new(),
            pwm: settings
                .pwm_channels
                .iter()
                .map(|spec| PwmOutput {
                    spec: spec.clone(),
                    value: 0,
                    duty: 0,
                })
                .collect(),
            variables: settings
                .variables
                .iter()
                .map(|name| (name.clone(), 0))
                .collect(),
        }
    }

    /// Frames that are not one of the intent shapes produce nothing.
    pub fn handle_text(&mut self, text: &str) -> Vec<FeedbackMessage> {
        match Intent::decode(text) {
            Some(intent) => self.handle(intent),
            None => {
                debug!(len = text.len(), "controller: unrecognized frame ignored");
                Vec::new()
            }
        }
    }

    pub fn handle(&mut self, intent: Intent) -> Vec<FeedbackMessage> {
        match intent {
            Intent::FullResync { .. } => self.full_update(),
            Intent::ButtonPress { but } => {
                match but.as_str() {
                    "bON" => self.state_pin = true,
                    "bOFF" => self.state_pin = false,
                    "bAUTO" => self.mode_pin = true,
                    "bMAN" => self.mode_pin = false,
                    other => debug!(button = other, "controller: unknown button"),
                }
                // the label echoed back is the button id without its leading 'b'
                match but.as_str().get(1..) {
                    Some(label) if !label.is_empty() => vec![FeedbackMessage::Label(label.to_string())],
                    _ => Vec::new(),
                }
            }
            Intent::ToggleFlip { d_o } => {
                let Ok(pin) = d_o.as_str().trim().parse::<u8>() else {
                    debug!(channel = %d_o, "controller: toggle channel is not a pin number");
                    return Vec::new();
                };
                let level = self.levels.entry(pin).or_insert(false);
                *level = !*level;
                info!(pin, on = *level, "controller: digital output toggled");
                vec![self.digital_feedback(pin)]
            }
            Intent::AnalogTune { a_o, value } => {
                let Ok(channel) = a_o.as_str().trim().parse::<u8>() else {
                    return Vec::new();
                };
                let Some(output) = self.pwm.iter_mut().find(|pwm| pwm.spec.channel == channel)
                else {
                    debug!(channel, "controller: unknown pwm channel ignored");
                    return Vec::new();
                };
                output.value = atoi(&value.as_text());
                output.duty = map_duty(output.value, output.spec.min, output.spec.max);
                info!(channel, value = output.value, duty = output.duty, "controller: pwm tuned");
                vec![pwm_feedback(output)]
            }
            Intent::VariableSet { set, value } => {
                let Some(slot) = self
                    .variables
                    .iter_mut()
                    .find(|(name, _)| name == set.as_str())
                else {
                    debug!(name = %set, "controller: unknown variable ignored");
                    return Vec::new();
                };
                slot.1 = atoi(&value.as_text());
                info!(name = %set, value = slot.1, "controller: variable set");
                vec![variable_feedback(&slot.0, slot.1)]
            }
        }
    }

    fn full_update(&self) -> Vec<FeedbackMessage> {
        let mut frames = vec![
            FeedbackMessage::Label(if self.state_pin { "ON" } else { "OFF" }.to_string()),
            FeedbackMessage::Label(if self.mode_pin { "AUTO" } else { "MAN" }.to_string()),
        ];
        frames.extend(self.digital_outputs.iter().map(|pin| self.digital_feedback(*pin)));
        frames.extend(self.pwm.iter().map(pwm_feedback));
        frames.extend(
            self.variables
                .iter()
                .map(|(name, value)| variable_feedback(name, *value)),
        );
        frames
    }

    fn digital_feedback(&self, pin: u8) -> FeedbackMessage {
        let on = self.levels.get(&pin).copied().unwrap_or(false);
        FeedbackMessage::Toggle(ToggleFeedback {
            dfb: Scalar::Number(i64::from(pin)),
            state: Some(Scalar::Number(i64::from(on))),
        })
    }

    pub fn duty(&self, channel: u8) -> Option<u8> {
        self.pwm
            .iter()
            .find(|pwm| pwm.spec.channel == channel)
            .map(|pwm| pwm.duty)
    }
}

fn pwm_feedback(output: &PwmOutput) -> FeedbackMessage {
    FeedbackMessage::Analog(AnalogFeedback {
        afb: Scalar::Number(i64::from(output.spec.channel)),
        value: Some(Scalar::Number(output.value)),
    })
}

fn variable_feedback(name: &str, value: i64) -> FeedbackMessage {
    FeedbackMessage::Analog(AnalogFeedback {
        afb: Scalar::Text(name.to_string()),
        value: Some(Scalar::Number(value)),
    })
}

/// Leading-integer parse: optional sign, then digits; anything unparsable is 0.
fn atoi(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (sign, digits) = match raw.as_bytes().first() {
        Some(b'-') => (-1, &raw[1..]),
        Some(b'+') => (1, &raw[1..]),
        _ => (1, raw),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(0)
}

/// Linear map of `value` from `min..max` onto the 0..255 duty range. Values
/// outside the range pin to its ends.
fn map_duty(value: i64, min: i64, max: i64) -> u8 {
    let (min, max) = (i128::from(min), i128::from(max));
    let value = i128::from(value).clamp(min, max.max(min));
    let span = (max - min).max(1);
    let duty = (value - min) * 255 / span;
    u8::try_from(duty.clamp(0, 255)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::new(&Settings::default())
    }

    fn encoded(frames: Vec<FeedbackMessage>) -> Vec<String> {
        frames
            .into_iter()
            .map(|frame| frame.encode().expect("encode"))
            .collect()
    }

    #[test]
    fn full_update_reports_every_control() {
        let mut controller = controller();
        let frames = encoded(controller.handle_text(r#"{"all":"update"}"#));
        assert_eq!(
            frames,
            vec![
                "OFF",
                "MAN",
                r#"{"dfb":12,"state":0}"#,
                r#"{"dfb":14,"state":0}"#,
                r#"{"afb":5,"value":0}"#,
                r#"{"afb":15,"value":0}"#,
                r#"{"afb":"tSET","value":0}"#,
                r#"{"afb":"rhSET","value":0}"#,
            ]
        );
    }

    #[test]
    fn buttons_drive_the_mode_pins_and_echo_their_label() {
        let mut controller = controller();
        assert_eq!(encoded(controller.handle(Intent::press("bAUTO".into()))), vec!["AUTO"]);
        assert_eq!(encoded(controller.handle(Intent::press("bON".into()))), vec!["ON"]);

        let frames = encoded(controller.handle(Intent::full_resync()));
        assert_eq!(&frames[..2], ["ON", "AUTO"]);
    }

    #[test]
    fn toggles_invert_the_pin() {
        let mut controller = controller();
        assert_eq!(
            encoded(controller.handle_text(r#"{"d_o":"12"}"#)),
            vec![r#"{"dfb":12,"state":1}"#]
        );
        assert_eq!(
            encoded(controller.handle_text(r#"{"d_o":"12"}"#)),
            vec![r#"{"dfb":12,"state":0}"#]
        );
    }

    #[test]
    fn pwm_tune_maps_duty_and_ignores_unknown_channels() {
        let mut controller = controller();
        assert_eq!(
            encoded(controller.handle_text(r#"{"a_o":"5","value":"500"}"#)),
            vec![r#"{"afb":5,"value":500}"#]
        );
        assert_eq!(controller.duty(5), Some(127));

        controller.handle_text(r#"{"a_o":"15","value":"350"}"#);
        assert_eq!(controller.duty(15), Some(255));

        assert!(controller
            .handle_text(r#"{"a_o":"7","value":"10"}"#)
            .is_empty());
    }

    #[test]
    fn huge_pwm_values_saturate_the_duty() {
        let mut controller = controller();
        assert_eq!(
            encoded(controller.handle_text(r#"{"a_o":"5","value":"100000000000000000"}"#)),
            vec![r#"{"afb":5,"value":100000000000000000}"#]
        );
        assert_eq!(controller.duty(5), Some(255));

        controller.handle_text(r#"{"a_o":"15","value":"-20000"}"#);
        assert_eq!(controller.duty(15), Some(0));
    }

    #[test]
    fn variables_store_their_value() {
        let mut controller = controller();
        assert_eq!(
            encoded(controller.handle_text(r#"{"set":"tSET","value":"225"}"#)),
            vec![r#"{"afb":"tSET","value":225}"#]
        );
        assert!(controller
            .handle_text(r#"{"set":"humidity","value":"1"}"#)
            .is_empty());
        assert!(controller.handle_text("not json").is_empty());
    }

    #[test]
    fn atoi_reads_the_leading_integer() {
        assert_eq!(atoi("73"), 73);
        assert_eq!(atoi(" -12abc"), -12);
        assert_eq!(atoi("7.3"), 7);
        assert_eq!(atoi("warm"), 0);
        assert_eq!(atoi(""), 0);
    }
}
