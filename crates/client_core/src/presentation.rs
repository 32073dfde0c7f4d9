//! Slider geometry for analog controls. Pure functions of the config; the
//! step is one hundredth of the range and ticks are evenly spaced.

use shared::domain::ControlId;

use crate::config::{PanelConfig, SliderSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct SliderLayout {
    pub id: ControlId,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Sliders start at the bottom of their range until feedback arrives.
    pub initial: f64,
    pub ticks: Vec<f64>,
}

impl SliderLayout {
    /// Tick positions formatted the way the panel prints readouts.
    pub fn tick_labels(&self) -> Vec<String> {
        self.ticks.iter().map(|tick| format_tick(*tick)).collect()
    }

    pub fn clamp(&self, raw: f64) -> f64 {
        raw.clamp(self.min, self.max)
    }
}

pub fn slider_layout(spec: &SliderSpec) -> SliderLayout {
    let [min, max] = spec.range;
    let span = max - min;
    let num = spec.num.max(1);
    let ticks = (0..=num)
        .map(|j| min + f64::from(j) * span / f64::from(num))
        .collect();

    SliderLayout {
        id: spec.id.clone(),
        min,
        max,
        step: span / 100.0,
        initial: min,
        ticks,
    }
}

pub fn slider_layouts(config: &PanelConfig) -> Vec<SliderLayout> {
    config.sliders.iter().map(slider_layout).collect()
}

fn format_tick(tick: f64) -> String {
    // tick arithmetic leaves float noise like 9.999999999999998
    let rounded = (tick * 1e6).round() / 1e6;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
