use std::fmt::Write as _;

use client_core::{PanelNotice, SliderLayout, UiChange, UiSnapshot};
use shared::domain::ModeSlot;

pub fn render_notice(notice: &PanelNotice) -> String {
    match notice {
        PanelNotice::Link(state) => format!("[link] {state}"),
        PanelNotice::Changed(change) => render_change(change),
    }
}

pub fn render_change(change: &UiChange) -> String {
    match change {
        UiChange::Label { slot, display } => {
            format!("[{slot}] {} ({})", display.text, display.color)
        }
        UiChange::Toggle { id, display } => {
            format!("[toggle {id}] {} ({})", display.label, display.color)
        }
        UiChange::Analog { id, display } => format!("[analog {id}] {}", display.readout),
    }
}

pub fn render_snapshot(snapshot: &UiSnapshot) -> String {
    let mut out = String::new();
    let model = &snapshot.model;
    let _ = writeln!(out, "link: {} (rev {})", snapshot.connection, snapshot.revision);

    for slot in [ModeSlot::State, ModeSlot::Mode] {
        match model.slot(slot) {
            Some(display) => {
                let _ = writeln!(out, "{slot:>8}: {} ({})", display.text, display.color);
            }
            None => {
                let _ = writeln!(out, "{slot:>8}: -");
            }
        }
    }
    for (id, toggle) in model.toggles() {
        let mark = if toggle.checked { "x" } else { " " };
        let _ = writeln!(out, "  toggle {id}: [{mark}] {} ({})", toggle.label, toggle.color);
    }
    for (id, analog) in model.analogs() {
        let _ = writeln!(out, "  analog {id}: {}", analog.readout);
    }
    out
}

pub fn render_sliders(layouts: &[SliderLayout]) -> String {
    let mut out = String::new();
    for layout in layouts {
        let _ = writeln!(
            out,
            "slider {}: {}..{} step {} ticks [{}]",
            layout.id,
            layout.min,
            layout.max,
            layout.step,
            layout.tick_labels().join(" ")
        );
    }
    out
}
