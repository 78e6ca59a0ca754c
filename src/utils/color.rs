use crate::analysis::{CardTone, Severity};
use eframe::egui::Color32;

/// Parses the `#rrggbb` constants of the status and card palette below.
pub trait ColorExt {
    fn from_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;
}

impl ColorExt for Color32 {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Color32::from_rgb(r, g, b))
    }
}

const SUCCESS_HEX: &str = "#2e9d5b";
const ERROR_HEX: &str = "#dc3232";
const LOADING_HEX: &str = "#3b7dd8";
const DUPLICATE_HEX: &str = "#d98a1c";

fn palette(hex: &str) -> Color32 {
    Color32::from_hex(hex).unwrap_or(Color32::GRAY)
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Success => palette(SUCCESS_HEX),
        Severity::Error => palette(ERROR_HEX),
        Severity::Loading => palette(LOADING_HEX),
        Severity::Idle => Color32::GRAY,
    }
}

pub fn tone_color(tone: CardTone) -> Color32 {
    match tone {
        CardTone::Success => palette(SUCCESS_HEX),
        CardTone::Error => palette(ERROR_HEX),
        CardTone::Duplicate => palette(DUPLICATE_HEX),
    }
}
