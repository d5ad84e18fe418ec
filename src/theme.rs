//! Colour theme for rendered trees
//!
//! Colours are configured as strings (hex or a handful of names) and resolved
//! once into concrete `RGBColor`s before any rendering starts. A colour that
//! fails to parse falls back to its default with a warning.

use plotters::style::RGBColor;
use serde::Deserialize;
use tracing::warn;

/// Colours for one icon style (normal or hidden)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconPalette {
    pub folder: RGBColor,
    pub page: RGBColor,
    pub accent: RGBColor,
}

/// Fully resolved theme ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: RGBColor,
    pub highlight_row: RGBColor,
    pub row: RGBColor,
    pub text: RGBColor,
    pub hidden_text: RGBColor,
    pub triangle: RGBColor,
    pub icon: IconPalette,
    pub hidden_icon: IconPalette,
}

impl Default for Theme {
    fn default() -> Self {
        ThemeConfig::default().resolve()
    }
}

/// Theme as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub highlight_row: String,
    pub row: String,
    pub text: String,
    pub hidden_text: String,
    pub triangle: String,
    pub folder: String,
    pub page: String,
    pub accent: String,
    pub hidden_folder: String,
    pub hidden_page: String,
    pub hidden_accent: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            background: "#303030".to_string(),
            highlight_row: "#404040".to_string(),
            row: "#383838".to_string(),
            text: "#B0B0B0".to_string(),
            hidden_text: "#808080".to_string(),
            triangle: "#A0A0A0".to_string(),
            folder: "#6A9FD8".to_string(),
            page: "#D8D8D8".to_string(),
            accent: "#6E6E6E".to_string(),
            hidden_folder: "#4A6E94".to_string(),
            hidden_page: "#8A8A8A".to_string(),
            hidden_accent: "#5A5A5A".to_string(),
        }
    }
}

impl ThemeConfig {
    pub fn resolve(&self) -> Theme {
        let defaults = ThemeConfig::default();
        let color = |field: &str, value: &str, fallback: &str| -> RGBColor {
            parse_color(value).unwrap_or_else(|| {
                warn!(field, value, "Unrecognised colour, using default {}", fallback);
                parse_color(fallback).unwrap_or(RGBColor(0, 0, 0))
            })
        };

        Theme {
            background: color("background", &self.background, &defaults.background),
            highlight_row: color("highlight_row", &self.highlight_row, &defaults.highlight_row),
            row: color("row", &self.row, &defaults.row),
            text: color("text", &self.text, &defaults.text),
            hidden_text: color("hidden_text", &self.hidden_text, &defaults.hidden_text),
            triangle: color("triangle", &self.triangle, &defaults.triangle),
            icon: IconPalette {
                folder: color("folder", &self.folder, &defaults.folder),
                page: color("page", &self.page, &defaults.page),
                accent: color("accent", &self.accent, &defaults.accent),
            },
            hidden_icon: IconPalette {
                folder: color("hidden_folder", &self.hidden_folder, &defaults.hidden_folder),
                page: color("hidden_page", &self.hidden_page, &defaults.hidden_page),
                accent: color("hidden_accent", &self.hidden_accent, &defaults.hidden_accent),
            },
        }
    }
}

// === Color Parsing ===

/// Parse a color string into RGBColor, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "darkgray" | "darkgrey" => Some(RGBColor(64, 64, 64)),
        "lightgray" | "lightgrey" => Some(RGBColor(192, 192, 192)),
        // gray0 = black, gray100 = white
        s if s.starts_with("gray") || s.starts_with("grey") => {
            let n = s[4..].parse::<u8>().ok().filter(|n| *n <= 100)?;
            let v = (n as f64 * 2.55).round() as u8;
            Some(RGBColor(v, v, v))
        }
        _ => None,
    }
}

/// Parse hex color (#RRGGBB or #RGB)
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}
