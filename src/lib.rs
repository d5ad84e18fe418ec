// Library exports for cptree

pub mod bundle;
pub mod closure;
pub mod compiler;
pub mod config;
pub mod fetch;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod resolve;
pub mod runtime;
pub mod scan;
pub mod settings;
pub mod template;
pub mod theme;

use serde::Deserialize;

/// Geometry of the rendered tree image
#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,
    #[serde(default = "default_indent_size")]
    pub indent_size: u32,
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_width() -> u32 { 800 }
fn default_padding() -> u32 { 20 }
fn default_line_spacing() -> u32 { 28 }
fn default_indent_size() -> u32 { 28 }
fn default_icon_size() -> u32 { 24 }
fn default_font_size() -> f64 { 24.0 }
fn default_font_family() -> String { "sans-serif".to_string() }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            padding: default_padding(),
            line_spacing: default_line_spacing(),
            indent_size: default_indent_size(),
            icon_size: default_icon_size(),
            font_size: default_font_size(),
            font_family: default_font_family(),
        }
    }
}
