use crate::ir::{DrawCommand, SceneGraph, TreeLayout};
use crate::layout::canvas_height;
use crate::theme::Theme;
use crate::RenderOptions;

/// Gap between an icon and its label
const LABEL_GAP: i32 = 6;

// =============================================================================
// Row Geometry
// =============================================================================

/// Pixel positions for one row, derived from its index and indent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowGeometry {
    top: i32,
    bottom: i32,
    icon_x: i32,
    icon_y: i32,
    label_x: i32,
    label_y: i32,
}

fn row_geometry(index: usize, indent: u32, options: &RenderOptions) -> RowGeometry {
    let padding = options.padding as i32;
    let line_spacing = options.line_spacing as i32;
    let icon = options.icon_size as i32;

    let top = padding + index as i32 * line_spacing;
    let icon_x = padding + indent as i32 * options.indent_size as i32;
    RowGeometry {
        top,
        bottom: top + line_spacing,
        icon_x,
        icon_y: top + (line_spacing - icon) / 2,
        label_x: icon_x + icon + LABEL_GAP,
        label_y: top + line_spacing / 2,
    }
}

/// Compile a tree layout into a SceneGraph of drawing commands
pub fn compile_scene(layout: &TreeLayout, options: &RenderOptions, theme: &Theme) -> SceneGraph {
    let padding = options.padding as i32;
    let right = options.width as i32 - padding;
    let icon = options.icon_size as i32;
    let mut commands = Vec::with_capacity(layout.row_count() * 4);

    // Alternating row shading underneath everything else
    for index in 0..layout.row_count() {
        let geometry = row_geometry(index, 0, options);
        let color = if index % 2 == 0 { theme.highlight_row } else { theme.row };
        commands.push(DrawCommand::FillRect {
            tl: (padding, geometry.top),
            br: (right, geometry.bottom),
            color,
        });
    }

    for (index, row) in layout.rows.iter().enumerate() {
        let geometry = row_geometry(index, row.indent, options);

        if let Some(disclosure) = row.disclosure {
            commands.push(DrawCommand::Triangle {
                origin: (geometry.icon_x - icon, geometry.icon_y),
                size: icon,
                disclosure,
                color: theme.triangle,
            });
        }

        commands.push(DrawCommand::Icon {
            origin: (geometry.icon_x, geometry.icon_y),
            size: icon,
            kind: row.icon,
            palette: if row.hidden { theme.hidden_icon } else { theme.icon },
        });

        commands.push(DrawCommand::Text {
            anchor: (geometry.label_x, geometry.label_y),
            text: row.label.clone(),
            color: if row.hidden { theme.hidden_text } else { theme.text },
        });
    }

    SceneGraph {
        width: options.width,
        height: canvas_height(layout, options),
        background: theme.background,
        font_family: options.font_family.clone(),
        font_size: options.font_size,
        commands,
    }
}
