use crate::ir::{DrawCommand, Disclosure, IconKind, SceneGraph};
use crate::theme::IconPalette;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// RGB raster the scene graph is executed on
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

/// Bytes in an RGB buffer; computed in `usize` so large canvases cannot overflow
fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot create a {}x{} canvas", width, height);
        }
        let buffer = vec![0u8; buffer_len(width, height)];
        Ok(Canvas {
            buffer,
            width,
            height,
        })
    }

    /// Fill the background and execute every command in order
    pub fn draw_scene(&mut self, scene: &SceneGraph) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&scene.background).context("Failed to fill background")?;

        for command in &scene.commands {
            match command {
                DrawCommand::FillRect { tl, br, color } => {
                    root.draw(&Rectangle::new([*tl, *br], color.filled()))
                        .context("Failed to draw row")?;
                }
                DrawCommand::Triangle { origin, size, disclosure, color } => {
                    draw_triangle(&root, *origin, *size, *disclosure, *color)?;
                }
                DrawCommand::Icon { origin, size, kind, palette } => {
                    draw_icon(&root, *origin, *size, *kind, palette)?;
                }
                DrawCommand::Text { anchor, text, color } => {
                    let style = (scene.font_family.as_str(), scene.font_size)
                        .into_font()
                        .color(color)
                        .pos(Pos::new(HPos::Left, VPos::Center));
                    root.draw_text(text, &style, *anchor)
                        .with_context(|| format!("Failed to draw label '{}'", text))?;
                }
            }
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Draw a complete scene and return PNG bytes
pub fn render_scene(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(scene.width, scene.height)?;
    canvas.draw_scene(scene)?;
    canvas.render()
}

// =============================================================================
// Glyphs
// =============================================================================

/// Point at a fraction of an icon box
fn at(origin: (i32, i32), size: i32, fx: f64, fy: f64) -> (i32, i32) {
    (
        origin.0 + (fx * size as f64).round() as i32,
        origin.1 + (fy * size as f64).round() as i32,
    )
}

fn points(origin: (i32, i32), size: i32, fractions: &[(f64, f64)]) -> Vec<(i32, i32)> {
    fractions.iter().map(|&(fx, fy)| at(origin, size, fx, fy)).collect()
}

fn draw_triangle(
    area: &Area,
    origin: (i32, i32),
    size: i32,
    disclosure: Disclosure,
    color: RGBColor,
) -> Result<()> {
    let shape: &[(f64, f64)] = match disclosure {
        Disclosure::Collapsed => &[(0.35, 0.25), (0.35, 0.75), (0.7, 0.5)],
        Disclosure::Expanded => &[(0.25, 0.35), (0.75, 0.35), (0.5, 0.7)],
    };
    area.draw(&Polygon::new(points(origin, size, shape), color.filled()))
        .context("Failed to draw triangle")?;
    Ok(())
}

fn draw_icon(
    area: &Area,
    origin: (i32, i32),
    size: i32,
    kind: IconKind,
    palette: &IconPalette,
) -> Result<()> {
    if kind == IconKind::Folder {
        return draw_folder(area, origin, size, palette);
    }

    draw_page(area, origin, size, palette)?;
    let accent = palette.accent;
    match kind {
        IconKind::CodeFile => {
            for (y, end) in [(0.45, 0.72), (0.6, 0.62), (0.75, 0.7)] {
                let line = points(origin, size, &[(0.3, y), (end, y)]);
                area.draw(&PathElement::new(line, accent.stroke_width(2)))
                    .context("Failed to draw code icon")?;
            }
        }
        IconKind::Image => {
            let hills = points(
                origin,
                size,
                &[(0.27, 0.85), (0.45, 0.55), (0.58, 0.72), (0.66, 0.62), (0.76, 0.85)],
            );
            area.draw(&Polygon::new(hills, accent.filled()))
                .context("Failed to draw image icon")?;
            let sun = at(origin, size, 0.4, 0.38);
            let radius = (size as f64 * 0.07).round().max(1.0) as i32;
            area.draw(&Circle::new(sun, radius, accent.filled()))
                .context("Failed to draw image icon")?;
        }
        IconKind::Music => {
            let stem = points(origin, size, &[(0.6, 0.78), (0.6, 0.35), (0.72, 0.45)]);
            area.draw(&PathElement::new(stem, accent.stroke_width(2)))
                .context("Failed to draw music icon")?;
            let head = at(origin, size, 0.52, 0.78);
            let radius = (size as f64 * 0.09).round().max(1.0) as i32;
            area.draw(&Circle::new(head, radius, accent.filled()))
                .context("Failed to draw music icon")?;
        }
        IconKind::Font => {
            let strokes = [
                points(origin, size, &[(0.32, 0.85), (0.51, 0.35), (0.7, 0.85)]),
                points(origin, size, &[(0.4, 0.68), (0.62, 0.68)]),
            ];
            for stroke in strokes {
                area.draw(&PathElement::new(stroke, accent.stroke_width(2)))
                    .context("Failed to draw font icon")?;
            }
        }
        IconKind::EmptyFile | IconKind::Folder => {}
    }
    Ok(())
}

fn draw_folder(area: &Area, origin: (i32, i32), size: i32, palette: &IconPalette) -> Result<()> {
    let tab = [at(origin, size, 0.05, 0.15), at(origin, size, 0.45, 0.3)];
    let body = [at(origin, size, 0.05, 0.25), at(origin, size, 0.95, 0.85)];
    area.draw(&Rectangle::new(tab, palette.folder.filled()))
        .context("Failed to draw folder icon")?;
    area.draw(&Rectangle::new(body, palette.folder.filled()))
        .context("Failed to draw folder icon")?;
    Ok(())
}

/// Sheet of paper with a folded top-right corner
fn draw_page(area: &Area, origin: (i32, i32), size: i32, palette: &IconPalette) -> Result<()> {
    let sheet = points(
        origin,
        size,
        &[(0.2, 0.05), (0.62, 0.05), (0.82, 0.25), (0.82, 0.95), (0.2, 0.95)],
    );
    let fold = points(origin, size, &[(0.62, 0.05), (0.62, 0.25), (0.82, 0.25)]);
    area.draw(&Polygon::new(sheet, palette.page.filled()))
        .context("Failed to draw page icon")?;
    area.draw(&Polygon::new(fold, palette.accent.filled()))
        .context("Failed to draw page icon")?;
    Ok(())
}
