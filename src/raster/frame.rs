use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::{
    foundation::core::{Canvas, Rgb8},
    foundation::error::{ScriptcastError, ScriptcastResult},
    timeline::compose::Visual,
};

/// Opaque RGBA8 frame, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Frame filled with `color`.
    pub fn solid(canvas: Canvas, color: Rgb8) -> Self {
        let px = color.to_rgba();
        let len = canvas.width as usize * canvas.height as usize;
        let mut data = Vec::with_capacity(len * 4);
        for _ in 0..len {
            data.extend_from_slice(&px);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Turns track visuals into canvas-sized frames.
///
/// Text is laid out as SVG and rendered with `resvg`; images are decoded, scaled to fit the
/// canvas and centered over the fill.
#[derive(Clone)]
pub struct FrameRasterizer {
    canvas: Canvas,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for FrameRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRasterizer")
            .field("canvas", &self.canvas)
            .field("fonts", &self.fontdb.len())
            .finish()
    }
}

impl FrameRasterizer {
    /// Rasterizer with the system fonts loaded.
    pub fn new(canvas: Canvas) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self::with_fontdb(canvas, Arc::new(db))
    }

    /// Rasterizer over an existing font database.
    pub fn with_fontdb(canvas: Canvas, fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { canvas, fontdb }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Render one visual at canvas size.
    pub fn rasterize(&self, visual: &Visual) -> ScriptcastResult<Frame> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ScriptcastError::validation("canvas width/height must be non-zero"));
        }
        match visual {
            Visual::Solid(color) => Ok(Frame::solid(self.canvas, *color)),
            Visual::Text {
                lines,
                font_px,
                color,
                background,
            } => self.text(lines, *font_px, *color, *background),
            Visual::Image { path, background } => self.image(path, *background),
        }
    }

    fn text(
        &self,
        lines: &[String],
        font_px: f32,
        color: Rgb8,
        background: Rgb8,
    ) -> ScriptcastResult<Frame> {
        let svg = text_card_svg(self.canvas, lines, font_px, color, background);
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse text card svg")?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.canvas.width, self.canvas.height)
            .ok_or_else(|| ScriptcastError::validation("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );

        // The card starts with an opaque fill, so premultiplied and straight alpha agree.
        Ok(Frame {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.take(),
        })
    }

    fn image(&self, path: &Path, background: Rgb8) -> ScriptcastResult<Frame> {
        use image::imageops;

        let decoded = image::open(path)
            .with_context(|| format!("decode image '{}'", path.display()))?
            .to_rgba8();
        let (w, h) = decoded.dimensions();
        if w == 0 || h == 0 {
            return Err(ScriptcastError::validation(format!(
                "image '{}' is empty",
                path.display()
            )));
        }

        let (cw, ch) = (self.canvas.width, self.canvas.height);
        let (tw, th) = fit_within(w, h, cw, ch);
        let scaled = if (tw, th) == (w, h) {
            decoded
        } else {
            imageops::resize(&decoded, tw, th, imageops::FilterType::Lanczos3)
        };

        let mut out = image::RgbaImage::from_pixel(cw, ch, image::Rgba(background.to_rgba()));
        imageops::overlay(
            &mut out,
            &scaled,
            i64::from((cw - tw) / 2),
            i64::from((ch - th) / 2),
        );
        Ok(Frame {
            width: cw,
            height: ch,
            data: out.into_raw(),
        })
    }
}

/// Largest size with the aspect ratio of `w`x`h` that fits `cw`x`ch`, filling the width first.
fn fit_within(w: u32, h: u32, cw: u32, ch: u32) -> (u32, u32) {
    let by_width = (u64::from(h) * u64::from(cw) / u64::from(w)).max(1);
    if by_width <= u64::from(ch) {
        return (cw, by_width as u32);
    }
    let by_height = (u64::from(w) * u64::from(ch) / u64::from(h)).max(1);
    (by_height.min(u64::from(cw)) as u32, ch)
}

fn text_card_svg(
    canvas: Canvas,
    lines: &[String],
    font_px: f32,
    color: Rgb8,
    background: Rgb8,
) -> String {
    use std::fmt::Write as _;

    let (w, h) = (canvas.width, canvas.height);
    let line_height = font_px * 1.25;
    let block = line_height * lines.len() as f32;
    let first_baseline = (h as f32 - block) / 2.0 + font_px;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{bg}"/><text font-family="sans-serif" font-size="{font_px}" fill="{fg}" text-anchor="middle">"#,
        bg = background.to_hex(),
        fg = color.to_hex(),
    );
    for (i, line) in lines.iter().enumerate() {
        let y = first_baseline + line_height * i as f32;
        let _ = write!(
            svg,
            r#"<tspan x="{x}" y="{y}">{text}</tspan>"#,
            x = w as f32 / 2.0,
            text = xml_escape(line)
        );
    }
    svg.push_str("</text></svg>");
    svg
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/raster/frame.rs"]
mod tests;
