use crate::{
    foundation::{
        core::{Rect, Rgba8},
        error::MemegenResult,
    },
    layout::text::{TextAlign, layout_horizontal, layout_vertical},
    render::{
        style::{StyleOverrides, TextStyle},
        surface::Surface,
        text::{FontSpec, TextBaseline, TextRasterizer, TextRun},
    },
};

/// Owns the drawing surface of one generation session and paints overlays onto it.
pub struct Compositor {
    surface: Surface,
    style: TextStyle,
    rasterizer: Box<dyn TextRasterizer>,
    debug_outline: bool,
}

impl Compositor {
    /// Transparent compositor of `width × height` drawing with `style`.
    pub fn new(
        width: u32,
        height: u32,
        style: TextStyle,
        rasterizer: Box<dyn TextRasterizer>,
    ) -> MemegenResult<Self> {
        style.validate()?;
        Ok(Self {
            surface: Surface::new(width, height)?,
            style,
            rasterizer,
            debug_outline: false,
        })
    }

    /// Also stroke every overlay's bounding box.
    pub fn with_debug_outline(mut self, enabled: bool) -> Self {
        self.debug_outline = enabled;
        self
    }

    /// Base style applied before per-slot overrides.
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Underlying surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Replace the surface content with a straight-alpha frame.
    pub fn blit(&mut self, rgba8: &[u8]) -> MemegenResult<()> {
        self.surface.blit(rgba8)
    }

    /// Straight-alpha copy of the surface.
    pub fn snapshot(&self) -> Vec<u8> {
        self.surface.snapshot()
    }

    /// Lay out `text` inside `bounds` with the resolved style and paint it.
    pub fn draw_overlay(
        &mut self,
        text: &str,
        bounds: Rect,
        overrides: &StyleOverrides,
    ) -> MemegenResult<()> {
        let style = overrides.resolve(&self.style);
        style.validate()?;

        let runs = if text.is_empty() {
            Vec::new()
        } else if style.is_vertical {
            self.vertical_runs(text, bounds, &style)?
        } else {
            self.horizontal_runs(text, bounds, &style)?
        };
        self.rasterizer.draw_runs(&mut self.surface, &runs)?;

        if self.debug_outline {
            self.surface.stroke_rect(bounds, Rgba8::RED);
        }
        Ok(())
    }

    fn horizontal_runs(
        &mut self,
        text: &str,
        bounds: Rect,
        style: &TextStyle,
    ) -> MemegenResult<Vec<TextRun>> {
        let font = FontSpec::from_style(style);
        let rasterizer = &mut self.rasterizer;
        let lines = layout_horizontal(text, bounds, font.size, style.text_align, |s| {
            rasterizer.measure(s, &font)
        })?;

        let max_width = style.max_width.unwrap_or_else(|| bounds.width());
        Ok(lines
            .into_iter()
            .filter(|l| !l.text.is_empty())
            .map(|l| TextRun {
                text: l.text,
                origin: (l.x, l.y).into(),
                align: style.text_align,
                baseline: TextBaseline::Top,
                rotation: 0.0,
                max_width: Some(max_width),
                fill: style.fill_color,
                stroke: outline(style),
                font: font.clone(),
            })
            .collect())
    }

    fn vertical_runs(
        &mut self,
        text: &str,
        bounds: Rect,
        style: &TextStyle,
    ) -> MemegenResult<Vec<TextRun>> {
        let font = FontSpec::from_style(style);
        let rasterizer = &mut self.rasterizer;
        let columns = layout_vertical(text, bounds, font.size, style.text_align, |s| {
            rasterizer.measure(s, &font)
        })?;

        let mut runs = Vec::new();
        for glyph in columns.into_iter().flat_map(|c| c.glyphs) {
            runs.push(TextRun {
                text: glyph.ch.to_string(),
                origin: (glyph.x, glyph.y).into(),
                align: TextAlign::Center,
                baseline: TextBaseline::Middle,
                rotation: if glyph.rotated {
                    std::f64::consts::FRAC_PI_2
                } else {
                    0.0
                },
                max_width: None,
                fill: style.fill_color,
                stroke: outline(style),
                font: font.clone(),
            });
        }
        Ok(runs)
    }
}

fn outline(style: &TextStyle) -> Option<(Rgba8, f64)> {
    style
        .stroke_color
        .filter(|_| style.stroke_width > 0.0)
        .map(|c| (c, style.stroke_width))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
