use std::{borrow::Cow, collections::HashSet, path::Path, sync::Arc};

use crate::{
    foundation::{
        core::{Affine, Rgba8},
        error::{MemegenError, MemegenResult},
    },
    layout::text::TextAlign,
    render::{
        surface::Surface,
        text::{FontSpec, TextBackend, TextBaseline, TextRasterizer, TextRun},
    },
};

/// Set of font files available to text rendering.
///
/// The first font added is the default family. Each [`TextBackend::rasterizer`] call builds
/// its own Parley contexts from the stored bytes.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

#[derive(Clone, Debug)]
struct FontFace {
    family: String,
    bytes: Arc<Vec<u8>>,
}

impl FontBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw font bytes and return the family name they provide.
    pub fn add_font_bytes(&mut self, bytes: Vec<u8>) -> MemegenResult<String> {
        let bytes = Arc::new(bytes);
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &bytes)?;
        tracing::debug!(family = %family, bytes = bytes.len(), "registered font");
        self.faces.push(FontFace {
            family: family.clone(),
            bytes,
        });
        Ok(family)
    }

    /// Read and register a font file.
    pub fn add_font_file(&mut self, path: impl AsRef<Path>) -> MemegenResult<String> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            MemegenError::validation(format!("read font '{}': {e}", path.display()))
        })?;
        self.add_font_bytes(bytes)
    }

    /// Registered family names, default first.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(|f| f.family.as_str())
    }

    /// Whether no font has been registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl TextBackend for FontBook {
    fn rasterizer(&self) -> MemegenResult<Box<dyn TextRasterizer>> {
        Ok(Box::new(CpuTextRasterizer::new(self)?))
    }
}

/// Parley shaping plus `vello_cpu` painting.
pub struct CpuTextRasterizer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    faces: Vec<CpuFace>,
    warned: HashSet<String>,
}

struct CpuFace {
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl CpuTextRasterizer {
    /// Rasterizer over every face in `book`.
    pub fn new(book: &FontBook) -> MemegenResult<Self> {
        if book.is_empty() {
            return Err(MemegenError::validation(
                "text rendering needs at least one font",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        let mut faces = Vec::with_capacity(book.faces.len());
        for face in &book.faces {
            let family = register_family(&mut font_ctx, &face.bytes)?;
            let font = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
                0,
            );
            faces.push(CpuFace { family, font });
        }

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            faces,
            warned: HashSet::new(),
        })
    }

    fn face_index(&mut self, family: Option<&str>) -> usize {
        let Some(family) = family else {
            return 0;
        };
        if let Some(i) = self
            .faces
            .iter()
            .position(|f| f.family.eq_ignore_ascii_case(family))
        {
            return i;
        }
        if self.warned.insert(family.to_string()) {
            tracing::warn!(
                family,
                fallback = %self.faces[0].family,
                "unknown font family, using default"
            );
        }
        0
    }

    fn shape(&mut self, text: &str, font: &FontSpec) -> MemegenResult<(usize, parley::Layout<()>)> {
        if !font.size.is_finite() || font.size <= 0.0 {
            return Err(MemegenError::render("font size must be finite and > 0"));
        }
        let face = self.face_index(font.family.as_deref());
        let family = self.faces[face].family.clone();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size as f32));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok((face, layout))
    }
}

impl TextRasterizer for CpuTextRasterizer {
    fn measure(&mut self, text: &str, font: &FontSpec) -> MemegenResult<f64> {
        let (_, layout) = self.shape(text, font)?;
        Ok(f64::from(layout.width()))
    }

    #[tracing::instrument(skip(self, surface, runs), fields(runs = runs.len()))]
    fn draw_runs(&mut self, surface: &mut Surface, runs: &[TextRun]) -> MemegenResult<()> {
        if runs.is_empty() {
            return Ok(());
        }

        // Surface guarantees both axes fit in u16.
        let w = surface.width() as u16;
        let h = surface.height() as u16;
        let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h));

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(premul_bytes_to_pixmap(
                surface.data(),
                w,
                h,
            ))),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        ctx.fill_rect(&full);

        for run in runs {
            if run.text.is_empty() {
                continue;
            }
            let (face, layout) = self.shape(&run.text, &run.font)?;
            let font = &self.faces[face].font;
            ctx.set_transform(affine_to_cpu(run_transform(
                run,
                f64::from(layout.width()),
                f64::from(layout.height()),
            )));

            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                        continue;
                    };
                    let font_size = glyph_run.run().font_size();
                    let glyphs: Vec<vello_cpu::Glyph> = glyph_run
                        .glyphs()
                        .map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        })
                        .collect();

                    if let Some((color, width)) = run.stroke
                        && width > 0.0
                    {
                        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
                        ctx.set_paint(color_to_cpu(color));
                        ctx.glyph_run(font)
                            .font_size(font_size)
                            .stroke_glyphs(glyphs.clone().into_iter());
                    }
                    ctx.set_paint(color_to_cpu(run.fill));
                    ctx.glyph_run(font)
                        .font_size(font_size)
                        .fill_glyphs(glyphs.into_iter());
                }
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        surface
            .data_mut()
            .copy_from_slice(pixmap.data_as_u8_slice());
        Ok(())
    }
}

/// Placement of a laid-out run: anchor, rotate about the anchor, squeeze to `max_width`.
pub(crate) fn run_transform(run: &TextRun, width: f64, height: f64) -> Affine {
    let squeeze = match run.max_width {
        Some(max) if width > max && width > 0.0 => max / width,
        _ => 1.0,
    };
    let drawn = width * squeeze;
    let dx = match run.align {
        TextAlign::Start => 0.0,
        TextAlign::Center => -drawn / 2.0,
        TextAlign::End => -drawn,
    };
    let dy = match run.baseline {
        TextBaseline::Top => 0.0,
        TextBaseline::Middle => -height / 2.0,
    };

    Affine::translate(run.origin.to_vec2())
        * Affine::rotate(run.rotation)
        * Affine::translate((dx, dy))
        * Affine::scale_non_uniform(squeeze, 1.0)
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &Arc<Vec<u8>>) -> MemegenResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| MemegenError::validation("no font families found in font bytes"))?;
    Ok(font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| MemegenError::validation("registered font family has no name"))?
        .to_string())
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn premul_bytes_to_pixmap(rgba8_premul: &[u8], width: u16, height: u16) -> vello_cpu::Pixmap {
    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, may_have_opacities)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
