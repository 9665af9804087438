use crate::{
    foundation::{
        core::{Point, Rgba8},
        error::MemegenResult,
    },
    layout::text::TextAlign,
    render::{style::TextStyle, surface::Surface},
};

/// Font selection for one measurement or run.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Family name; `None` picks the backend default.
    pub family: Option<String>,
    /// Size in pixels.
    pub size: f64,
}

impl FontSpec {
    /// Font part of a resolved style.
    pub fn from_style(style: &TextStyle) -> Self {
        Self {
            family: style.font_family.clone(),
            size: style.font_size,
        }
    }
}

/// Vertical anchor of a run relative to its origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    /// Origin is the top of the line box.
    #[default]
    Top,
    /// Origin is the vertical middle of the line box.
    Middle,
}

/// One positioned piece of text to draw.
///
/// `origin` is the anchor point; `align` says which horizontal part of the run sits on it and
/// `baseline` which vertical part. `rotation` (radians, clockwise in image space) is applied
/// around the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Text content; no line breaking is applied.
    pub text: String,
    /// Anchor point in surface pixels.
    pub origin: Point,
    /// Horizontal anchor.
    pub align: TextAlign,
    /// Vertical anchor.
    pub baseline: TextBaseline,
    /// Rotation around `origin`, in radians.
    pub rotation: f64,
    /// The run is squeezed horizontally to fit when wider than this.
    pub max_width: Option<f64>,
    /// Fill color.
    pub fill: Rgba8,
    /// Outline color and width, painted under the fill.
    pub stroke: Option<(Rgba8, f64)>,
    /// Font selection.
    pub font: FontSpec,
}

/// Text measurement and painting, owned by a single generation session.
pub trait TextRasterizer {
    /// Advance width of `text` on one line.
    fn measure(&mut self, text: &str, font: &FontSpec) -> MemegenResult<f64>;

    /// Paint `runs` onto `surface` in order.
    fn draw_runs(&mut self, surface: &mut Surface, runs: &[TextRun]) -> MemegenResult<()>;
}

/// Shared factory for per-session [`TextRasterizer`]s.
pub trait TextBackend: Send + Sync {
    /// Fresh rasterizer with its own shaping caches.
    fn rasterizer(&self) -> MemegenResult<Box<dyn TextRasterizer>>;
}
