use crate::{
    foundation::{
        core::Rgba8,
        error::{MemegenError, MemegenResult},
    },
    layout::text::TextAlign,
};

/// Drawing state used for text overlays.
///
/// One value is configured per generator; slots refine it through [`StyleOverrides`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    /// Font size in pixels. Also the line height (horizontal) and column width (vertical).
    pub font_size: f64,
    /// Font family name; `None` selects the backend's default family.
    pub font_family: Option<String>,
    /// Fill color.
    pub fill_color: Rgba8,
    /// Outline color; `None` disables the outline.
    pub stroke_color: Option<Rgba8>,
    /// Outline width in pixels.
    pub stroke_width: f64,
    /// Horizontal clamp for a single drawn line. Defaults to the slot width.
    pub max_width: Option<f64>,
    /// Alignment mode.
    pub text_align: TextAlign,
    /// Lay out top-to-bottom in right-to-left columns.
    pub is_vertical: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 32.0,
            font_family: None,
            fill_color: Rgba8::WHITE,
            stroke_color: Some(Rgba8::BLACK),
            stroke_width: 2.0,
            max_width: None,
            text_align: TextAlign::Center,
            is_vertical: false,
        }
    }
}

impl TextStyle {
    /// Validate numeric fields.
    pub fn validate(&self) -> MemegenResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(MemegenError::validation(
                "fontSize must be finite and > 0",
            ));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(MemegenError::validation(
                "strokeWidth must be finite and >= 0",
            ));
        }
        if let Some(w) = self.max_width
            && (!w.is_finite() || w <= 0.0)
        {
            return Err(MemegenError::validation("maxWidth must be finite and > 0"));
        }
        Ok(())
    }
}

/// Per-slot style overrides. Every `None` falls back to the generator default.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOverrides {
    /// Overrides [`TextStyle::font_size`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Overrides [`TextStyle::font_family`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Overrides [`TextStyle::fill_color`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgba8>,
    /// Overrides [`TextStyle::stroke_color`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Rgba8>,
    /// Overrides [`TextStyle::max_width`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    /// Overrides [`TextStyle::is_vertical`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_vertical: Option<bool>,
    /// Overrides [`TextStyle::text_align`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

impl StyleOverrides {
    /// Layer these overrides over `base`.
    pub fn resolve(&self, base: &TextStyle) -> TextStyle {
        TextStyle {
            font_size: self.font_size.unwrap_or(base.font_size),
            font_family: self
                .font_family
                .clone()
                .or_else(|| base.font_family.clone()),
            fill_color: self.fill_color.unwrap_or(base.fill_color),
            stroke_color: self.stroke_color.or(base.stroke_color),
            stroke_width: base.stroke_width,
            max_width: self.max_width.or(base.max_width),
            text_align: self.text_align.unwrap_or(base.text_align),
            is_vertical: self.is_vertical.unwrap_or(base.is_vertical),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/style.rs"]
mod tests;
