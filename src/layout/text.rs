//! Pure text layout inside a bounding box.
//!
//! Both layouts are functions of `(text, box, measurement)` only. Measurement is supplied by the
//! caller so that the same code drives the real font backend and the fixed-advance fakes used in
//! tests.

use crate::foundation::core::Rect;

/// Alignment mode shared by both layout directions.
///
/// Horizontal layout aligns each line on the x axis; vertical layout aligns each column on the
/// y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left edge (horizontal) or top edge (vertical).
    #[default]
    #[serde(alias = "left")]
    Start,
    /// Box center.
    Center,
    /// Right edge (horizontal) or bottom edge (vertical).
    #[serde(alias = "right")]
    End,
}

impl TextAlign {
    fn place(self, start: f64, extent: f64, content: f64) -> f64 {
        match self {
            Self::Start => start,
            Self::Center => start + (extent - content) / 2.0,
            Self::End => start + extent - content,
        }
    }
}

/// One line produced by [`layout_horizontal`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    /// Line content, without the breaking `\n`.
    pub text: String,
    /// Anchor x: left edge, center or right edge depending on [`TextAlign`].
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
}

/// One character cell produced by [`layout_vertical`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    /// The character.
    pub ch: char,
    /// Cell center x.
    pub x: f64,
    /// Cell center y.
    pub y: f64,
    /// Cell extent along the column.
    pub advance: f64,
    /// Whether the glyph is drawn rotated by 90°.
    pub rotated: bool,
}

/// One column produced by [`layout_vertical`], in right-to-left order.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedColumn {
    /// Column center x.
    pub x: f64,
    /// Sum of the cell advances.
    pub height: f64,
    /// Cells from top to bottom.
    pub glyphs: Vec<PlacedGlyph>,
}

// Inclusive code point ranges drawn upright in vertical text.
const UPRIGHT_RANGES: [(u32, u32); 6] = [
    (0x2E80, 0x2FEF),
    (0x3040, 0x9FFF),
    (0xAC00, 0xD7FF),
    (0xF900, 0xFAFF),
    (0x1D300, 0x1D35F),
    (0x20000, 0x2FA1F),
];

/// Returns `true` when `ch` must be rotated by 90° in vertical layout.
///
/// CJK ideographs, kana, Hangul and a few symbol blocks are stacked upright; everything else
/// (Latin, digits, punctuation outside those blocks) is rotated.
pub fn needs_rotation(ch: char) -> bool {
    let cp = u32::from(ch);
    !UPRIGHT_RANGES
        .iter()
        .any(|&(lo, hi)| lo <= cp && cp <= hi)
}

/// Greedy line breaking inside `bounds`, block centered vertically.
///
/// A `\n` always ends the current line. Otherwise a character starts a new line when appending
/// it would make the measured line wider than `bounds`; the accumulated line is emitted even
/// when empty, so a character wider than the box on its own still gets a line of its own after
/// an empty one. The last line is always emitted, so empty text yields exactly one empty line.
pub fn layout_horizontal<E>(
    text: &str,
    bounds: Rect,
    line_height: f64,
    align: TextAlign,
    mut measure: impl FnMut(&str) -> Result<f64, E>,
) -> Result<Vec<PlacedLine>, E> {
    let mut lines = Vec::<String>::new();
    let mut cur = String::new();
    for ch in text.chars() {
        if ch == '\n' {
            lines.push(std::mem::take(&mut cur));
            continue;
        }

        let mut next = cur.clone();
        next.push(ch);
        if measure(&next)? > bounds.width() {
            lines.push(std::mem::replace(&mut cur, ch.to_string()));
        } else {
            cur = next;
        }
    }
    lines.push(cur);

    let x = match align {
        TextAlign::Start => bounds.x0,
        TextAlign::Center => bounds.x0 + bounds.width() / 2.0,
        TextAlign::End => bounds.x1,
    };
    let mut y = bounds.y0 + (bounds.height() - line_height * lines.len() as f64) / 2.0;

    let mut out = Vec::with_capacity(lines.len());
    for text in lines {
        out.push(PlacedLine { text, x, y });
        y += line_height;
    }
    Ok(out)
}

/// Right-to-left column layout for CJK-style vertical text.
///
/// Rotated characters occupy `line_width × measured` cells, upright ones
/// `measured × line_width`. A `\n` starts a new column, as does a character whose cell would
/// overflow `bounds` vertically. Columns are centered horizontally as a block; within a column
/// `align` positions the stack against the box height.
pub fn layout_vertical<E>(
    text: &str,
    bounds: Rect,
    line_width: f64,
    align: TextAlign,
    mut measure: impl FnMut(&str) -> Result<f64, E>,
) -> Result<Vec<PlacedColumn>, E> {
    let mut columns = Vec::<(Vec<PlacedGlyph>, f64)>::new();
    let mut cur = Vec::<PlacedGlyph>::new();
    let mut cur_height = 0.0;
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if ch == '\n' {
            columns.push((std::mem::take(&mut cur), cur_height));
            cur_height = 0.0;
            continue;
        }

        let rotated = needs_rotation(ch);
        let measured = measure(ch.encode_utf8(&mut buf))?;
        let advance = if rotated { measured } else { line_width };

        if cur_height + advance > bounds.height() {
            columns.push((std::mem::take(&mut cur), cur_height));
            cur_height = 0.0;
        }
        cur_height += advance;
        // Positions are filled in once the column count is known.
        cur.push(PlacedGlyph {
            ch,
            x: 0.0,
            y: 0.0,
            advance,
            rotated,
        });
    }
    columns.push((cur, cur_height));

    let count = columns.len() as f64;
    let mut x = bounds.x0 + (bounds.width() + line_width * count) / 2.0 - line_width / 2.0;

    let mut out = Vec::with_capacity(columns.len());
    for (mut glyphs, height) in columns {
        let mut y = align.place(bounds.y0, bounds.height(), height);
        for g in &mut glyphs {
            g.x = x;
            g.y = y + g.advance / 2.0;
            y += g.advance;
        }
        out.push(PlacedColumn { x, height, glyphs });
        x -= line_width;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/text.rs"]
mod tests;
