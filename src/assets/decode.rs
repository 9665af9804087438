use std::{io::Cursor, sync::Arc};

use anyhow::Context;

use crate::foundation::{
    core::Rect,
    error::{MemegenError, MemegenResult},
};

/// How a frame's area is treated before the next frame is composited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisposalMode {
    /// No disposal specified; behaves like [`DisposalMode::Keep`].
    #[default]
    Any,
    /// Leave the frame in place.
    Keep,
    /// Clear the frame rect to transparent.
    Background,
    /// Restore the canvas to its state before the frame was drawn.
    Previous,
}

impl From<gif::DisposalMethod> for DisposalMode {
    fn from(d: gif::DisposalMethod) -> Self {
        match d {
            gif::DisposalMethod::Any => Self::Any,
            gif::DisposalMethod::Keep => Self::Keep,
            gif::DisposalMethod::Background => Self::Background,
            gif::DisposalMethod::Previous => Self::Previous,
        }
    }
}

impl From<DisposalMode> for gif::DisposalMethod {
    fn from(d: DisposalMode) -> Self {
        match d {
            DisposalMode::Any => Self::Any,
            DisposalMode::Keep => Self::Keep,
            DisposalMode::Background => Self::Background,
            DisposalMode::Previous => Self::Previous,
        }
    }
}

/// Per-frame metadata.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Composited frame width (the logical screen width).
    pub width: u32,
    /// Composited frame height (the logical screen height).
    pub height: u32,
    /// Display duration in centiseconds.
    pub duration_ticks: u16,
    /// Disposal applied after this frame.
    pub disposal: DisposalMode,
    /// Area covered by this frame's own pixels.
    pub rect: Rect,
}

/// A decoded animated image exposing random access to composited frames.
pub trait FrameSource: Send {
    /// Number of frames.
    fn frame_count(&self) -> usize;

    /// Metadata for frame `index`.
    fn frame_info(&self, index: usize) -> MemegenResult<FrameInfo>;

    /// Composite frame `index` into `buf` as straight RGBA8 (`width * height * 4` bytes).
    ///
    /// The previous contents of `buf` are ignored and fully overwritten.
    fn decode_frame_into(&mut self, index: usize, buf: &mut [u8]) -> MemegenResult<()>;
}

#[derive(Debug)]
struct RawFrame {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    delay: u16,
    disposal: DisposalMode,
    rgba: Vec<u8>,
}

/// [`FrameSource`] over GIF bytes.
///
/// All sub-frames are parsed up front so malformed input fails at construction. Clones share the
/// parsed frames and each owns an independent compositing cursor.
#[derive(Debug, Clone)]
pub struct GifFrameSource {
    width: u32,
    height: u32,
    frames: Arc<[RawFrame]>,
    canvas: Vec<u8>,
    saved: Vec<u8>,
    next: usize,
}

impl GifFrameSource {
    /// Parse GIF bytes.
    pub fn from_bytes(bytes: &[u8]) -> MemegenResult<Self> {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = opts.read_info(Cursor::new(bytes))?;

        let width = u32::from(decoder.width());
        let height = u32::from(decoder.height());
        if width == 0 || height == 0 {
            return Err(MemegenError::decode("gif logical screen has zero size"));
        }

        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame()? {
            frames.push(RawFrame {
                left: u32::from(frame.left),
                top: u32::from(frame.top),
                width: u32::from(frame.width),
                height: u32::from(frame.height),
                delay: frame.delay,
                disposal: frame.dispose.into(),
                rgba: frame.buffer.to_vec(),
            });
        }
        if frames.is_empty() {
            return Err(MemegenError::decode("gif contains no frames"));
        }

        tracing::debug!(width, height, frames = frames.len(), "parsed gif");

        let len = width as usize * height as usize * 4;
        Ok(Self {
            width,
            height,
            frames: frames.into(),
            canvas: vec![0; len],
            saved: Vec::new(),
            next: 0,
        })
    }

    /// Logical screen size.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rewind(&mut self) {
        self.canvas.fill(0);
        self.saved.clear();
        self.next = 0;
    }

    fn for_each_row(&self, f: &RawFrame, mut row: impl FnMut(usize, usize, usize)) {
        let x_end = (f.left + f.width).min(self.width);
        let y_end = (f.top + f.height).min(self.height);
        if f.left >= x_end {
            return;
        }
        let cols = (x_end - f.left) as usize;
        for y in f.top..y_end {
            let dst = (y as usize * self.width as usize + f.left as usize) * 4;
            let src = ((y - f.top) as usize * f.width as usize) * 4;
            row(dst, src, cols);
        }
    }

    fn dispose(&mut self, index: usize) {
        let frames = Arc::clone(&self.frames);
        let f = &frames[index];
        match f.disposal {
            DisposalMode::Any | DisposalMode::Keep => {}
            DisposalMode::Background => {
                let mut canvas = std::mem::take(&mut self.canvas);
                self.for_each_row(f, |dst, _, cols| canvas[dst..dst + cols * 4].fill(0));
                self.canvas = canvas;
            }
            DisposalMode::Previous => {
                if self.saved.len() == self.canvas.len() {
                    self.canvas.copy_from_slice(&self.saved);
                }
            }
        }
    }

    fn draw(&mut self, index: usize) {
        let frames = Arc::clone(&self.frames);
        let f = &frames[index];
        if f.disposal == DisposalMode::Previous {
            self.saved.clone_from(&self.canvas);
        }

        let mut canvas = std::mem::take(&mut self.canvas);
        self.for_each_row(f, |dst, src, cols| {
            let dst_row = &mut canvas[dst..dst + cols * 4];
            let Some(src_row) = f.rgba.get(src..src + cols * 4) else {
                return;
            };
            for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                // Transparent palette entries leave the canvas untouched.
                if s[3] != 0 {
                    d.copy_from_slice(s);
                }
            }
        });
        self.canvas = canvas;
    }
}

impl FrameSource for GifFrameSource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_info(&self, index: usize) -> MemegenResult<FrameInfo> {
        let f = self.frames.get(index).ok_or_else(|| {
            MemegenError::decode(format!(
                "frame index {index} out of range (frame count {})",
                self.frames.len()
            ))
        })?;
        Ok(FrameInfo {
            width: self.width,
            height: self.height,
            duration_ticks: f.delay,
            disposal: f.disposal,
            rect: Rect::new(
                f64::from(f.left),
                f64::from(f.top),
                f64::from(f.left + f.width),
                f64::from(f.top + f.height),
            ),
        })
    }

    fn decode_frame_into(&mut self, index: usize, buf: &mut [u8]) -> MemegenResult<()> {
        if index >= self.frames.len() {
            return Err(MemegenError::decode(format!(
                "frame index {index} out of range (frame count {})",
                self.frames.len()
            )));
        }
        if buf.len() != self.canvas.len() {
            return Err(MemegenError::decode(format!(
                "frame buffer has {} bytes, expected {}",
                buf.len(),
                self.canvas.len()
            )));
        }

        if index < self.next {
            self.rewind();
        }
        while self.next <= index {
            if self.next > 0 {
                self.dispose(self.next - 1);
            }
            self.draw(self.next);
            self.next += 1;
        }

        buf.copy_from_slice(&self.canvas);
        Ok(())
    }
}

/// A decoded still image in straight RGBA8.
#[derive(Clone, Debug)]
pub struct StillImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major straight RGBA8 bytes.
    pub rgba8: Vec<u8>,
}

/// Decode any still format supported by `image` into straight RGBA8.
pub fn decode_still(bytes: &[u8]) -> MemegenResult<StillImage> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| MemegenError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(StillImage {
        width,
        height,
        rgba8: rgba.into_raw(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
