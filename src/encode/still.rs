use std::io::Cursor;

use crate::{
    encode::sink::{FrameSink, FrameTiming, SinkConfig, check_frame_len},
    foundation::error::{MemegenError, MemegenResult},
};

/// Encode straight RGBA8 pixels as PNG.
pub fn encode_png(width: u32, height: u32, rgba8: &[u8]) -> MemegenResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba8.to_vec()).ok_or_else(|| {
        MemegenError::encode(format!(
            "png buffer is {} bytes, expected {} for {width}x{height}",
            rgba8.len(),
            width as usize * height as usize * 4
        ))
    })?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| MemegenError::encode(format!("png encode: {e}")))?;
    Ok(out.into_inner())
}

/// [`FrameSink`] holding exactly one frame, written as PNG on `finish`.
#[derive(Debug, Default)]
pub struct PngSink {
    cfg: Option<SinkConfig>,
    frame: Option<Vec<u8>>,
}

impl PngSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for PngSink {
    fn begin(&mut self, cfg: SinkConfig) -> MemegenResult<()> {
        self.cfg = Some(cfg);
        self.frame = None;
        Ok(())
    }

    fn push_frame(&mut self, rgba8: &[u8], _timing: FrameTiming) -> MemegenResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| MemegenError::encode("push_frame called before begin"))?;
        check_frame_len(&cfg, rgba8)?;
        if self.frame.is_some() {
            return Err(MemegenError::encode("png output holds a single frame"));
        }
        self.frame = Some(rgba8.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> MemegenResult<Vec<u8>> {
        let (Some(cfg), Some(frame)) = (self.cfg, self.frame.take()) else {
            return Err(MemegenError::encode("png output has no frame"));
        };
        encode_png(cfg.width, cfg.height, &frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/still.rs"]
mod tests;
