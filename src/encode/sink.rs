use crate::{
    assets::decode::DisposalMode,
    foundation::error::{MemegenError, MemegenResult},
};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Number of frames that will be pushed.
    pub frame_count: usize,
}

/// Display timing of one output frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTiming {
    /// How long the frame stays on screen, in milliseconds.
    pub delay_ms: u32,
    /// Disposal applied after the frame is shown.
    pub disposal: DisposalMode,
}

impl FrameTiming {
    /// Timing from a source delay in GIF centiseconds.
    pub fn from_ticks(duration_ticks: u16, disposal: DisposalMode) -> Self {
        Self {
            delay_ms: u32::from(duration_ticks) * 10,
            disposal,
        }
    }
}

/// Consumer of composited frames, in index order.
///
/// Frames are straight-alpha RGBA8 buffers of exactly `width * height * 4` bytes.
pub trait FrameSink: Send {
    /// Called once before any frame is pushed.
    fn begin(&mut self, cfg: SinkConfig) -> MemegenResult<()>;
    /// Append one frame.
    fn push_frame(&mut self, rgba8: &[u8], timing: FrameTiming) -> MemegenResult<()>;
    /// Called once after the last frame; returns the encoded bytes.
    fn finish(&mut self) -> MemegenResult<Vec<u8>>;
}

/// Sink that keeps raw frames, for tests and inspection.
///
/// `finish` returns the frames concatenated.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(Vec<u8>, FrameTiming)>,
    finished: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(Vec<u8>, FrameTiming)] {
        &self.frames
    }

    /// Whether `finish` has been called since the last `begin`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> MemegenResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, rgba8: &[u8], timing: FrameTiming) -> MemegenResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| MemegenError::encode("push_frame called before begin"))?;
        check_frame_len(&cfg, rgba8)?;
        self.frames.push((rgba8.to_vec(), timing));
        Ok(())
    }

    fn finish(&mut self) -> MemegenResult<Vec<u8>> {
        self.finished = true;
        Ok(self.frames.iter().flat_map(|(px, _)| px.iter().copied()).collect())
    }
}

pub(crate) fn check_frame_len(cfg: &SinkConfig, rgba8: &[u8]) -> MemegenResult<()> {
    let expected = cfg.width as usize * cfg.height as usize * 4;
    if rgba8.len() != expected {
        return Err(MemegenError::encode(format!(
            "frame is {} bytes, expected {expected} for {}x{}",
            rgba8.len(),
            cfg.width,
            cfg.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
