use crate::{
    encode::sink::{FrameSink, FrameTiming, SinkConfig, check_frame_len},
    foundation::error::{MemegenError, MemegenResult},
};

/// GIF output settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GifOptions {
    /// NeuQuant sampling speed, `1` (best) to `30` (fastest).
    pub speed: i32,
    /// Loop the animation forever instead of playing once.
    pub repeat_forever: bool,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            speed: 10,
            repeat_forever: true,
        }
    }
}

impl GifOptions {
    /// Check `speed` is in the range the quantizer accepts.
    pub fn validate(&self) -> MemegenResult<()> {
        if !(1..=30).contains(&self.speed) {
            return Err(MemegenError::validation(format!(
                "gif speed must be in 1..=30, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

/// [`FrameSink`] producing an animated GIF in memory.
///
/// Every pushed frame covers the whole canvas and gets its own quantized palette.
pub struct GifSink {
    options: GifOptions,
    state: Option<GifState>,
}

struct GifState {
    cfg: SinkConfig,
    width: u16,
    height: u16,
    encoder: gif::Encoder<Vec<u8>>,
    frames: usize,
}

impl GifSink {
    /// Sink writing with `options`.
    pub fn new(options: GifOptions) -> MemegenResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            state: None,
        })
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> MemegenResult<()> {
        let width: u16 = cfg
            .width
            .try_into()
            .map_err(|_| MemegenError::encode("gif width exceeds u16"))?;
        let height: u16 = cfg
            .height
            .try_into()
            .map_err(|_| MemegenError::encode("gif height exceeds u16"))?;

        let mut encoder = gif::Encoder::new(Vec::new(), width, height, &[])?;
        if self.options.repeat_forever {
            encoder.set_repeat(gif::Repeat::Infinite)?;
        }
        self.state = Some(GifState {
            cfg,
            width,
            height,
            encoder,
            frames: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, rgba8: &[u8], timing: FrameTiming) -> MemegenResult<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| MemegenError::encode("push_frame called before begin"))?;
        check_frame_len(&state.cfg, rgba8)?;

        let mut pixels = rgba8.to_vec();
        let mut frame =
            gif::Frame::from_rgba_speed(state.width, state.height, &mut pixels, self.options.speed);
        frame.delay = ms_to_centis(timing.delay_ms);
        frame.dispose = timing.disposal.into();
        state.encoder.write_frame(&frame)?;
        state.frames += 1;
        tracing::trace!(frame = state.frames, delay = frame.delay, "gif frame written");
        Ok(())
    }

    fn finish(&mut self) -> MemegenResult<Vec<u8>> {
        let state = self
            .state
            .take()
            .ok_or_else(|| MemegenError::encode("finish called before begin"))?;
        if state.frames == 0 {
            return Err(MemegenError::encode("gif needs at least one frame"));
        }
        state
            .encoder
            .into_inner()
            .map_err(|e| MemegenError::encode(format!("finish gif stream: {e}")))
    }
}

fn ms_to_centis(ms: u32) -> u16 {
    ms.div_ceil(10).min(u32::from(u16::MAX)) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
