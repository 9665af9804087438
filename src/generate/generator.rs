use std::sync::{Arc, mpsc};

use crate::{
    assets::{
        catalog::ImageKind,
        decode::{FrameSource, GifFrameSource, StillImage, decode_still},
    },
    config::MemegenConfig,
    encode::{
        gif::GifSink,
        sink::{FrameSink, FrameTiming, SinkConfig},
        still::PngSink,
    },
    foundation::error::{MemegenError, MemegenResult},
    generate::{
        artifact::{Artifact, ArtifactKind},
        slot::Schedule,
        status::{GenerateEvent, GenerateObserver, GenerationStatus, RunGuard},
    },
    render::{compositor::Compositor, text::TextBackend},
};

/// Turns a decoded template image plus a [`Schedule`] into an encoded meme.
///
/// At most one generation runs at a time per generator; a concurrent call returns `Ok(None)`
/// and leaves the running session untouched.
pub enum Generator {
    /// Frame-by-frame GIF path.
    Animated(AnimatedGenerator),
    /// Single-frame PNG path.
    Static(StaticGenerator),
}

/// Animated variant state.
pub struct AnimatedGenerator {
    source: GifFrameSource,
    shared: Shared,
}

/// Static variant state.
pub struct StaticGenerator {
    image: StillImage,
    shared: Shared,
}

struct Shared {
    config: MemegenConfig,
    backend: Arc<dyn TextBackend>,
    status: GenerationStatus,
}

impl Generator {
    /// Decode `image_bytes` as `kind` and build the matching variant.
    pub fn new(
        kind: ImageKind,
        image_bytes: &[u8],
        config: MemegenConfig,
        backend: Arc<dyn TextBackend>,
    ) -> MemegenResult<Self> {
        config.validate()?;
        let shared = Shared {
            config,
            backend,
            status: GenerationStatus::default(),
        };
        Ok(match kind {
            ImageKind::Animated => Self::Animated(AnimatedGenerator {
                source: GifFrameSource::from_bytes(image_bytes)?,
                shared,
            }),
            ImageKind::Static => Self::Static(StaticGenerator {
                image: decode_still(image_bytes)?,
                shared,
            }),
        })
    }

    /// Which variant this is.
    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Animated(_) => ImageKind::Animated,
            Self::Static(_) => ImageKind::Static,
        }
    }

    /// Output canvas size.
    pub fn canvas_size(&self) -> (u32, u32) {
        match self {
            Self::Animated(g) => g.source.canvas_size(),
            Self::Static(g) => (g.image.width, g.image.height),
        }
    }

    /// Number of output frames.
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Animated(g) => g.source.frame_count(),
            Self::Static(_) => 1,
        }
    }

    /// Polled running state.
    pub fn status(&self) -> &GenerationStatus {
        &self.shared().status
    }

    /// Whether a generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.status().is_running()
    }

    /// Progress of the running generation, `None` while idle.
    pub fn generating_progress(&self) -> Option<f32> {
        self.status().progress()
    }

    fn shared(&self) -> &Shared {
        match self {
            Self::Animated(g) => &g.shared,
            Self::Static(g) => &g.shared,
        }
    }

    /// Generate with the default encoder for this variant (GIF or PNG).
    ///
    /// Emits `Progress` events followed by one `Finished` event carrying the returned artifact.
    /// The status is back to idle before `Finished` is delivered.
    pub fn generate(
        &self,
        schedule: &Schedule,
        observer: &dyn GenerateObserver,
    ) -> MemegenResult<Option<Artifact>> {
        let (mut sink, kind): (Box<dyn FrameSink>, _) = match self {
            Self::Animated(g) => (
                Box::new(GifSink::new(g.shared.config.gif.clone())?),
                ArtifactKind::Gif,
            ),
            Self::Static(_) => (Box::new(PngSink::new()), ArtifactKind::Png),
        };

        let Some(bytes) = self.generate_into(schedule, sink.as_mut(), observer)? else {
            return Ok(None);
        };
        let artifact = Artifact::new(kind, bytes, self.frame_count());
        tracing::info!(
            frames = artifact.frame_count(),
            bytes = artifact.bytes().len(),
            mime = artifact.mime_type(),
            "meme generated"
        );
        observer.on_event(GenerateEvent::Finished(artifact.clone()));
        Ok(Some(artifact))
    }

    /// Run one generation into `sink` and return what its `finish` produced.
    ///
    /// Only `Progress` events are emitted. Returns `Ok(None)` when a generation is already
    /// running.
    #[tracing::instrument(skip_all, fields(kind = ?self.kind(), slots = schedule.len()))]
    pub fn generate_into(
        &self,
        schedule: &Schedule,
        sink: &mut dyn FrameSink,
        observer: &dyn GenerateObserver,
    ) -> MemegenResult<Option<Vec<u8>>> {
        let Some(guard) = self.status().try_begin() else {
            tracing::debug!("generation already running; ignoring request");
            return Ok(None);
        };
        tracing::debug!("generation started");

        let result = match self {
            Self::Animated(g) => g.run(schedule, sink, observer, &guard),
            Self::Static(g) => g.run(schedule, sink, observer, &guard),
        };
        drop(guard);

        match &result {
            Ok(_) => tracing::debug!("generation finished"),
            Err(e) => tracing::debug!(error = %e, "generation failed"),
        }
        result.map(Some)
    }
}

impl Shared {
    fn compositor(&self, width: u32, height: u32) -> MemegenResult<Compositor> {
        Ok(Compositor::new(
            width,
            height,
            self.config.style.clone(),
            self.backend.rasterizer()?,
        )?
        .with_debug_outline(self.config.debug_outline))
    }
}

impl AnimatedGenerator {
    fn run(
        &self,
        schedule: &Schedule,
        sink: &mut dyn FrameSink,
        observer: &dyn GenerateObserver,
        guard: &RunGuard<'_>,
    ) -> MemegenResult<Vec<u8>> {
        let mut source = self.source.clone();
        let frame_count = source.frame_count();
        let first = source.frame_info(0)?;
        let (width, height) = (first.width, first.height);

        let mut compositor = self.shared.compositor(width, height)?;
        let mut scratch = vec![0u8; width as usize * height as usize * 4];
        let slots = schedule.slots();

        sink.begin(SinkConfig {
            width,
            height,
            frame_count,
        })?;

        let encoder_sink = &mut *sink;
        std::thread::scope(|scope| -> MemegenResult<()> {
            let (tx, rx) =
                mpsc::sync_channel::<(Vec<u8>, FrameTiming)>(self.shared.config.channel_capacity);

            let encoder = scope.spawn(move || -> MemegenResult<()> {
                for (i, (frame, timing)) in rx.into_iter().enumerate() {
                    encoder_sink.push_frame(&frame, timing)?;
                    let progress = guard.advance((i + 1) as f32 / frame_count as f32);
                    observer.on_event(GenerateEvent::Progress(progress));
                }
                Ok(())
            });

            let mut produce = || -> MemegenResult<()> {
                // Whole ticks since the first frame; seconds are derived, never accumulated.
                let mut ticks = 0u64;
                let mut cursor = 0usize;
                for i in 0..frame_count {
                    let time = ticks as f64 / 100.0;
                    let info = source.frame_info(i)?;
                    source.decode_frame_into(i, &mut scratch)?;
                    compositor.blit(&scratch)?;

                    while let Some(slot) = slots.get(cursor)
                        && slot.has_ended_by(time)
                    {
                        cursor += 1;
                    }
                    if let Some(slot) = slots.get(cursor)
                        && slot.is_active_at(time)
                    {
                        tracing::trace!(frame = i, time, slot = %slot.id, "drawing slot");
                        compositor.draw_overlay(slot.effective_text(), slot.bounds(), &slot.style)?;
                    }

                    let timing = FrameTiming::from_ticks(info.duration_ticks, info.disposal);
                    tx.send((compositor.snapshot(), timing))
                        .map_err(|_| MemegenError::encode("encoder stopped early"))?;
                    ticks += u64::from(info.duration_ticks);
                }
                Ok(())
            };
            let produced = produce();
            drop(tx);

            let encoded = encoder
                .join()
                .map_err(|_| MemegenError::encode("encoder thread panicked"))?;
            // A failed send is a symptom of the encoder error; report the cause.
            encoded?;
            produced
        })?;

        sink.finish()
    }
}

impl StaticGenerator {
    fn run(
        &self,
        schedule: &Schedule,
        sink: &mut dyn FrameSink,
        observer: &dyn GenerateObserver,
        guard: &RunGuard<'_>,
    ) -> MemegenResult<Vec<u8>> {
        let (width, height) = (self.image.width, self.image.height);
        let mut compositor = self.shared.compositor(width, height)?;
        compositor.blit(&self.image.rgba8)?;
        for slot in schedule.slots() {
            compositor.draw_overlay(slot.effective_text(), slot.bounds(), &slot.style)?;
        }

        sink.begin(SinkConfig {
            width,
            height,
            frame_count: 1,
        })?;
        sink.push_frame(&compositor.snapshot(), FrameTiming::default())?;
        let bytes = sink.finish()?;
        observer.on_event(GenerateEvent::Progress(guard.advance(1.0)));
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/generator.rs"]
mod tests;
