use std::sync::{Arc, mpsc};

use crate::{
    assets::{
        catalog::TemplateDescriptor,
        transport::{AssetKind, AssetRequest, AssetTransport},
    },
    config::MemegenConfig,
    foundation::error::{MemegenError, MemegenResult},
    generate::{
        artifact::Artifact,
        generator::Generator,
        slot::{Schedule, TextSlot},
        status::GenerateObserver,
    },
    render::text::TextBackend,
    template::load::{LoadEvent, LoadState},
};

/// A template being loaded, or ready to generate memes.
///
/// The generator is created exactly once, when the second of the two asset streams
/// completes. Until then `generate` returns `Ok(None)`.
pub struct Template {
    descriptor: TemplateDescriptor,
    config: MemegenConfig,
    backend: Arc<dyn TextBackend>,
    load: LoadState,
    schedule_bytes: Option<Vec<u8>>,
    image_bytes: Option<Vec<u8>>,
    schedule: Schedule,
    generator: Option<Generator>,
}

impl Template {
    /// Template in the loading state, waiting for [`Template::apply`] events.
    pub fn new(
        descriptor: TemplateDescriptor,
        config: MemegenConfig,
        backend: Arc<dyn TextBackend>,
    ) -> MemegenResult<Self> {
        config.validate()?;
        Ok(Self {
            descriptor,
            config,
            backend,
            load: LoadState::default(),
            schedule_bytes: None,
            image_bytes: None,
            schedule: Schedule::default(),
            generator: None,
        })
    }

    /// Fetch both assets through `transport` concurrently and return a ready template.
    ///
    /// `on_progress` receives the combined loading fraction after every transfer event, on the
    /// calling thread.
    #[tracing::instrument(skip_all, fields(template = %descriptor.id))]
    pub fn load(
        descriptor: TemplateDescriptor,
        transport: &dyn AssetTransport,
        config: MemegenConfig,
        backend: Arc<dyn TextBackend>,
        mut on_progress: impl FnMut(f32),
    ) -> MemegenResult<Self> {
        let requests = [
            AssetRequest::schedule(&descriptor),
            AssetRequest::image(&descriptor),
        ];
        let mut template = Self::new(descriptor, config, backend)?;

        std::thread::scope(|scope| -> MemegenResult<()> {
            let (tx, rx) = mpsc::channel::<MemegenResult<LoadEvent>>();
            for request in requests {
                let tx = tx.clone();
                scope.spawn(move || {
                    let kind = request.kind;
                    let progress_tx = tx.clone();
                    let fetched = transport.fetch(&request, &mut |loaded, total| {
                        let _ = progress_tx.send(Ok(LoadEvent::Progress {
                            kind,
                            loaded,
                            total,
                        }));
                    });
                    let _ = tx.send(fetched.map(|bytes| LoadEvent::Completed { kind, bytes }));
                });
            }
            drop(tx);

            for event in rx {
                template.apply(event?)?;
                on_progress(template.loading_progress());
            }
            Ok(())
        })?;

        if template.is_loading() {
            return Err(MemegenError::transport(format!(
                "template '{}' did not finish loading",
                template.descriptor.id
            )));
        }
        Ok(template)
    }

    /// Feed one transfer event. Builds the generator once both assets are in.
    pub fn apply(&mut self, event: LoadEvent) -> MemegenResult<()> {
        if self.generator.is_some() {
            tracing::trace!(kind = ?event.kind(), "load event after ready; ignored");
            return Ok(());
        }

        match event {
            LoadEvent::Progress {
                kind,
                loaded,
                total,
            } => self.load.record(kind, loaded, total),
            LoadEvent::Completed { kind, bytes } => {
                tracing::debug!(?kind, bytes = bytes.len(), "asset loaded");
                self.load.complete(kind, bytes.len() as u64);
                match kind {
                    AssetKind::Schedule => self.schedule_bytes = Some(bytes),
                    AssetKind::Image => self.image_bytes = Some(bytes),
                }
            }
        }

        if let (Some(schedule), Some(image)) = (&self.schedule_bytes, &self.image_bytes) {
            let kind = self.descriptor.kind();
            let schedule = Schedule::parse(schedule, kind)?;
            let generator = Generator::new(kind, image, self.config.clone(), self.backend.clone())?;
            tracing::debug!(
                ?kind,
                slots = schedule.len(),
                frames = generator.frame_count(),
                "template ready"
            );
            self.schedule = schedule;
            self.generator = Some(generator);
            self.schedule_bytes = None;
            self.image_bytes = None;
        }
        Ok(())
    }

    /// Identity of this template.
    pub fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    /// Whether the generator is not built yet.
    pub fn is_loading(&self) -> bool {
        self.generator.is_none()
    }

    /// Combined asset loading fraction.
    pub fn loading_progress(&self) -> f32 {
        self.load.progress()
    }

    /// Per-stream loading counters.
    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// Whether a generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.generator.as_ref().is_some_and(Generator::is_generating)
    }

    /// Progress of the running generation, `None` while idle or loading.
    pub fn generating_progress(&self) -> Option<f32> {
        self.generator
            .as_ref()
            .and_then(Generator::generating_progress)
    }

    /// The generator, once loading finished.
    pub fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    /// Slots in drawing order. Empty while loading.
    pub fn text_slots(&self) -> &[TextSlot] {
        self.schedule.slots()
    }

    /// Set the caller text of slot `index`.
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> MemegenResult<()> {
        self.schedule.set_text(index, text)
    }

    /// Reset every caller text.
    pub fn clear_texts(&mut self) {
        self.schedule.clear_texts();
    }

    /// Generate with the current slot texts.
    ///
    /// Returns `Ok(None)` while loading or while another generation runs.
    pub fn generate(&self, observer: &dyn GenerateObserver) -> MemegenResult<Option<Artifact>> {
        let Some(generator) = &self.generator else {
            tracing::debug!(template = %self.descriptor.id, "generate requested while loading");
            return Ok(None);
        };
        generator.generate(&self.schedule, observer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
