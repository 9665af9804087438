use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    mpsc,
};

use crate::generate::artifact::Artifact;

/// Observation delivered while a generation runs.
///
/// `Progress` values never decrease within one generation and `Finished` is always the last
/// event.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateEvent {
    /// Fraction of frames encoded, in `[0, 1]`.
    Progress(f32),
    /// The encoded artifact.
    Finished(Artifact),
}

/// Receiver of [`GenerateEvent`]s. Progress may arrive from the encoder thread.
pub trait GenerateObserver: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: GenerateEvent);
}

/// Observer that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl GenerateObserver for NoopObserver {
    fn on_event(&self, _event: GenerateEvent) {}
}

impl GenerateObserver for mpsc::Sender<GenerateEvent> {
    fn on_event(&self, event: GenerateEvent) {
        if self.send(event).is_err() {
            tracing::trace!("generate observer disconnected");
        }
    }
}

impl GenerateObserver for mpsc::SyncSender<GenerateEvent> {
    fn on_event(&self, event: GenerateEvent) {
        if self.send(event).is_err() {
            tracing::trace!("generate observer disconnected");
        }
    }
}

/// Polled state of a generator: idle, or running with a progress fraction.
#[derive(Debug, Default)]
pub struct GenerationStatus {
    running: AtomicBool,
    progress_bits: AtomicU32,
}

impl GenerationStatus {
    /// Whether a generation is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Progress of the running generation, `None` while idle.
    pub fn progress(&self) -> Option<f32> {
        self.is_running()
            .then(|| f32::from_bits(self.progress_bits.load(Ordering::Acquire)))
    }

    /// Enter the running state unless already there.
    pub(crate) fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.progress_bits.store(0f32.to_bits(), Ordering::Release);
        Some(RunGuard { status: self })
    }
}

/// Proof of the single running session; returns the status to idle on drop.
#[derive(Debug)]
pub(crate) struct RunGuard<'a> {
    status: &'a GenerationStatus,
}

impl RunGuard<'_> {
    /// Raise progress to `value`, clamped to `[0, 1]`. Lower values are ignored.
    pub(crate) fn advance(&self, value: f32) -> f32 {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        // Non-negative floats order the same as their bit patterns.
        let prev = self
            .status
            .progress_bits
            .fetch_max(value.to_bits(), Ordering::AcqRel);
        f32::from_bits(prev).max(value)
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.status.progress_bits.store(0f32.to_bits(), Ordering::Release);
        self.status.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/status.rs"]
mod tests;
