use crate::assets::transport::AssetKind;

/// Total assumed for a stream until its transfer reports a real size.
pub const PROVISIONAL_TOTAL_BYTES: u64 = 2 * 1024 * 1024;

/// One observation from an asset transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadEvent {
    /// Bytes received so far for `kind`; `total` is `None` while unknown.
    Progress {
        /// Asset stream.
        kind: AssetKind,
        /// Bytes received.
        loaded: u64,
        /// Expected size, if known.
        total: Option<u64>,
    },
    /// The whole asset arrived.
    Completed {
        /// Asset stream.
        kind: AssetKind,
        /// Asset content.
        bytes: Vec<u8>,
    },
}

impl LoadEvent {
    /// Stream the event belongs to.
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Progress { kind, .. } | Self::Completed { kind, .. } => *kind,
        }
    }
}

/// Byte counters of a single asset stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamProgress {
    /// Bytes received.
    pub loaded: u64,
    /// Reported size, if any.
    pub total: Option<u64>,
    /// Whether the stream completed.
    pub done: bool,
}

impl StreamProgress {
    fn effective_total(&self) -> u64 {
        self.total
            .unwrap_or(PROVISIONAL_TOTAL_BYTES)
            .max(self.loaded)
    }
}

/// Combined progress of the schedule and image downloads.
///
/// The reported fraction is a high-water mark, so a late, larger `total` never makes it go
/// backwards. It is exactly `1.0` once both streams completed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadState {
    schedule: StreamProgress,
    image: StreamProgress,
    reported: f32,
}

impl LoadState {
    /// Counters of one stream.
    pub fn stream(&self, kind: AssetKind) -> StreamProgress {
        match kind {
            AssetKind::Schedule => self.schedule,
            AssetKind::Image => self.image,
        }
    }

    fn stream_mut(&mut self, kind: AssetKind) -> &mut StreamProgress {
        match kind {
            AssetKind::Schedule => &mut self.schedule,
            AssetKind::Image => &mut self.image,
        }
    }

    /// Record a progress report. Reports for completed streams are ignored.
    pub fn record(&mut self, kind: AssetKind, loaded: u64, total: Option<u64>) {
        let stream = self.stream_mut(kind);
        if stream.done {
            return;
        }
        stream.loaded = stream.loaded.max(loaded);
        if total.is_some() {
            stream.total = total;
        }
        self.refresh();
    }

    /// Mark a stream complete with its final size.
    pub fn complete(&mut self, kind: AssetKind, len: u64) {
        *self.stream_mut(kind) = StreamProgress {
            loaded: len,
            total: Some(len),
            done: true,
        };
        self.refresh();
    }

    /// Whether both streams completed.
    pub fn is_complete(&self) -> bool {
        self.schedule.done && self.image.done
    }

    /// Combined fraction in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.reported
    }

    fn refresh(&mut self) {
        if self.is_complete() {
            self.reported = 1.0;
            return;
        }
        let loaded = self.schedule.loaded + self.image.loaded;
        let total = self.schedule.effective_total() + self.image.effective_total();
        let raw = if total == 0 {
            0.0
        } else {
            (loaded as f64 / total as f64) as f32
        };
        self.reported = self.reported.max(raw.min(1.0));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/load.rs"]
mod tests;
