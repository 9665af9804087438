use crate::{
    assets::catalog::ImageKind,
    foundation::{
        core::Rect,
        error::{MemegenError, MemegenResult},
    },
    render::style::StyleOverrides,
};

/// One overlay region of a template.
///
/// Geometry is in canvas pixels; `start_time`/`end_time` are seconds from the first frame and
/// must be given together.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSlot {
    /// Stable identifier, `slot-<index>` when the document omits it.
    #[serde(default)]
    pub id: String,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// First second (inclusive) at which the slot is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// Second (exclusive) at which the slot stops being shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Text used while `current_text` is empty.
    #[serde(default, alias = "text")]
    pub default_text: String,
    /// Caller-edited text. Never read from the schedule document.
    #[serde(skip)]
    pub current_text: String,
    /// Style overrides layered over the generator defaults.
    #[serde(flatten)]
    pub style: StyleOverrides,
}

impl TextSlot {
    /// Untimed slot covering `bounds`.
    pub fn new(id: impl Into<String>, bounds: Rect, default_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            start_time: None,
            end_time: None,
            default_text: default_text.into(),
            current_text: String::new(),
            style: StyleOverrides::default(),
        }
    }

    /// Same slot shown during `[start, end)` seconds.
    pub fn with_timing(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    /// Bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// `(start, end)` when the slot is timed.
    pub fn timing(&self) -> Option<(f64, f64)> {
        self.start_time.zip(self.end_time)
    }

    /// `current_text`, or `default_text` when the former is empty.
    pub fn effective_text(&self) -> &str {
        if self.current_text.is_empty() {
            &self.default_text
        } else {
            &self.current_text
        }
    }

    /// Whether `time` (seconds) falls in `[start, end)`. Untimed slots are always active.
    pub fn is_active_at(&self, time: f64) -> bool {
        match self.timing() {
            Some((start, end)) => start <= time && time < end,
            None => true,
        }
    }

    /// Whether the slot is over at `time`.
    pub fn has_ended_by(&self, time: f64) -> bool {
        self.end_time.is_some_and(|end| end <= time)
    }

    fn validate(&self) -> MemegenResult<()> {
        let geometry = [self.x, self.y, self.width, self.height];
        if geometry.iter().any(|v| !v.is_finite()) || self.x < 0.0 || self.y < 0.0 {
            return Err(MemegenError::validation(format!(
                "slot '{}': geometry must be finite and non-negative",
                self.id
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(MemegenError::validation(format!(
                "slot '{}': width and height must be > 0",
                self.id
            )));
        }
        match (self.start_time, self.end_time) {
            (None, None) => Ok(()),
            (Some(start), Some(end)) => {
                if !start.is_finite() || !end.is_finite() || start < 0.0 {
                    return Err(MemegenError::validation(format!(
                        "slot '{}': times must be finite and non-negative",
                        self.id
                    )));
                }
                if start >= end {
                    return Err(MemegenError::validation(format!(
                        "slot '{}': startTime {start} must be before endTime {end}",
                        self.id
                    )));
                }
                Ok(())
            }
            _ => Err(MemegenError::validation(format!(
                "slot '{}': startTime and endTime must be given together",
                self.id
            ))),
        }
    }
}

/// Validated, ordered list of text slots for one template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    slots: Vec<TextSlot>,
}

impl Schedule {
    /// Parse a `template.json` slot array for a template of `kind`.
    pub fn parse(bytes: &[u8], kind: ImageKind) -> MemegenResult<Self> {
        let slots: Vec<TextSlot> = serde_json::from_slice(bytes)?;
        Self::from_slots(slots, kind)
    }

    /// Validate and order `slots`.
    ///
    /// Animated schedules need timing on every slot, are stably sorted by start time and may
    /// not overlap. Static schedules keep document order.
    pub fn from_slots(mut slots: Vec<TextSlot>, kind: ImageKind) -> MemegenResult<Self> {
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.id.is_empty() {
                slot.id = format!("slot-{i}");
            }
            slot.validate()?;
        }

        if kind == ImageKind::Animated {
            if let Some(slot) = slots.iter().find(|s| s.timing().is_none()) {
                return Err(MemegenError::validation(format!(
                    "slot '{}': animated templates need startTime and endTime",
                    slot.id
                )));
            }
            slots.sort_by(|a, b| {
                let start = |s: &TextSlot| s.start_time.unwrap_or(0.0);
                start(a).total_cmp(&start(b))
            });
            for pair in slots.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                if let (Some((_, prev_end)), Some((next_start, _))) =
                    (prev.timing(), next.timing())
                    && next_start < prev_end
                {
                    return Err(MemegenError::validation(format!(
                        "slots '{}' and '{}' overlap in time",
                        prev.id, next.id
                    )));
                }
            }
        }

        Ok(Self { slots })
    }

    /// Slots in drawing order.
    pub fn slots(&self) -> &[TextSlot] {
        &self.slots
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the schedule has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Set the caller text of slot `index`.
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> MemegenResult<()> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            MemegenError::validation(format!("slot index {index} out of range (len={len})"))
        })?;
        slot.current_text = text.into();
        Ok(())
    }

    /// Reset every caller text so defaults apply again.
    pub fn clear_texts(&mut self) {
        for slot in &mut self.slots {
            slot.current_text.clear();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/slot.rs"]
mod tests;
