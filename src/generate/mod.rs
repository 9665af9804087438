//! Generation pipeline: schedule, generator state machine, progress and artifacts.

/// Encoded output.
pub mod artifact;
/// Animated and static generators.
pub mod generator;
/// Text slots and their validated schedule.
pub mod slot;
/// Running state and progress observation.
pub mod status;
