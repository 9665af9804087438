//! Output encoders.

/// Animated GIF sink.
pub mod gif;
/// Frame sink contract.
pub mod sink;
/// PNG output for still templates.
pub mod still;
