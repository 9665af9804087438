//! Surfaces, text styles and the CPU text rasterizer.
//!
//! [`compositor::Compositor`] is the per-session entry point: it takes decoded frames, lays out
//! overlay text with [`crate::layout::text`] and hands positioned runs to a
//! [`text::TextRasterizer`].

/// Per-session frame surface plus overlay drawing.
pub mod compositor;
/// Parley + `vello_cpu` text backend.
pub mod cpu;
/// Text style defaults and per-slot overrides.
pub mod style;
/// Premultiplied RGBA8 pixel surface.
pub mod surface;
/// Text run model and rasterizer traits.
pub mod text;
