//! Template loading and the load/generate facade.

/// Asset loading progress.
pub mod load;
/// The [`model::Template`] facade.
pub mod model;
