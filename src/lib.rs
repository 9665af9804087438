//! memegen turns meme templates into finished images.
//!
//! A template is a still or animated image plus a schedule of text slots. Generation decodes
//! the image, draws each slot's text onto the frames where it is active, and re-encodes the
//! result as GIF (animated) or PNG (still).
//!
//! # Pipeline overview
//!
//! 1. **Load**: fetch `template.json` and the image through an [`AssetTransport`] into a
//!    [`Template`] (two concurrent streams, combined progress).
//! 2. **Decode**: [`GifFrameSource`] composites GIF sub-frames honouring disposal; stills go
//!    through `image`.
//! 3. **Composite**: a [`Compositor`] lays text out horizontally or in CJK-style vertical
//!    columns and paints it with the `vello_cpu` text backend ([`FontBook`]).
//! 4. **Encode**: frames stream in order to a [`FrameSink`] on a worker thread and come back
//!    as an [`Artifact`].
//!
//! Only one generation runs per template at a time. A second request while one is running,
//! or while assets are still loading, returns `Ok(None)`.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Template catalog, asset transport and image decoding.
pub mod assets;
pub mod config;
pub mod encode;
pub mod generate;
/// Pure text layout.
pub mod layout;
pub mod render;
pub mod template;

pub use crate::foundation::core::{Affine, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{MemegenError, MemegenResult};

pub use crate::assets::catalog::{ImageKind, TemplateCatalog, TemplateDescriptor};
pub use crate::assets::decode::{DisposalMode, FrameInfo, FrameSource, GifFrameSource};
pub use crate::assets::transport::{AssetKind, AssetRequest, AssetTransport, FsTransport};
pub use crate::config::MemegenConfig;
pub use crate::encode::gif::{GifOptions, GifSink};
pub use crate::encode::sink::{FrameSink, FrameTiming, InMemorySink, SinkConfig};
pub use crate::encode::still::{PngSink, encode_png};
pub use crate::generate::artifact::{Artifact, ArtifactKind};
pub use crate::generate::generator::Generator;
pub use crate::generate::slot::{Schedule, TextSlot};
pub use crate::generate::status::{
    GenerateEvent, GenerateObserver, GenerationStatus, NoopObserver,
};
pub use crate::layout::text::TextAlign;
pub use crate::render::compositor::Compositor;
pub use crate::render::cpu::FontBook;
pub use crate::render::style::{StyleOverrides, TextStyle};
pub use crate::render::text::{TextBackend, TextRasterizer};
pub use crate::template::load::{LoadEvent, LoadState};
pub use crate::template::model::Template;
