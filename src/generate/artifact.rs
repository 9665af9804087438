use std::path::Path;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::foundation::error::MemegenResult;

/// Container format of a generated image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Animated GIF.
    Gif,
    /// Still PNG.
    Png,
}

impl ArtifactKind {
    /// MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Png => "image/png",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Png => "png",
        }
    }
}

/// Finished meme image held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    kind: ArtifactKind,
    bytes: Vec<u8>,
    frame_count: usize,
}

impl Artifact {
    /// Wrap encoded bytes.
    pub fn new(kind: ArtifactKind, bytes: Vec<u8>, frame_count: usize) -> Self {
        Self {
            kind,
            bytes,
            frame_count,
        }
    }

    /// Container format.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// MIME type of the bytes.
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of frames encoded.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// `data:<mime>;base64,<payload>` form for embedding.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            BASE64_STANDARD.encode(&self.bytes)
        )
    }

    /// Write the bytes to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> MemegenResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create '{}'", parent.display()))?;
        }
        std::fs::write(path, &self.bytes).with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/artifact.rs"]
mod tests;
