//! Generator-wide settings, loadable from a JSON file.

use std::path::Path;

use anyhow::Context;

use crate::{
    encode::gif::GifOptions,
    foundation::error::{MemegenError, MemegenResult},
    render::style::TextStyle,
};

/// Settings shared by every generation of a template.
///
/// Every field has a default, so `{}` is a valid configuration document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemegenConfig {
    /// Default text style; slots override it field by field.
    pub style: TextStyle,
    /// GIF output settings.
    pub gif: GifOptions,
    /// Frames buffered between the compositor and the encoder thread.
    pub channel_capacity: usize,
    /// Outline every slot's bounding box in red.
    pub debug_outline: bool,
}

impl Default for MemegenConfig {
    fn default() -> Self {
        Self {
            style: TextStyle::default(),
            gif: GifOptions::default(),
            channel_capacity: 4,
            debug_outline: false,
        }
    }
}

impl MemegenConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_slice(bytes: &[u8]) -> MemegenResult<Self> {
        let cfg: Self = serde_json::from_slice(bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> MemegenResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
        Self::from_json_slice(&bytes)
    }

    /// Check every field.
    pub fn validate(&self) -> MemegenResult<()> {
        self.style.validate()?;
        self.gif.validate()?;
        if self.channel_capacity == 0 {
            return Err(MemegenError::validation("channelCapacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
