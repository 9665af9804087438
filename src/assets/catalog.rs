use std::{collections::BTreeMap, path::Path};

use anyhow::Context;

use crate::foundation::error::{MemegenError, MemegenResult};

/// Whether a template is drawn frame by frame or once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Multi-frame GIF, re-encoded as GIF.
    Animated,
    /// Single still image, re-encoded as PNG.
    Static,
}

impl ImageKind {
    /// `.gif` (any case, leading dot optional) is animated; everything else is static.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.');
        if ext.eq_ignore_ascii_case("gif") {
            Self::Animated
        } else {
            Self::Static
        }
    }
}

/// Immutable identity of one template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Catalog id, also the asset directory name.
    pub id: String,
    /// Human readable name.
    pub display_name: String,
    /// Image file extension including the leading dot, e.g. `.gif`.
    pub file_extension: String,
}

impl TemplateDescriptor {
    /// Build a descriptor, normalizing the extension to carry a leading dot.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        let ext = file_extension.into();
        let file_extension = if ext.starts_with('.') {
            ext
        } else {
            format!(".{ext}")
        };
        Self {
            id: id.into(),
            display_name: display_name.into(),
            file_extension,
        }
    }

    /// Image kind implied by the file extension.
    pub fn kind(&self) -> ImageKind {
        ImageKind::from_extension(&self.file_extension)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
struct CatalogEntry {
    name: String,
    extension: String,
}

/// Template list keyed by id, as stored in `templateList.json`:
/// `{ "<id>": { "name": "...", "extension": ".gif" } }`.
#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl TemplateCatalog {
    /// Parse catalog JSON.
    pub fn from_json(bytes: &[u8]) -> MemegenResult<Self> {
        let entries: BTreeMap<String, CatalogEntry> = serde_json::from_slice(bytes)?;
        for (id, entry) in &entries {
            if id.trim().is_empty() {
                return Err(MemegenError::validation("catalog ids must be non-empty"));
            }
            if entry.extension.trim_start_matches('.').is_empty() {
                return Err(MemegenError::validation(format!(
                    "catalog entry '{id}' has an empty extension"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: &Path) -> MemegenResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read template catalog '{}'", path.display()))?;
        Self::from_json(&bytes)
    }

    /// Descriptor for `id`.
    pub fn get(&self, id: &str) -> MemegenResult<TemplateDescriptor> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| MemegenError::validation(format!("unknown template id '{id}'")))?;
        Ok(TemplateDescriptor::new(id, &entry.name, &entry.extension))
    }

    /// All descriptors in id order.
    pub fn descriptors(&self) -> impl Iterator<Item = TemplateDescriptor> + '_ {
        self.entries
            .iter()
            .map(|(id, e)| TemplateDescriptor::new(id, &e.name, &e.extension))
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/catalog.rs"]
mod tests;
