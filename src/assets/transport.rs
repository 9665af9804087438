use std::{
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    assets::catalog::TemplateDescriptor,
    foundation::error::{MemegenError, MemegenResult},
};

/// File stem shared by both template assets.
pub const TEMPLATE_FILE_STEM: &str = "template";
/// Extension of the schedule document.
pub const SCHEDULE_EXTENSION: &str = ".json";

/// Which of the two template assets a request addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// The text-slot schedule document.
    Schedule,
    /// The raw image bytes.
    Image,
}

/// Address of one template asset: `(template id, fixed file stem, extension)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRequest {
    /// Template id.
    pub template_id: String,
    /// Asset role.
    pub kind: AssetKind,
    /// Extension including the leading dot.
    pub extension: String,
}

impl AssetRequest {
    /// Request for the schedule document of `descriptor`.
    pub fn schedule(descriptor: &TemplateDescriptor) -> Self {
        Self {
            template_id: descriptor.id.clone(),
            kind: AssetKind::Schedule,
            extension: SCHEDULE_EXTENSION.to_string(),
        }
    }

    /// Request for the image of `descriptor`.
    pub fn image(descriptor: &TemplateDescriptor) -> Self {
        Self {
            template_id: descriptor.id.clone(),
            kind: AssetKind::Image,
            extension: descriptor.file_extension.clone(),
        }
    }

    /// Normalized `<id>/template<ext>` path.
    pub fn relative_path(&self) -> MemegenResult<String> {
        normalize_rel_path(&format!(
            "{}/{TEMPLATE_FILE_STEM}{}",
            self.template_id, self.extension
        ))
    }
}

/// Fetch-by-identifier capability supplied by the embedding application.
///
/// `progress` receives `(bytes_loaded, bytes_total)` where the total is `None` until the
/// transfer knows its size. Failures are reported as [`MemegenError::Transport`] and never
/// retried by the core.
pub trait AssetTransport: Send + Sync {
    /// Fetch the bytes for `request`.
    fn fetch(
        &self,
        request: &AssetRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> MemegenResult<Vec<u8>>;
}

/// [`AssetTransport`] reading `<root>/<id>/template<ext>` from the filesystem.
#[derive(Clone, Debug)]
pub struct FsTransport {
    root: PathBuf,
    chunk_size: usize,
}

impl FsTransport {
    /// Transport rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: 64 * 1024,
        }
    }

    /// Override the read chunk size (and with it the progress granularity).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl AssetTransport for FsTransport {
    #[tracing::instrument(skip(self, progress), fields(id = %request.template_id, kind = ?request.kind))]
    fn fetch(
        &self,
        request: &AssetRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> MemegenResult<Vec<u8>> {
        let path = self.root.join(Path::new(&request.relative_path()?));
        let io_err =
            |e: std::io::Error| MemegenError::transport(format!("'{}': {e}", path.display()));

        let mut file = std::fs::File::open(&path).map_err(io_err)?;
        let total = file.metadata().map_err(io_err)?.len();
        progress(0, Some(total));

        let mut out = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let n = file.read(&mut chunk).map_err(io_err)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
            progress(out.len() as u64, Some(total.max(out.len() as u64)));
        }

        tracing::debug!(bytes = out.len(), "fetched asset");
        Ok(out)
    }
}

/// Normalize and validate relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> MemegenResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(MemegenError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(MemegenError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(MemegenError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(MemegenError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/transport.rs"]
mod tests;
