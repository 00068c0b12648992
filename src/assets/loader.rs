use std::path::{Path, PathBuf};

use crate::assets::decode::{PreparedImage, decode_data_url, decode_image};
use crate::foundation::error::{MaskError, MaskResult};

/// Resolves an image URL into decoded pixels.
///
/// Surfaces load every background and replacement image through this seam, so hosts can plug in
/// their own fetching (HTTP, in-memory caches, ...).
pub trait ImageLoader {
    /// Load and decode the image at `url`.
    fn load(&self, url: &str) -> MaskResult<PreparedImage>;
}

/// Loads `data:` URLs directly and everything else as a path relative to `root`.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsImageLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, url: &str) -> MaskResult<PreparedImage> {
        if url.starts_with("data:") {
            let (_mime, bytes) = decode_data_url(url)?;
            return decode_image(&bytes);
        }

        let rel = url.strip_prefix("file://").unwrap_or(url);
        let norm = normalize_rel_path(rel)?;
        let path = self.root.join(Path::new(&norm));
        let bytes = std::fs::read(&path).map_err(|e| {
            MaskError::asset(format!("failed to read image '{}': {e}", path.display()))
        })?;
        decode_image(&bytes)
    }
}

/// Normalize and validate loader-relative image paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> MaskResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(MaskError::asset("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(MaskError::asset("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(MaskError::asset("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(MaskError::asset("image path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
