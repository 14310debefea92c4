//! Filesystem capabilities used by the partitioner and auditor

use std::path::Path;

use crate::{Error, Result};

/// Raster-image extensions allowed in the asset tree.
pub static RASTER_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg", "gif", "svg"];

/// Whether a path names a raster-image asset.
pub fn is_raster_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            RASTER_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Copy a file, overwriting any existing destination and creating parent
/// directories as needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(std::fs::copy(src, dst)?)
}

/// Fail with an environment error unless `path` is an existing directory.
pub fn ensure_dir(path: &Path, what: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::Environment(format!(
            "{} directory not found: {}",
            what,
            path.display()
        )));
    }
    Ok(())
}
