//! Product discovery under a collection root.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ProductPattern;
use crate::error::{ExtractionError, Result};

/// Recursively list product files under `root`.
///
/// Order follows the directory walk (entries sorted by file name) and carries
/// no temporal meaning. Unreadable entries are skipped with a warning.
/// Any non-directory entry whose name matches is a candidate, including
/// special files; opening them is left to the sampler.
pub fn scan_products(root: &Path, pattern: &ProductPattern) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(ExtractionError::PathNotFound(root.to_path_buf()));
    }

    let mut products = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .map(|name| pattern.matches(name))
            .unwrap_or(false);
        if matches {
            products.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), count = products.len(), "Scanned collection");
    Ok(products)
}
