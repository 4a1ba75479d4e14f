//! Directory scanning for loadable satellite files.

use std::path::{Path, PathBuf};

use layer_document::filenames::parse_satellite_path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Satellite files under `root`, recursively, in no particular order.
///
/// Files whose names are not recognized, and JSON sidecars, are skipped.
pub fn find_satellite_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).max_depth(max_depth).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        if parse_satellite_path(path).is_none() {
            debug!(path = %path.display(), "not a recognized satellite file");
            continue;
        }
        found.push(path.to_path_buf());
    }
    found
}
