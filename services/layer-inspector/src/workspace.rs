//! Filesystem-backed workspace.
//!
//! Imports only stat the file; static metadata arrives later from JSON
//! sidecars read in the background (see [`crate::sidecar`]).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use layer_document::{ImportedImage, Preview, Workspace};
use sift_common::{DocumentError, DocumentResult, LayerId, LayerUpdate};
use tracing::debug;

#[derive(Debug, Default)]
pub struct FileWorkspace {
    /// Identifier per canonical path, stable across re-imports
    ids: HashMap<PathBuf, LayerId>,
    loaded: HashSet<LayerId>,
}

impl FileWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> usize {
        self.loaded.len()
    }
}

impl Workspace for FileWorkspace {
    fn import_image(&mut self, path: &Path) -> DocumentResult<ImportedImage> {
        let canonical = path
            .canonicalize()
            .map_err(|e| DocumentError::import(path.display(), e.to_string()))?;
        let meta = std::fs::metadata(&canonical)
            .map_err(|e| DocumentError::import(path.display(), e.to_string()))?;
        if !meta.is_file() {
            return Err(DocumentError::import(path.display(), "not a regular file"));
        }

        let id = *self.ids.entry(canonical.clone()).or_insert_with(LayerId::new);
        self.loaded.insert(id);
        debug!(layer = %id, path = %canonical.display(), bytes = meta.len(), "imported file");

        Ok(ImportedImage {
            id,
            info: LayerUpdate {
                source: Some(canonical),
                ..Default::default()
            },
            preview: Preview::default(),
        })
    }

    fn remove(&mut self, id: LayerId) {
        if self.loaded.remove(&id) {
            debug!(layer = %id, "released file");
        }
    }

    fn content_point(&self, _id: LayerId, _point: (f64, f64)) -> Option<f64> {
        // pixel data is never decoded here
        None
    }
}
