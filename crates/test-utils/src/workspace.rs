//! In-memory workspace for document tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use layer_document::{ImportedImage, Workspace};
use sift_common::{ColorLimits, DocumentError, DocumentResult, LayerId, LayerUpdate};

use crate::fixtures::full_disk_grid;
use crate::generators::create_test_preview;

/// Workspace that "imports" any path without touching the filesystem.
///
/// The same path always yields the same identifier, like re-importing the
/// same content. Point samples are configured per layer.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    ids: HashMap<PathBuf, LayerId>,
    points: HashMap<LayerId, f64>,
    failing: HashSet<PathBuf>,
    removed: Vec<LayerId>,
    imports: usize,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier assigned to `path`, if it was imported.
    pub fn id_for(&self, path: &Path) -> Option<LayerId> {
        self.ids.get(path).copied()
    }

    /// Value returned by `content_point` for `id` at any coordinate.
    pub fn set_point(&mut self, id: LayerId, value: f64) {
        self.points.insert(id, value);
    }

    /// Make imports of `path` fail.
    pub fn fail_on(&mut self, path: impl Into<PathBuf>) {
        self.failing.insert(path.into());
    }

    /// Layers released through `remove`, in order.
    pub fn removed(&self) -> &[LayerId] {
        &self.removed
    }

    /// Number of successful imports, repeats included.
    pub fn import_count(&self) -> usize {
        self.imports
    }
}

impl Workspace for MemoryWorkspace {
    fn import_image(&mut self, path: &Path) -> DocumentResult<ImportedImage> {
        if self.failing.contains(path) {
            return Err(DocumentError::import(path.display(), "unreadable file"));
        }
        let id = *self.ids.entry(path.to_path_buf()).or_insert_with(LayerId::new);
        self.imports += 1;
        Ok(ImportedImage {
            id,
            info: LayerUpdate {
                grid: Some(full_disk_grid()),
                clim: Some(ColorLimits::new(0.0, 1.0)),
                ..Default::default()
            },
            preview: create_test_preview(4, 4),
        })
    }

    fn remove(&mut self, id: LayerId) {
        self.points.remove(&id);
        self.removed.push(id);
    }

    fn content_point(&self, id: LayerId, _point: (f64, f64)) -> Option<f64> {
        self.points.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_same_id() {
        let mut ws = MemoryWorkspace::new();
        let a = ws.import_image(Path::new("/a.tif")).unwrap().id;
        let b = ws.import_image(Path::new("/b.tif")).unwrap().id;
        assert_ne!(a, b);
        assert_eq!(ws.import_image(Path::new("/a.tif")).unwrap().id, a);
        assert_eq!(ws.import_count(), 3);
    }

    #[test]
    fn test_failing_path() {
        let mut ws = MemoryWorkspace::new();
        ws.fail_on("/bad.tif");
        let err = ws.import_image(Path::new("/bad.tif")).unwrap_err();
        assert!(matches!(err, DocumentError::Import { .. }));
    }
}
