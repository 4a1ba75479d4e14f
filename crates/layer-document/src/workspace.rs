//! Import/content collaborator interface.
//!
//! The workspace owns pixel data. The document only asks it to import a file,
//! to release content once a layer is purged, and to sample a single value
//! for the point probe.

use std::path::Path;

use sift_common::{DocumentResult, LayerId, LayerUpdate};

/// Coarse overview of imported content, for previews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preview {
    pub width: usize,
    pub height: usize,
    /// Row-major samples, `width * height` long
    pub data: Vec<f32>,
}

impl Preview {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(width * height, data.len());
        Self {
            width,
            height,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of importing one file.
#[derive(Debug, Clone)]
pub struct ImportedImage {
    /// Identifier assigned by the workspace; stable for repeated imports of
    /// the same content
    pub id: LayerId,
    /// Static metadata read from the file
    pub info: LayerUpdate,
    pub preview: Preview,
}

/// Content collaborator consulted by the document.
pub trait Workspace {
    /// Import a file, returning its identifier, static metadata and a preview.
    fn import_image(&mut self, path: &Path) -> DocumentResult<ImportedImage>;

    /// Release content held for a purged layer.
    fn remove(&mut self, id: LayerId);

    /// Sample the data value at a projection coordinate.
    ///
    /// `None` when the point is outside the data or no content is loaded.
    fn content_point(&self, id: LayerId, point: (f64, f64)) -> Option<f64>;
}
