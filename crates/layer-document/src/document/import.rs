//! Import of files and inbound metadata.

use std::path::{Path, PathBuf};

use metrics::counter;
use sift_common::time::EMPTY_TIME_LABEL;
use sift_common::{DocumentError, DocumentResult, ImageInfo, Layer, LayerId, LayerUpdate};
use tracing::{debug, info, warn};

use super::Document;
use crate::events::DocumentEvent;
use crate::guidebook::Guidebook;
use crate::presentation::Presentation;
use crate::workspace::{Preview, Workspace};

impl<W: Workspace, G: Guidebook> Document<W, G> {
    /// Import a file and make it the new top layer.
    ///
    /// Opening content that is already loaded returns the existing layer
    /// unchanged.
    pub fn open(&mut self, path: &Path) -> DocumentResult<(LayerId, Layer, Preview)> {
        let imported = self.workspace.import_image(path)?;
        let id = imported.id;

        if let Ok(existing) = self.catalogue.get(id) {
            warn!(layer = %id, path = %path.display(), "layer already in document");
            return Ok((id, existing.clone(), imported.preview));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut layer = Layer::image(id, stem, ImageInfo::default());
        layer.source = Some(path.to_path_buf());
        layer.apply(&imported.info);

        let guide = self.guidebook.collect_info(&layer);
        layer.apply(&guide);
        let defaults = LayerUpdate {
            clim: self.guidebook.climits(&layer),
            name: self.guidebook.display_name(&layer),
            ..Default::default()
        };
        layer.apply(&defaults);
        let colormap = self.guidebook.default_colormap(&layer);

        self.catalogue.insert(layer.clone())?;
        let (presentation, reordered) =
            self.insert_presentation(id, layer.kind(), colormap, layer.clim())?;

        counter!("document_layers_imported_total").increment(1);
        info!(
            layer = %id,
            name = %layer.name,
            path = %path.display(),
            "opened layer"
        );

        self.emit(DocumentEvent::LayerAdded {
            reordered,
            id,
            presentation,
        });
        Ok((id, layer, imported.preview))
    }

    /// Open files in the guidebook's load order, one at a time as the
    /// returned iterator is advanced.
    pub fn open_many<I, P>(
        &mut self,
        paths: I,
    ) -> impl Iterator<Item = DocumentResult<(LayerId, Layer, Preview)>> + '_
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        let ordered = self.guidebook.sort_paths_into_load_order(paths);
        debug!(count = ordered.len(), "opening files in load order");
        ordered.into_iter().map(move |path| self.open(&path))
    }

    /// Paths in display order: the reverse of the load order, newest on top.
    pub fn sort_paths(&self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut ordered = self.guidebook.sort_paths_into_load_order(paths);
        ordered.reverse();
        ordered
    }

    /// Apply metadata reported by a background import.
    ///
    /// Updates for layers no longer in the document are ignored. Composites
    /// built on the layer are refreshed. Returns the changed field names.
    pub fn update_metadata(&mut self, id: LayerId, update: &LayerUpdate) -> Vec<&'static str> {
        let changed = match self.catalogue.update_metadata(id, update) {
            Ok(changed) => changed,
            Err(_) => {
                warn!(layer = %id, "metadata update for a layer not in the document");
                return Vec::new();
            }
        };
        if changed.is_empty() {
            return changed;
        }

        let dependents: Vec<LayerId> = self
            .catalogue
            .iter()
            .filter(|layer| {
                layer
                    .as_rgb()
                    .is_some_and(|rgb| rgb.components().any(|(_, c)| c == id))
            })
            .map(|layer| layer.id())
            .collect();
        for composite in dependents {
            if let Err(e) = self.catalogue.refresh_composite(composite) {
                warn!(layer = %composite, error = %e, "could not refresh composite");
            }
        }
        changed
    }

    /// Display time of a layer, or a placeholder when no layer is given.
    pub fn time_label(&self, id: Option<LayerId>) -> DocumentResult<String> {
        match id {
            None => Ok(EMPTY_TIME_LABEL.to_string()),
            Some(id) => Ok(self.guidebook.display_time(self.catalogue.get(id)?)),
        }
    }

    /// Insert presentation entries into the current set at `row`, keeping
    /// their order.
    ///
    /// Used to drop entries dragged from another list. Dropped entries leave
    /// whatever animation they took part in. Returns the reordering delta,
    /// with `None` for the inserted rows.
    pub fn insert_presentations(
        &mut self,
        row: usize,
        entries: Vec<Presentation>,
    ) -> DocumentResult<Vec<Option<usize>>> {
        if entries.is_empty() {
            warn!("attempt to drop empty content");
            return Ok(Vec::new());
        }

        let len = self.current.len();
        if row > len {
            return Err(DocumentError::IndexOutOfRange { index: row, len });
        }
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !self.catalogue.contains(entry.id) {
                return Err(DocumentError::NotFound(entry.id));
            }
            if self.current.contains(entry.id) || !seen.insert(entry.id) {
                return Err(DocumentError::AlreadyExists(entry.id));
            }
        }

        let count = entries.len();
        for (offset, mut entry) in entries.into_iter().enumerate() {
            entry.animation_order = None;
            self.current.insert_entry(row + offset, entry)?;
        }

        let mut reordered: Vec<Option<usize>> = (0..len).map(Some).collect();
        reordered.splice(row..row, std::iter::repeat(None).take(count));
        self.emit(DocumentEvent::LayersReordered(reordered.clone()));
        Ok(reordered)
    }
}
