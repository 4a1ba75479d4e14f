//! Removal of presentations and purging of unreferenced layers.

use metrics::counter;
use sift_common::{DocumentError, DocumentResult, LayerId};
use tracing::{debug, info};

use super::Document;
use crate::events::DocumentEvent;
use crate::guidebook::Guidebook;
use crate::workspace::Workspace;

impl<W: Workspace, G: Guidebook> Document<W, G> {
    /// Remove `count` rows of the current set starting at `row`.
    ///
    /// The rows are hidden first, then removed. Layers no longer used by any
    /// layer set are purged. Returns the removed identifiers.
    ///
    /// Removing an animating row renumbers the rest of the animation and
    /// reports the shortened order.
    pub fn remove(&mut self, row: usize, count: usize) -> DocumentResult<Vec<LayerId>> {
        let len = self.current.len();
        let end = row
            .checked_add(count)
            .filter(|end| *end <= len)
            .ok_or(DocumentError::IndexOutOfRange {
                index: row.saturating_add(count),
                len,
            })?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let hide: Vec<(usize, bool)> = (row..end).map(|r| (r, false)).collect();
        let hidden = self.apply_visibility(&hide)?;
        self.emit(DocumentEvent::VisibilityChanged(hidden));

        let removed = self.current.remove_range(row, count)?;
        let was_animating = removed.iter().any(|p| p.animation_order.is_some());
        let ids: Vec<LayerId> = removed.iter().map(|p| p.id).collect();
        let remaining: Vec<usize> = (0..len).filter(|r| !(row..end).contains(r)).collect();
        self.emit(DocumentEvent::LayersRemoved {
            remaining,
            ids: ids.clone(),
            first_row: row,
            count,
        });
        if was_animating {
            let order = self.current.animation_order();
            debug!(frames = order.len(), "animation order shortened by removal");
            self.emit(DocumentEvent::AnimationOrderChanged(order));
        }

        for &id in &ids {
            if !self.is_using(id, None) {
                self.purge(id)?;
            }
        }
        Ok(ids)
    }

    /// Remove the current set's presentation of `id`.
    pub fn remove_layer(&mut self, id: LayerId) -> DocumentResult<Vec<LayerId>> {
        let row = self.current.index_of(id)?;
        self.remove(row, 1)
    }

    /// Remove the layers from every layer set, purging them.
    pub fn remove_from_all_sets(&mut self, ids: &[LayerId]) -> DocumentResult<()> {
        for &id in ids {
            if !self.catalogue.contains(id) {
                return Err(DocumentError::NotFound(id));
            }
        }

        for &id in ids {
            debug!(layer = %id, "removing from all layer sets");
            for set in self.other_sets_mut() {
                if let Some(row) = set.lookup(id) {
                    set.remove_range(row, 1)?;
                }
            }
            if self.current.contains(id) {
                self.remove_layer(id)?;
            } else if self.catalogue.contains(id) {
                self.purge(id)?;
            }
        }
        Ok(())
    }

    /// Announce, then drop a layer from the catalogue and the workspace.
    fn purge(&mut self, id: LayerId) -> DocumentResult<()> {
        if self.is_using(id, None) {
            return Err(DocumentError::DanglingReference(id));
        }
        info!(layer = %id, "purging layer, no longer in use");
        self.emit(DocumentEvent::WillPurgeLayer(id));
        self.catalogue.remove(id)?;
        self.workspace.remove(id);
        counter!("document_layers_purged_total").increment(1);
        Ok(())
    }
}
