//! Visibility, ordering, animation and styling of the current layer set.

use std::collections::{BTreeMap, HashSet};

use sift_common::{ColorLimits, ColormapRef, DocumentResult, LayerId, LayerKind};
use tracing::{debug, info, warn};

use super::{Document, LayerQuery, LoopOptions};
use crate::events::{ClimChange, DocumentEvent};
use crate::guidebook::{Guidebook, UnitConversion};
use crate::presentation::LayerRef;
use crate::workspace::Workspace;

impl<W: Workspace, G: Guidebook> Document<W, G> {
    /// Show, hide or flip entries of the current set.
    ///
    /// `visible = None` flips each entry. Every target is resolved before any
    /// entry changes; one notification covers the whole batch.
    pub fn toggle_visibility<I>(
        &mut self,
        targets: I,
        visible: Option<bool>,
    ) -> DocumentResult<BTreeMap<LayerId, bool>>
    where
        I: IntoIterator,
        I::Item: Into<LayerRef>,
    {
        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for target in targets {
            let row = self.current.resolve(target.into())?;
            if seen.insert(row) {
                rows.push(row);
            }
        }
        if rows.is_empty() {
            return Ok(BTreeMap::new());
        }

        let changes: Vec<(usize, bool)> = rows
            .into_iter()
            .map(|row| {
                let now = self.current.entries()[row].visible;
                (row, visible.unwrap_or(!now))
            })
            .collect();
        let announced = self.apply_visibility(&changes)?;
        self.emit(DocumentEvent::VisibilityChanged(announced.clone()));
        Ok(announced)
    }

    /// Record visibility changed by the animation player and re-announce it.
    pub fn animation_changed_visibility(
        &mut self,
        changes: &BTreeMap<LayerId, bool>,
    ) -> DocumentResult<()> {
        let resolved = changes
            .iter()
            .map(|(id, visible)| self.current.index_of(*id).map(|row| (row, *visible)))
            .collect::<DocumentResult<Vec<_>>>()?;
        self.apply_visibility(&resolved)?;
        self.emit(DocumentEvent::VisibilityChanged(changes.clone()));
        Ok(())
    }

    /// Rearrange the current set so that new row `i` holds old row `new_order[i]`.
    pub fn reorder(&mut self, new_order: &[usize]) -> DocumentResult<()> {
        self.current.reorder(new_order)?;
        self.emit(DocumentEvent::LayersReordered(
            new_order.iter().copied().map(Some).collect(),
        ));
        Ok(())
    }

    /// Replace the animation order of the current set.
    pub fn set_animation_order<I>(&mut self, sequence: I) -> DocumentResult<Vec<LayerId>>
    where
        I: IntoIterator,
        I::Item: Into<LayerRef>,
    {
        let sequence: Vec<LayerRef> = sequence.into_iter().map(Into::into).collect();
        self.current.set_animation_order(&sequence)?;
        let order = self.current.animation_order();
        self.emit(DocumentEvent::AnimationOrderChanged(order.clone()));
        Ok(order)
    }

    pub fn rename_layer(
        &mut self,
        target: impl Into<LayerRef>,
        name: impl Into<String>,
    ) -> DocumentResult<()> {
        let id = self.resolve_id(target.into())?;
        let name = name.into();
        self.catalogue.get_mut(id)?.name = name.clone();
        self.emit(DocumentEvent::LayerRenamed { id, name });
        Ok(())
    }

    /// Keep only identifiers present in the current set.
    fn in_current(&self, ids: Vec<LayerId>) -> Vec<LayerId> {
        ids.into_iter().filter(|id| self.current.contains(*id)).collect()
    }

    /// The given layers plus their time siblings, or every current entry.
    fn styling_targets(&self, ids: Option<&[LayerId]>) -> Vec<LayerId> {
        match ids {
            Some(ids) => self.guidebook.time_siblings_ids(ids, &self.catalogue),
            None => self.current.ids(),
        }
    }

    /// Set the colormap of the given layers and their time siblings, or of
    /// every entry in the current set.
    pub fn change_colormap(
        &mut self,
        colormap: ColormapRef,
        ids: Option<&[LayerId]>,
    ) -> DocumentResult<Vec<LayerId>> {
        if matches!(colormap, ColormapRef::Named(_)) && !colormap.is_builtin() {
            warn!(colormap = %colormap, "colormap name is not a built-in colormap");
        }
        let mut changed = BTreeMap::new();
        for id in self.styling_targets(ids) {
            let Some(row) = self.current.lookup(id) else {
                continue;
            };
            self.current
                .modify(row, |p| p.colormap = Some(colormap.clone()))?;
            changed.insert(id, Some(colormap.clone()));
        }
        let ids: Vec<LayerId> = changed.keys().copied().collect();
        self.emit(DocumentEvent::ColormapChanged(changed));
        Ok(ids)
    }

    /// Set presentation color limits on every current entry matching `query`.
    pub fn change_clims_where(
        &mut self,
        clim: ColorLimits,
        query: &LayerQuery,
    ) -> DocumentResult<Vec<LayerId>> {
        let rows: Vec<usize> = self
            .current_layers_where(query)
            .into_iter()
            .map(|(row, _, _)| row)
            .collect();
        let mut changed = BTreeMap::new();
        for row in rows {
            let entry = self.current.modify(row, |p| p.clim = Some(clim))?;
            changed.insert(entry.id, ClimChange::Single(clim));
        }
        let ids: Vec<LayerId> = changed.keys().copied().collect();
        self.emit(DocumentEvent::ColorLimitsChanged(changed));
        Ok(ids)
    }

    /// Reverse the color scale of the given layers and their time siblings,
    /// or of every entry in the current set.
    pub fn flip_clims(&mut self, ids: Option<&[LayerId]>) -> DocumentResult<Vec<LayerId>> {
        let mut changed = BTreeMap::new();
        for id in self.styling_targets(ids) {
            let Some(row) = self.current.lookup(id) else {
                continue;
            };
            let Some(clim) = self.current.entries()[row].clim else {
                continue;
            };
            let flipped = clim.flipped();
            self.current.modify(row, |p| p.clim = Some(flipped))?;
            changed.insert(id, ClimChange::Single(flipped));
        }
        let ids: Vec<LayerId> = changed.keys().copied().collect();
        self.emit(DocumentEvent::ColorLimitsChanged(changed));
        Ok(ids)
    }

    /// Whether each given layer's presentation limits run opposite to its
    /// default limits. Layers without both limits report false.
    pub fn flipped(&self, ids: &[LayerId]) -> Vec<(LayerId, bool)> {
        self.current
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| {
                let default = self.catalogue.get(p.id).ok().and_then(|l| l.clim());
                let flipped = match (p.clim, default) {
                    (Some(shown), Some(default)) => shown.is_reversed() != default.is_reversed(),
                    _ => false,
                };
                (p.id, flipped)
            })
            .collect()
    }

    /// Default data range of a layer according to the guidebook.
    pub fn valid_range(&self, id: LayerId) -> DocumentResult<Option<ColorLimits>> {
        Ok(self.guidebook.climits(self.catalogue.get(id)?))
    }

    /// Convert a data value to display units, or back when `inverse`.
    pub fn convert_units(
        &self,
        id: LayerId,
        value: f64,
        inverse: bool,
    ) -> DocumentResult<(UnitConversion, f64)> {
        let conversion = self.guidebook.units_conversion(self.catalogue.get(id)?);
        let converted = conversion.convert(value, inverse);
        Ok((conversion, converted))
    }

    /// Step to the time (or band) sibling `delta` steps from `id`, wrapping.
    ///
    /// The new focus is shown and its siblings in the current set hidden, in
    /// one notification. Composites step through their composite siblings.
    /// Returns the new focus.
    pub fn next_last_step(
        &mut self,
        id: LayerId,
        delta: isize,
        bandwise: bool,
    ) -> DocumentResult<LayerId> {
        let layer = self.catalogue.get(id)?;
        let siblings = if layer.kind() == LayerKind::Rgb {
            self.rgb_siblings(id)?
        } else if bandwise {
            self.guidebook.channel_siblings(id, &self.catalogue).0
        } else {
            self.guidebook.time_siblings(id, &self.catalogue).0
        };
        let siblings = self.in_current(siblings);

        let Some(position) = siblings.iter().position(|s| *s == id) else {
            info!(layer = %id, "no siblings to step through");
            self.toggle_visibility([id], Some(true))?;
            return Ok(id);
        };

        let len = siblings.len() as isize;
        let focus = siblings[(position as isize + delta).rem_euclid(len) as usize];
        debug!(layer = %id, focus = %focus, delta, bandwise, "stepping");

        let changes = siblings
            .iter()
            .map(|s| self.current.index_of(*s).map(|row| (row, *s == focus)))
            .collect::<DocumentResult<Vec<_>>>()?;
        let announced = self.apply_visibility(&changes)?;
        self.emit(DocumentEvent::VisibilityChanged(announced));
        Ok(focus)
    }

    /// Animate the siblings of a layer.
    ///
    /// Composites get a full composite loop. Other layers animate through
    /// their time siblings, or their band siblings when fewer than two time
    /// steps are loaded. Returns the new animation order, empty when nothing
    /// could be animated.
    pub fn animate_siblings(&mut self, target: impl Into<LayerRef>) -> DocumentResult<Vec<LayerId>> {
        let id = self.resolve_id(target.into())?;
        if self.catalogue.get(id)?.kind() == LayerKind::Rgb {
            return self.build_loop(id, LoopOptions::default());
        }

        let mut sequence = self.in_current(self.guidebook.time_siblings(id, &self.catalogue).0);
        if sequence.len() < 2 {
            info!(layer = %id, "no time siblings, trying band siblings");
            sequence = self.in_current(self.guidebook.channel_siblings(id, &self.catalogue).0);
        }
        if sequence.len() < 2 {
            warn!(layer = %id, "no animation found");
            return Ok(Vec::new());
        }

        debug!(layer = %id, frames = sequence.len(), "animating siblings");
        self.set_animation_order(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{ImportedImage, Preview};
    use sift_common::{DocumentError, GridGeometry, LayerUpdate};
    use std::path::{Path, PathBuf};

    /// Minimal workspace: identifier per path, fixed grid.
    #[derive(Default)]
    struct Stub {
        ids: std::collections::HashMap<PathBuf, LayerId>,
    }

    impl Workspace for Stub {
        fn import_image(&mut self, path: &Path) -> DocumentResult<ImportedImage> {
            let id = *self.ids.entry(path.to_path_buf()).or_default();
            Ok(ImportedImage {
                id,
                info: LayerUpdate {
                    grid: Some(GridGeometry {
                        origin_x: 0.0,
                        origin_y: 0.0,
                        cell_width: 2000.0,
                        cell_height: -2000.0,
                        proj4: String::new(),
                    }),
                    ..Default::default()
                },
                preview: Preview::default(),
            })
        }

        fn remove(&mut self, _id: LayerId) {}

        fn content_point(&self, _id: LayerId, _point: (f64, f64)) -> Option<f64> {
            None
        }
    }

    fn open_all(doc: &mut Document<Stub>, names: &[&str]) -> Vec<LayerId> {
        names
            .iter()
            .map(|n| doc.open(Path::new(n)).unwrap().0)
            .collect()
    }

    #[test]
    fn test_toggle_resolves_before_mutating() {
        let mut doc = Document::new(Stub::default());
        let ids = open_all(
            &mut doc,
            &["HS_H08_20150714_0030_B01_FLDK_R10.tif", "HS_H08_20150714_0030_B02_FLDK_R10.tif"],
        );
        let before = doc.current_layer_set().clone();
        let err = doc
            .toggle_visibility([LayerRef::Id(ids[0]), LayerRef::Row(7)], Some(false))
            .unwrap_err();
        assert!(matches!(err, DocumentError::IndexOutOfRange { index: 7, .. }));
        assert_eq!(doc.current_layer_set(), &before);

        let changed = doc.toggle_visibility([ids[0]], None).unwrap();
        assert_eq!(changed.get(&ids[0]), Some(&false));
    }

    #[test]
    fn test_next_last_step_wraps() {
        let mut doc = Document::new(Stub::default());
        let ids = open_all(
            &mut doc,
            &[
                "HS_H08_20150714_0030_B13_FLDK_R20.tif",
                "HS_H08_20150714_0040_B13_FLDK_R20.tif",
                "HS_H08_20150714_0050_B13_FLDK_R20.tif",
            ],
        );
        let focus = doc.next_last_step(ids[2], 1, false).unwrap();
        assert_eq!(focus, ids[0]);
        let visible: Vec<_> = doc
            .current_layer_set()
            .iter()
            .filter(|p| p.visible)
            .map(|p| p.id)
            .collect();
        assert_eq!(visible, vec![ids[0]]);

        assert_eq!(doc.next_last_step(ids[0], -1, false).unwrap(), ids[2]);
    }

    #[test]
    fn test_flip_applies_to_time_siblings() {
        let mut doc = Document::new(Stub::default());
        let ids = open_all(
            &mut doc,
            &[
                "HS_H08_20150714_0030_B13_FLDK_R20.tif",
                "HS_H08_20150714_0040_B13_FLDK_R20.tif",
                "HS_H08_20150714_0030_B01_FLDK_R10.tif",
            ],
        );
        let flipped = doc.flip_clims(Some(&[ids[0]])).unwrap();
        assert_eq!(flipped.len(), 2);
        let report = doc.flipped(&ids);
        let by_id: BTreeMap<_, _> = report.into_iter().collect();
        assert!(by_id[&ids[0]]);
        assert!(by_id[&ids[1]]);
        assert!(!by_id[&ids[2]]);
    }
}
