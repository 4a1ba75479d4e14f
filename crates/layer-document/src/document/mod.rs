//! The document: layer catalogue plus layer sets, and every operation that
//! keeps them consistent.
//!
//! All mutation happens on the owning thread. Each public operation validates
//! its input before touching state, applies the change, then emits its
//! notifications synchronously through the [`EventBus`].

mod display;
mod equalizer;
mod import;
mod removal;
mod rgb;

use std::collections::BTreeMap;

use sift_common::{
    BandKey, ColorLimits, ColormapRef, DocumentError, DocumentResult, Layer, LayerId, LayerKind,
};
use tracing::debug;

use crate::catalogue::Catalogue;
use crate::config::DocumentConfig;
use crate::events::{DocumentEvent, EventBus, Subscriber, SubscriptionId};
use crate::guidebook::{Guidebook, ImagerGuidebook};
use crate::layer_set::LayerSet;
use crate::presentation::{LayerRef, Presentation};
use crate::workspace::Workspace;

pub use rgb::{ChannelLimits, LoopOptions};

/// Filter for [`Document::current_layers_where`].
///
/// Every criterion that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerQuery {
    pub kinds: Option<Vec<LayerKind>>,
    pub bands: Option<Vec<BandKey>>,
    pub ids: Option<Vec<LayerId>>,
}

impl LayerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = LayerKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn bands(mut self, bands: impl IntoIterator<Item = BandKey>) -> Self {
        self.bands = Some(bands.into_iter().collect());
        self
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = LayerId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    fn matches(&self, layer: &Layer) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&layer.id()))
            && self.kinds.as_ref().map_or(true, |k| k.contains(&layer.kind()))
            && self.bands.as_ref().map_or(true, |b| b.contains(&layer.band_key()))
    }
}

/// Layer catalogue and layer sets of one viewer session.
pub struct Document<W: Workspace, G: Guidebook = ImagerGuidebook> {
    workspace: W,
    guidebook: G,
    catalogue: Catalogue,
    /// The selected layer set. Its slot in `slots` stays `None` while selected.
    current: LayerSet,
    /// One entry per allocated slot; `None` is an unpopulated slot
    slots: Vec<Option<LayerSet>>,
    current_set_index: usize,
    events: EventBus,
    config: DocumentConfig,
}

impl<W: Workspace> Document<W, ImagerGuidebook> {
    /// Document with the default guidebook and configuration.
    pub fn new(workspace: W) -> Self {
        let config = DocumentConfig::default();
        Self::build(workspace, ImagerGuidebook::new(), config)
    }
}

impl<W: Workspace, G: Guidebook> Document<W, G> {
    pub fn with_config(workspace: W, guidebook: G, config: DocumentConfig) -> DocumentResult<Self> {
        config.validate()?;
        Ok(Self::build(workspace, guidebook, config))
    }

    fn build(workspace: W, guidebook: G, config: DocumentConfig) -> Self {
        let slots = vec![None; config.layer_set_count.max(1)];
        Self {
            workspace,
            guidebook,
            catalogue: Catalogue::new(),
            current: LayerSet::new(),
            slots,
            current_set_index: 0,
            events: EventBus::new(),
            config,
        }
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        &mut self.workspace
    }

    pub fn guidebook(&self) -> &G {
        &self.guidebook
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub(crate) fn emit(&mut self, event: DocumentEvent) {
        self.events.emit(event);
    }

    // ------------------------------------------------------------------
    // Layer sets
    // ------------------------------------------------------------------

    pub fn current_set_index(&self) -> usize {
        self.current_set_index
    }

    pub fn current_layer_set(&self) -> &LayerSet {
        &self.current
    }

    /// Number of allocated layer set slots, populated or not.
    pub fn layer_set_count(&self) -> usize {
        self.slots.len()
    }

    /// The layer set in slot `index`, if populated.
    pub fn layer_set(&self, index: usize) -> Option<&LayerSet> {
        if index == self.current_set_index {
            Some(&self.current)
        } else {
            self.slots.get(index)?.as_ref()
        }
    }

    /// Populated layer sets with their slot index.
    pub fn layer_sets(&self) -> impl Iterator<Item = (usize, &LayerSet)> {
        (0..self.slots.len()).filter_map(move |i| self.layer_set(i).map(|set| (i, set)))
    }

    /// Populated layer sets other than the current one.
    fn other_sets_mut(&mut self) -> impl Iterator<Item = &mut LayerSet> {
        self.slots.iter_mut().flatten()
    }

    /// Number of rows in the current layer set.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Switch to another layer set, appending or populating it as needed.
    ///
    /// `index` may be one past the last slot, which appends a slot, but never
    /// reaches the configured maximum. An unpopulated slot becomes a copy of
    /// the current set.
    pub fn select_layer_set(&mut self, index: usize) -> DocumentResult<()> {
        let len = self.slots.len();
        let max = self.config.max_layer_sets;
        if index > len || index >= max {
            return Err(DocumentError::LayerSetOutOfRange { index, len, max });
        }
        if index == len {
            self.slots.push(None);
        }

        if index != self.current_set_index {
            let cloned = self.slots[index].is_none();
            let target = self.slots[index]
                .take()
                .unwrap_or_else(|| self.current.clone());
            let previous = std::mem::replace(&mut self.current, target);
            self.slots[self.current_set_index] = Some(previous);
            debug!(from = self.current_set_index, to = index, cloned, "switched layer set");
            self.current_set_index = index;
        }

        let event = DocumentEvent::LayerSetSwitched {
            index,
            entries: self.current.entries().to_vec(),
            animation_order: self.current.animation_order(),
        };
        self.emit(event);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookup helpers
    // ------------------------------------------------------------------

    pub fn layer(&self, id: LayerId) -> DocumentResult<&Layer> {
        self.catalogue.get(id)
    }

    /// Identifier at `row` of the current set.
    pub fn id_for_row(&self, row: usize) -> DocumentResult<LayerId> {
        self.current
            .get(row)
            .map(|p| p.id)
            .ok_or(DocumentError::IndexOutOfRange {
                index: row,
                len: self.current.len(),
            })
    }

    /// Resolve a row of the current set, or a catalogued identifier.
    pub(crate) fn resolve_id(&self, target: LayerRef) -> DocumentResult<LayerId> {
        match target {
            LayerRef::Row(row) => self.id_for_row(row),
            LayerRef::Id(id) if self.catalogue.contains(id) => Ok(id),
            LayerRef::Id(id) => Err(DocumentError::NotFound(id)),
        }
    }

    /// Presentation of `id` in the current set.
    pub fn presentation(&self, id: LayerId) -> Option<&Presentation> {
        self.current.lookup(id).and_then(|row| self.current.get(row))
    }

    /// Whether `id` has a presentation in slot `set`, or in any populated set.
    pub fn is_using(&self, id: LayerId, set: Option<usize>) -> bool {
        match set {
            Some(index) => self.layer_set(index).is_some_and(|s| s.contains(id)),
            None => self.layer_sets().any(|(_, s)| s.contains(id)),
        }
    }

    // ------------------------------------------------------------------
    // Queries over the current set
    // ------------------------------------------------------------------

    /// `(row, presentation, layer)` for current entries matching `query`.
    pub fn current_layers_where(
        &self,
        query: &LayerQuery,
    ) -> Vec<(usize, &Presentation, &Layer)> {
        self.current
            .iter()
            .enumerate()
            .filter_map(|(row, p)| self.catalogue.get(p.id).ok().map(|layer| (row, p, layer)))
            .filter(|(_, _, layer)| query.matches(layer))
            .collect()
    }

    /// Displayable layers that are visible or animating, top to bottom.
    pub fn active_layer_order(&self) -> Vec<(&Presentation, &Layer)> {
        self.current
            .iter()
            .filter(|p| p.is_active())
            .filter_map(|p| self.catalogue.get(p.id).ok().map(|layer| (p, layer)))
            .filter(|(_, layer)| layer.is_valid())
            .collect()
    }

    /// Current-set layers filtered by validity, activity and kind.
    ///
    /// A layer is active when it is valid and either visible or animating.
    pub fn layers_where(
        &self,
        valid: Option<bool>,
        active: Option<bool>,
        kinds: Option<&[LayerKind]>,
    ) -> Vec<&Layer> {
        self.current
            .iter()
            .filter_map(|p| self.catalogue.get(p.id).ok().map(|layer| (p, layer)))
            .filter(|(p, layer)| {
                let is_valid = layer.is_valid();
                valid.map_or(true, |v| v == is_valid)
                    && active.map_or(true, |a| a == (is_valid && p.is_active()))
                    && kinds.map_or(true, |k| k.contains(&layer.kind()))
            })
            .map(|(_, layer)| layer)
            .collect()
    }

    /// Topmost visible layer.
    pub fn current_visible_layer(&self) -> Option<LayerId> {
        self.current.iter().find(|p| p.visible).map(|p| p.id)
    }

    /// Identifiers top to bottom, regardless of visibility.
    pub fn current_layer_order(&self) -> Vec<LayerId> {
        self.current.ids()
    }

    pub fn current_animation_order(&self) -> Vec<LayerId> {
        self.current.animation_order()
    }

    pub fn is_layer_visible(&self, row: usize) -> DocumentResult<bool> {
        self.current
            .resolve(LayerRef::Row(row))
            .map(|row| self.current.entries()[row].visible)
    }

    pub fn layer_animation_order(&self, row: usize) -> DocumentResult<Option<usize>> {
        self.current
            .resolve(LayerRef::Row(row))
            .map(|row| self.current.entries()[row].animation_order)
    }

    /// Colormaps of the given layers in the current set, in row order.
    pub fn colormaps(&self, ids: &[LayerId]) -> Vec<(LayerId, Option<ColormapRef>)> {
        self.current
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| (p.id, p.colormap.clone()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Presentation insertion
    // ------------------------------------------------------------------

    /// Insert a presentation for a catalogued layer into every populated set.
    ///
    /// Visible in the current set, hidden elsewhere. Returns the new entry and
    /// the reordering delta of the current set. Emits nothing.
    pub(crate) fn insert_presentation(
        &mut self,
        id: LayerId,
        kind: LayerKind,
        colormap: Option<ColormapRef>,
        clim: Option<ColorLimits>,
    ) -> DocumentResult<(Presentation, Vec<Option<usize>>)> {
        if self.is_using(id, None) {
            return Err(DocumentError::AlreadyExists(id));
        }

        let presentation = Presentation {
            colormap,
            clim,
            mixing: self.config.default_mixing,
            ..Presentation::new(id, kind)
        };
        let hidden = presentation.with_visible(false);
        let insert_before = self.config.insert_before;

        let old_len = self.current.len();
        let row = insert_before.min(old_len);
        self.current.insert_entry(row, presentation.clone())?;
        for set in self.other_sets_mut() {
            let at = insert_before.min(set.len());
            set.insert_entry(at, hidden.clone())?;
        }

        let mut reordered: Vec<Option<usize>> = (0..old_len).map(Some).collect();
        reordered.insert(row, None);
        Ok((presentation, reordered))
    }

    /// Apply `(row, visible)` pairs to the current set.
    ///
    /// Rows must already be resolved. Returns the identifier map to announce.
    pub(crate) fn apply_visibility(
        &mut self,
        changes: &[(usize, bool)],
    ) -> DocumentResult<BTreeMap<LayerId, bool>> {
        let mut announced = BTreeMap::new();
        for &(row, visible) in changes {
            let entry = self.current.modify(row, |p| p.visible = visible)?;
            announced.insert(entry.id, visible);
        }
        Ok(announced)
    }
}

impl<W: Workspace + std::fmt::Debug, G: Guidebook + std::fmt::Debug> std::fmt::Debug
    for Document<W, G>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("workspace", &self.workspace)
            .field("guidebook", &self.guidebook)
            .field("layers", &self.catalogue.len())
            .field("layer_sets", &self.slots.len())
            .field("current_set_index", &self.current_set_index)
            .field("events", &self.events)
            .finish()
    }
}
