//! Layer catalogue: the single owner of layer records.

use std::collections::HashMap;

use sift_common::{
    BandKey, Channel, ColorLimits, DocumentError, DocumentResult, Layer, LayerId, LayerKind,
    LayerUpdate, ScheduledTime,
};
use tracing::{debug, warn};

/// Identity of a layer for sibling matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiblingKey {
    pub platform: Option<String>,
    pub instrument: Option<String>,
    pub scheduled_time: Option<ScheduledTime>,
    pub band: BandKey,
}

impl SiblingKey {
    pub fn of(layer: &Layer) -> Self {
        Self {
            platform: layer.platform.clone(),
            instrument: layer.instrument.clone(),
            scheduled_time: layer.scheduled_time,
            band: layer.band_key(),
        }
    }

    /// The same key at another time step.
    pub fn at(&self, scheduled_time: Option<ScheduledTime>) -> Self {
        Self {
            scheduled_time,
            ..self.clone()
        }
    }

    /// The same key with another band.
    pub fn with_band(&self, band: BandKey) -> Self {
        Self {
            band,
            ..self.clone()
        }
    }
}

/// Mapping from layer identifier to layer record.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    layers: HashMap<LayerId, Layer>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Insert a new layer. Does not touch any layer set.
    pub fn insert(&mut self, layer: Layer) -> DocumentResult<LayerId> {
        let id = layer.id();
        if self.layers.contains_key(&id) {
            return Err(DocumentError::AlreadyExists(id));
        }
        self.layers.insert(id, layer);
        Ok(id)
    }

    pub fn get(&self, id: LayerId) -> DocumentResult<&Layer> {
        self.layers.get(&id).ok_or(DocumentError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: LayerId) -> DocumentResult<&mut Layer> {
        self.layers.get_mut(&id).ok_or(DocumentError::NotFound(id))
    }

    /// Layers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Merge partial metadata into an existing layer.
    ///
    /// Safe to repeat; returns the names of the fields that changed.
    pub fn update_metadata(
        &mut self,
        id: LayerId,
        update: &LayerUpdate,
    ) -> DocumentResult<Vec<&'static str>> {
        let layer = self.get_mut(id)?;
        let changed = layer.apply(update);
        if !changed.is_empty() {
            debug!(layer = %id, fields = ?changed, "updated layer metadata");
        }
        Ok(changed)
    }

    /// Remove a layer record.
    ///
    /// The caller must already have removed every presentation of the layer.
    pub fn remove(&mut self, id: LayerId) -> DocumentResult<Layer> {
        self.layers.remove(&id).ok_or(DocumentError::NotFound(id))
    }

    /// `(identifier, key)` rows for every layer of `kind`.
    pub fn directory(&self, kind: LayerKind) -> impl Iterator<Item = (LayerId, SiblingKey)> + '_ {
        self.layers
            .values()
            .filter(move |layer| layer.kind() == kind)
            .map(|layer| (layer.id(), SiblingKey::of(layer)))
    }

    /// Key → identifier lookup table for every layer of `kind`.
    pub fn building_blocks(&self, kind: LayerKind) -> HashMap<SiblingKey, LayerId> {
        self.directory(kind).map(|(id, key)| (key, id)).collect()
    }

    /// Recompute an RGB layer's derived metadata from its components.
    ///
    /// Fills in band triple, platform, instrument, scheduled time, grid, name
    /// and any unset channel limits. Component identifiers that no longer
    /// resolve are skipped. Returns the names of the fields that changed.
    pub fn refresh_composite(&mut self, id: LayerId) -> DocumentResult<Vec<&'static str>> {
        let rgb = self
            .get(id)?
            .as_rgb()
            .ok_or(DocumentError::NotComposite(id))?
            .clone();

        struct Component {
            band: Option<u8>,
            clim: Option<ColorLimits>,
            name: String,
        }

        let mut components: [Option<Component>; 3] = [None, None, None];
        let mut platform = None;
        let mut instrument = None;
        let mut scheduled_time = None;
        let mut grid = None;

        for (channel, component_id) in rgb.components() {
            let Ok(component) = self.get(component_id) else {
                warn!(layer = %id, component = %component_id, ?channel, "composite component no longer loaded");
                continue;
            };
            platform = platform.or_else(|| component.platform.clone());
            instrument = instrument.or_else(|| component.instrument.clone());
            scheduled_time = scheduled_time.or(component.scheduled_time);
            grid = grid.or_else(|| component.grid().cloned());
            components[channel.index()] = Some(Component {
                band: component.band(),
                clim: component.clim(),
                name: component
                    .band()
                    .map(|b| format!("B{:02}", b))
                    .unwrap_or_else(|| component.name.clone()),
            });
        }

        let name = Channel::ALL
            .iter()
            .map(|ch| {
                let label = components[ch.index()]
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("---");
                format!("{}:{}", ch.letter(), label)
            })
            .collect::<Vec<_>>()
            .join(" ");

        let layer = self.get_mut(id)?;
        let mut changed = Vec::new();

        if layer.platform != platform {
            layer.platform = platform;
            changed.push("platform");
        }
        if layer.instrument != instrument {
            layer.instrument = instrument;
            changed.push("instrument");
        }
        if layer.scheduled_time != scheduled_time {
            layer.scheduled_time = scheduled_time;
            changed.push("scheduled_time");
        }
        if layer.name != name {
            layer.name = name;
            changed.push("name");
        }

        let target = layer.as_rgb_mut().ok_or(DocumentError::NotComposite(id))?;
        let bands = [0, 1, 2].map(|i| components[i].as_ref().and_then(|c| c.band));
        if target.bands != bands {
            target.bands = bands;
            changed.push("bands");
        }
        if target.grid != grid {
            target.grid = grid;
            changed.push("grid");
        }
        for channel in Channel::ALL {
            let i = channel.index();
            if target.clims[i].is_none() {
                if let Some(clim) = components[i].as_ref().and_then(|c| c.clim) {
                    target.clims[i] = Some(clim);
                    changed.push("clims");
                }
            }
        }
        changed.dedup();

        Ok(changed)
    }
}
