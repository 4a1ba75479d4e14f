//! RGB composites: creation, channel assignment, sibling propagation and
//! animation loops.
//!
//! Siblings of a composite are the other composites with the same platform,
//! instrument and band triple at a different scheduled time. Changes to one
//! composite's channels or limits are carried over to its siblings so that a
//! loop stays consistent.

use std::collections::{BTreeMap, BTreeSet};

use sift_common::{
    BandKey, Channel, ColorLimits, DocumentError, DocumentResult, Layer, LayerId, LayerKind,
    RgbComposite,
};
use tracing::{debug, info, warn};

use super::Document;
use crate::catalogue::SiblingKey;
use crate::events::{ChannelAssignment, ClimChange, DocumentEvent};
use crate::guidebook::Guidebook;
use crate::workspace::Workspace;

/// Per-channel color limits of a composite.
pub type ChannelLimits = [Option<ColorLimits>; 3];

/// Options for [`Document::build_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    /// Build composites for time steps that have all three bands loaded
    pub create_missing: bool,
    /// Give every composite in the loop the master's limits
    pub force_limits: bool,
    /// Hide image layers consumed by newly built composites
    pub hide_contributors: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            create_missing: true,
            force_limits: true,
            hide_contributors: true,
        }
    }
}

impl<W: Workspace, G: Guidebook> Document<W, G> {
    fn composite(&self, id: LayerId) -> DocumentResult<(&Layer, &RgbComposite)> {
        let layer = self.catalogue.get(id)?;
        let rgb = layer.as_rgb().ok_or(DocumentError::NotComposite(id))?;
        Ok((layer, rgb))
    }

    /// Every supplied component must be a loaded image layer.
    fn check_components(&self, channels: &ChannelAssignment) -> DocumentResult<()> {
        for (_, component) in channels.iter() {
            if self.catalogue.get(component)?.kind() != LayerKind::Image {
                return Err(DocumentError::InvalidComponent(component));
            }
        }
        Ok(())
    }

    /// Create a composite on top of the current set and assign the given
    /// channels.
    ///
    /// Supplied components are hidden in the current set. `clims` overrides
    /// the limits derived from the components.
    pub fn create_rgb_composite(
        &mut self,
        channels: ChannelAssignment,
        clims: Option<ChannelLimits>,
    ) -> DocumentResult<LayerId> {
        self.build_composite(channels, clims, true)
    }

    fn build_composite(
        &mut self,
        channels: ChannelAssignment,
        clims: Option<ChannelLimits>,
        hide_components: bool,
    ) -> DocumentResult<LayerId> {
        self.check_components(&channels)?;

        let id = LayerId::new();
        let layer = Layer::rgb(id);
        self.catalogue.insert(layer)?;
        let (presentation, reordered) = self.insert_presentation(id, LayerKind::Rgb, None, None)?;

        info!(layer = %id, "created incomplete composite");
        self.emit(DocumentEvent::LayerAdded {
            reordered,
            id,
            presentation,
        });

        if channels.is_empty() {
            return Ok(id);
        }

        self.assign_channels(id, &channels, true)?;
        if let Some(clims) = clims {
            self.change_rgb_clims(clims, &[id]);
        }
        if hide_components {
            let shown: Vec<LayerId> = channels
                .iter()
                .map(|(_, c)| c)
                .filter(|c| self.current.contains(*c))
                .collect();
            self.toggle_visibility(shown, Some(false))?;
        }
        Ok(id)
    }

    /// Reassign channels of a composite.
    ///
    /// Channels whose component actually changes lose their limits, which are
    /// then re-derived from the new component. With `propagate`, siblings get
    /// the matching components at their own time step. Returns false when
    /// nothing changed.
    pub fn assign_channels(
        &mut self,
        id: LayerId,
        assignment: &ChannelAssignment,
        propagate: bool,
    ) -> DocumentResult<bool> {
        let (_, rgb) = self.composite(id)?;
        let mut channels = rgb.channels;
        let mut clims = rgb.clims;
        self.check_components(assignment)?;

        // siblings are matched on the configuration before the change
        let siblings: Vec<LayerId> = if propagate {
            self.rgb_siblings(id)?
                .into_iter()
                .filter(|s| *s != id)
                .collect()
        } else {
            Vec::new()
        };

        let mut changed = false;
        for (channel, component) in assignment.iter() {
            let i = channel.index();
            if channels[i] == Some(component) {
                continue;
            }
            channels[i] = Some(component);
            clims[i] = None;
            changed = true;
        }
        if !changed {
            return Ok(false);
        }

        if let Some(target) = self.catalogue.get_mut(id)?.as_rgb_mut() {
            target.channels = channels;
            target.clims = clims;
        }
        let updated = self.catalogue.refresh_composite(id)?;
        debug!(layer = %id, fields = ?updated, "recomposed");

        let presentation = self.presentation(id).cloned();
        self.emit(DocumentEvent::CompositionChanged {
            id,
            presentation,
            assignment: assignment.clone(),
        });

        let mut affected = vec![id];
        if propagate {
            affected.extend(self.propagate_components(id, &siblings)?);
        }
        let master_clims = self.composite(id)?.1.clims;
        self.change_rgb_clims(master_clims, &affected);
        Ok(true)
    }

    /// Give each sibling the image matching the master's band at the
    /// sibling's time, for every channel whose band differs.
    ///
    /// Channels without a matching image are left as they are.
    fn propagate_components(
        &mut self,
        master: LayerId,
        siblings: &[LayerId],
    ) -> DocumentResult<Vec<LayerId>> {
        let images = self.catalogue.building_blocks(LayerKind::Image);
        let (master_layer, master_rgb) = self.composite(master)?;
        let key = SiblingKey::of(master_layer);
        let master_bands = master_rgb.bands;

        let mut plans = Vec::new();
        for &sibling in siblings {
            if sibling == master {
                continue;
            }
            let Ok((layer, rgb)) = self.composite(sibling) else {
                warn!(layer = %sibling, "sibling composite no longer loaded");
                continue;
            };
            let mut assignment = ChannelAssignment::default();
            for channel in Channel::ALL {
                let i = channel.index();
                if master_bands[i] == rgb.bands[i] {
                    continue;
                }
                let Some(band) = master_bands[i] else {
                    continue;
                };
                let wanted = key
                    .at(layer.scheduled_time)
                    .with_band(BandKey::Single(band));
                match images.get(&wanted) {
                    Some(component) => assignment.set(channel, Some(*component)),
                    None => debug!(
                        layer = %sibling,
                        ?channel,
                        band,
                        "no matching image for sibling channel"
                    ),
                }
            }
            if !assignment.is_empty() {
                plans.push((sibling, assignment));
            }
        }

        let mut changed = Vec::new();
        for (sibling, assignment) in plans {
            if self.assign_channels(sibling, &assignment, false)? {
                changed.push(sibling);
            }
        }
        Ok(changed)
    }

    /// Composites sharing platform, instrument and band triple with `id`,
    /// `id` included, in time order.
    pub fn rgb_siblings(&self, id: LayerId) -> DocumentResult<Vec<LayerId>> {
        let (master, _) = self.composite(id)?;
        let key = SiblingKey::of(master);
        let mut siblings: Vec<_> = self
            .catalogue
            .directory(LayerKind::Rgb)
            .filter(|(_, other)| {
                other.platform == key.platform
                    && other.instrument == key.instrument
                    && other.band == key.band
            })
            .map(|(sid, other)| (other.scheduled_time, sid))
            .collect();
        siblings.sort();
        debug!(layer = %id, count = siblings.len(), "composite siblings");
        Ok(siblings.into_iter().map(|(_, sid)| sid).collect())
    }

    /// Set channel limits on several composites at once.
    ///
    /// Non-composites and composites already at `clims` are skipped. One
    /// notification is emitted either way, possibly empty. Returns the
    /// composites that changed.
    pub fn change_rgb_clims(&mut self, clims: ChannelLimits, ids: &[LayerId]) -> Vec<LayerId> {
        let mut changed = BTreeMap::new();
        for &id in ids {
            let Some(rgb) = self.catalogue.get_mut(id).ok().and_then(|l| l.as_rgb_mut()) else {
                continue;
            };
            if rgb.clims == clims {
                continue;
            }
            rgb.clims = clims;
            changed.insert(id, ClimChange::Channels(clims));
        }
        let ids: Vec<LayerId> = changed.keys().copied().collect();
        self.emit(DocumentEvent::ColorLimitsChanged(changed));
        ids
    }

    /// Set a composite's channel limits, and optionally its siblings'.
    pub fn change_and_propagate_rgb_clims(
        &mut self,
        id: LayerId,
        clims: ChannelLimits,
        include_siblings: bool,
    ) -> DocumentResult<Vec<LayerId>> {
        let mut targets = vec![id];
        if include_siblings {
            targets.extend(self.rgb_siblings(id)?.into_iter().filter(|s| *s != id));
        } else {
            self.composite(id)?;
        }

        let mut changed = BTreeMap::new();
        for target in targets {
            if let Some(rgb) = self.catalogue.get_mut(target)?.as_rgb_mut() {
                rgb.clims = clims;
                changed.insert(target, ClimChange::Channels(clims));
            }
        }
        let ids: Vec<LayerId> = changed.keys().copied().collect();
        self.emit(DocumentEvent::ColorLimitsChanged(changed));
        Ok(ids)
    }

    /// Change one channel's limits on a composite and its siblings.
    pub fn set_rgb_range(
        &mut self,
        id: LayerId,
        channel: Channel,
        clim: ColorLimits,
    ) -> DocumentResult<Vec<LayerId>> {
        let mut clims = self.composite(id)?.1.clims;
        clims[channel.index()] = Some(clim);
        self.change_and_propagate_rgb_clims(id, clims, true)
    }

    /// Build an animation loop of composites following `master`.
    ///
    /// Scans loaded time steps newest first. Existing composites with the
    /// master's configuration are reused; with `create_missing`, new ones are
    /// built where all three bands are loaded. The loop, sorted by time,
    /// becomes the current animation order. Returns that order, empty when
    /// the master has no scheduled time.
    pub fn build_loop(
        &mut self,
        master: LayerId,
        options: LoopOptions,
    ) -> DocumentResult<Vec<LayerId>> {
        let (master_layer, master_rgb) = self.composite(master)?;
        let Some(master_time) = master_layer.scheduled_time else {
            warn!(layer = %master, "cannot identify scheduled time of master");
            return Ok(Vec::new());
        };
        let key = SiblingKey::of(master_layer);
        let bands = master_rgb.bands;
        let master_clims = master_rgb.clims;

        let images = self.catalogue.building_blocks(LayerKind::Image);
        let composites = self.catalogue.building_blocks(LayerKind::Rgb);
        let steps: BTreeSet<_> = self
            .catalogue
            .iter()
            .filter_map(|layer| layer.scheduled_time)
            .collect();
        debug!(steps = steps.len(), "time steps available");

        let mut sequence = vec![(master_time, master)];
        let mut to_build = Vec::new();
        let mut to_hide = Vec::new();
        for &step in steps.iter().rev() {
            if step == master_time {
                continue;
            }
            let at_step = key.at(Some(step));
            if let Some(existing) = composites.get(&at_step) {
                sequence.push((step, *existing));
                continue;
            }
            let components: Option<Vec<LayerId>> = bands
                .iter()
                .map(|band| {
                    band.and_then(|b| images.get(&at_step.with_band(BandKey::Single(b))).copied())
                })
                .collect();
            match components.as_deref() {
                Some(&[r, g, b]) => {
                    debug!(%step, red = %r, green = %g, blue = %b, "will build composite");
                    to_build.push((step, r, g, b));
                    to_hide.extend([r, g, b]);
                }
                _ => info!(%step, "no complete composite could be made"),
            }
        }

        if options.create_missing {
            info!(count = to_build.len(), "creating composites from loaded images");
            for (step, r, g, b) in to_build {
                let channels = ChannelAssignment {
                    red: Some(r),
                    green: Some(g),
                    blue: Some(b),
                };
                let id = self.build_composite(channels, None, false)?;
                sequence.push((step, id));
            }
            if options.hide_contributors {
                let shown: BTreeSet<LayerId> = to_hide
                    .into_iter()
                    .filter(|id| self.current.contains(*id))
                    .collect();
                debug!(count = shown.len(), "hiding layers used by composites");
                self.toggle_visibility(shown, Some(false))?;
            }
        }

        if options.force_limits {
            let ids: Vec<LayerId> = sequence.iter().map(|(_, id)| *id).collect();
            self.change_rgb_clims(master_clims, &ids);
        }

        sequence.retain(|(_, id)| {
            let present = self.current.contains(*id);
            if !present {
                warn!(layer = %id, "composite not in current layer set, left out of loop");
            }
            present
        });
        sequence.sort();
        let order: Vec<LayerId> = sequence.into_iter().map(|(_, id)| id).collect();
        self.set_animation_order(order)
    }
}
