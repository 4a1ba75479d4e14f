//! Point probe values for the equalizer display.

use std::collections::BTreeMap;

use sift_common::{ColorLimits, Layer, LayerId, LayerPayload};
use tracing::trace;

use super::Document;
use crate::events::{DocumentEvent, EqualizerValue, Reading};
use crate::guidebook::Guidebook;
use crate::workspace::Workspace;

impl<W: Workspace, G: Guidebook> Document<W, G> {
    /// Sample every layer at `point` and announce the readings.
    ///
    /// Samples the current set, or only `ids` when given. With the probe
    /// inactive an empty map is announced. Layers without a usable reading map
    /// to `None`; outlines and shapes are left out.
    pub fn update_equalizer_values(
        &mut self,
        active: bool,
        point: (f64, f64),
        ids: Option<&[LayerId]>,
    ) -> BTreeMap<LayerId, Option<EqualizerValue>> {
        if !active {
            self.emit(DocumentEvent::EqualizerValuesChanged(BTreeMap::new()));
            return BTreeMap::new();
        }

        let targets: Vec<LayerId> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.current.ids(),
        };

        let mut values = BTreeMap::new();
        for id in targets {
            let Ok(layer) = self.catalogue.get(id) else {
                continue;
            };
            let value = match &layer.payload {
                LayerPayload::Image(_) => {
                    let clim = self
                        .presentation(id)
                        .and_then(|p| p.clim)
                        .or_else(|| layer.clim());
                    self.image_reading(layer, clim, point)
                }
                LayerPayload::Rgb(rgb) => {
                    let mut bytes = [None; 3];
                    for (channel, component) in rgb.components() {
                        let Some(clim) = rgb.clim(channel) else {
                            continue;
                        };
                        bytes[channel.index()] = self
                            .workspace
                            .content_point(component, point)
                            .map(|v| clim.to_byte(v));
                    }
                    let present: Vec<f64> = bytes.iter().flatten().map(|b| f64::from(*b)).collect();
                    let bar_width = if present.is_empty() {
                        0.0
                    } else {
                        present.iter().sum::<f64>() / present.len() as f64 / 255.0
                    };
                    Some(EqualizerValue {
                        reading: Reading::Rgb(bytes),
                        bar_width,
                        precision: 0,
                        unit: String::new(),
                    })
                }
                LayerPayload::Outline | LayerPayload::Shape => continue,
            };
            values.insert(id, value);
        }

        trace!(layers = values.len(), x = point.0, y = point.1, "equalizer values");
        self.emit(DocumentEvent::EqualizerValuesChanged(values.clone()));
        values
    }

    fn image_reading(
        &self,
        layer: &Layer,
        clim: Option<ColorLimits>,
        point: (f64, f64),
    ) -> Option<EqualizerValue> {
        let raw = self.workspace.content_point(layer.id(), point)?;
        if raw.is_nan() {
            return None;
        }
        let conversion = self.guidebook.units_conversion(layer);
        let value = conversion.convert(raw, false);
        let bar_width = clim
            .map(|c| c.map(|v| conversion.convert(v, false)))
            .and_then(|c| c.bar_width(value))
            .unwrap_or(0.0);
        Some(EqualizerValue {
            reading: Reading::Scalar(value),
            bar_width,
            precision: conversion.precision,
            unit: conversion.unit,
        })
    }
}
