//! Guidebook: domain knowledge about satellite products.
//!
//! The guidebook supplies what a file does not say about itself: display
//! names, default color limits and colormaps, unit conversions for display,
//! load order, and which layers belong together in time or across bands.

use std::path::PathBuf;

use sift_common::colormap::names;
use sift_common::{display_time, ColorLimits, ColormapRef, Layer, LayerId, LayerKind, LayerUpdate};

use crate::catalogue::Catalogue;
use crate::filenames::{
    central_wavelength, is_reflective_band, is_water_vapor_band, parse_satellite_path,
};

const KELVIN_OFFSET: f64 = 273.15;

/// Transform applied to data values before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitTransform {
    Identity,
    /// Kelvin data shown in degrees Celsius
    KelvinToCelsius,
    /// 0..1 reflectance shown in percent
    FractionToPercent,
}

/// How to present values of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    /// Decimal places
    pub precision: usize,
    pub unit: String,
    pub transform: UnitTransform,
}

impl UnitConversion {
    pub fn identity(unit: impl Into<String>) -> Self {
        Self {
            precision: 2,
            unit: unit.into(),
            transform: UnitTransform::Identity,
        }
    }

    /// Convert a data value to display units, or back when `inverse`.
    pub fn convert(&self, value: f64, inverse: bool) -> f64 {
        match (self.transform, inverse) {
            (UnitTransform::Identity, _) => value,
            (UnitTransform::KelvinToCelsius, false) => value - KELVIN_OFFSET,
            (UnitTransform::KelvinToCelsius, true) => value + KELVIN_OFFSET,
            (UnitTransform::FractionToPercent, false) => value * 100.0,
            (UnitTransform::FractionToPercent, true) => value / 100.0,
        }
    }

    /// Format a display value with its unit.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}{}", self.precision, value, self.unit)
    }
}

/// Ordered siblings of a layer plus the position of that layer among them.
pub type Siblings = (Vec<LayerId>, Option<usize>);

/// Product knowledge consulted by the document.
pub trait Guidebook {
    /// Metadata not stored in the file itself.
    fn collect_info(&self, layer: &Layer) -> LayerUpdate;

    fn default_colormap(&self, layer: &Layer) -> Option<ColormapRef>;

    /// Default color limits.
    fn climits(&self, layer: &Layer) -> Option<ColorLimits>;

    fn display_name(&self, layer: &Layer) -> Option<String>;

    fn display_time(&self, layer: &Layer) -> String {
        display_time(layer.scheduled_time.as_ref())
    }

    fn units_conversion(&self, layer: &Layer) -> UnitConversion {
        UnitConversion::identity(layer.units().unwrap_or(""))
    }

    /// Order in which files should be loaded so the newest ends on top.
    fn sort_paths_into_load_order(&self, mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    /// Image layers of the same platform, instrument and band, in time order.
    fn time_siblings(&self, id: LayerId, catalogue: &Catalogue) -> Siblings {
        let Ok(layer) = catalogue.get(id) else {
            return (Vec::new(), None);
        };
        let (Some(band), Some(_)) = (layer.band(), layer.scheduled_time) else {
            return (Vec::new(), None);
        };
        let mut sibs: Vec<_> = catalogue
            .iter()
            .filter(|other| {
                other.kind() == LayerKind::Image
                    && other.platform == layer.platform
                    && other.instrument == layer.instrument
                    && other.band() == Some(band)
            })
            .filter_map(|other| other.scheduled_time.map(|t| (t, other.id())))
            .collect();
        sibs.sort();
        let ids: Vec<LayerId> = sibs.into_iter().map(|(_, id)| id).collect();
        let position = ids.iter().position(|x| *x == id);
        (ids, position)
    }

    /// Image layers of the same platform, instrument and time, in band order.
    fn channel_siblings(&self, id: LayerId, catalogue: &Catalogue) -> Siblings {
        let Ok(layer) = catalogue.get(id) else {
            return (Vec::new(), None);
        };
        let (Some(_), Some(when)) = (layer.band(), layer.scheduled_time) else {
            return (Vec::new(), None);
        };
        let mut sibs: Vec<_> = catalogue
            .iter()
            .filter(|other| {
                other.kind() == LayerKind::Image
                    && other.platform == layer.platform
                    && other.instrument == layer.instrument
                    && other.scheduled_time == Some(when)
            })
            .filter_map(|other| other.band().map(|b| (b, other.id())))
            .collect();
        sibs.sort();
        let ids: Vec<LayerId> = sibs.into_iter().map(|(_, id)| id).collect();
        let position = ids.iter().position(|x| *x == id);
        (ids, position)
    }

    /// The given layers plus all of their time siblings, without duplicates.
    fn time_siblings_ids(&self, ids: &[LayerId], catalogue: &Catalogue) -> Vec<LayerId> {
        let mut all = Vec::new();
        for id in ids {
            let (sibs, _) = self.time_siblings(*id, catalogue);
            if sibs.is_empty() {
                all.push(*id);
            }
            all.extend(sibs);
        }
        let mut seen = std::collections::HashSet::new();
        all.retain(|id| seen.insert(*id));
        all
    }
}

/// Guidebook for AHI and ABI full-disk imagery.
#[derive(Debug, Clone, Default)]
pub struct ImagerGuidebook;

impl ImagerGuidebook {
    pub fn new() -> Self {
        Self
    }
}

impl Guidebook for ImagerGuidebook {
    fn collect_info(&self, layer: &Layer) -> LayerUpdate {
        let Some(info) = layer.source.as_deref().and_then(parse_satellite_path) else {
            return LayerUpdate::default();
        };
        let units = if is_reflective_band(info.band) { "1" } else { "K" };
        LayerUpdate {
            platform: Some(info.platform),
            instrument: Some(info.instrument),
            band: Some(info.band),
            scheduled_time: Some(info.scheduled_time),
            units: layer.units().is_none().then(|| units.to_string()),
            ..Default::default()
        }
    }

    fn default_colormap(&self, layer: &Layer) -> Option<ColormapRef> {
        let band = layer.band()?;
        let name = if is_reflective_band(band) {
            names::ZA_VIS_DEFAULT
        } else if is_water_vapor_band(band) {
            names::GRAY_SCALE_WATER_VAPOR
        } else {
            names::CIRA_IR_DEFAULT
        };
        Some(ColormapRef::named(name))
    }

    fn climits(&self, layer: &Layer) -> Option<ColorLimits> {
        match layer.band() {
            Some(band) if is_reflective_band(band) => Some(ColorLimits::new(-0.012, 1.192)),
            Some(_) => Some(ColorLimits::new(
                -109.0 + KELVIN_OFFSET,
                55.0 + KELVIN_OFFSET,
            )),
            None => layer.clim(),
        }
    }

    fn display_name(&self, layer: &Layer) -> Option<String> {
        let instrument = layer.instrument.as_deref()?;
        let band = layer.band()?;
        let name = match central_wavelength(instrument, band) {
            Some(wl) => format!("{} B{:02} {:.2}µm", instrument, band, wl),
            None => format!("{} B{:02}", instrument, band),
        };
        Some(name)
    }

    fn units_conversion(&self, layer: &Layer) -> UnitConversion {
        match layer.units() {
            Some("K") => UnitConversion {
                precision: 1,
                unit: "°C".to_string(),
                transform: UnitTransform::KelvinToCelsius,
            },
            Some("1") => UnitConversion {
                precision: 1,
                unit: "%".to_string(),
                transform: UnitTransform::FractionToPercent,
            },
            other => UnitConversion::identity(other.unwrap_or("")),
        }
    }

    /// Oldest first, bands ascending within a time step; unrecognized files last.
    fn sort_paths_into_load_order(&self, mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort_by_cached_key(|path| {
            let parsed = parse_satellite_path(path).map(|info| (info.scheduled_time, info.band));
            (parsed.is_none(), parsed, path.clone())
        });
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_common::ImageInfo;

    fn layer_from(path: &str) -> Layer {
        let mut layer = Layer::image(LayerId::new(), "", ImageInfo::default());
        layer.source = Some(PathBuf::from(path));
        let update = ImagerGuidebook.collect_info(&layer);
        layer.apply(&update);
        layer
    }

    #[test]
    fn test_collect_info_from_ahi_name() {
        let layer = layer_from("/data/HS_H08_20150714_0030_B13_FLDK_R20.merc.tif");
        assert_eq!(layer.platform.as_deref(), Some("Himawari-8"));
        assert_eq!(layer.band(), Some(13));
        assert_eq!(layer.units(), Some("K"));
        assert_eq!(
            ImagerGuidebook.display_name(&layer).as_deref(),
            Some("AHI B13 10.40µm")
        );
        assert_eq!(
            ImagerGuidebook.default_colormap(&layer),
            Some(ColormapRef::named(names::CIRA_IR_DEFAULT))
        );
    }

    #[test]
    fn test_reflective_defaults() {
        let layer = layer_from("/data/HS_H08_20150714_0030_B03_FLDK_R05.merc.tif");
        assert_eq!(
            ImagerGuidebook.climits(&layer),
            Some(ColorLimits::new(-0.012, 1.192))
        );
        let conv = ImagerGuidebook.units_conversion(&layer);
        assert_eq!(conv.transform, UnitTransform::FractionToPercent);
        assert_eq!(conv.format(conv.convert(0.5, false)), "50.0%");
    }

    #[test]
    fn test_kelvin_conversion_round_trips() {
        let conv = UnitConversion {
            precision: 1,
            unit: "°C".to_string(),
            transform: UnitTransform::KelvinToCelsius,
        };
        assert!((conv.convert(273.15, false)).abs() < 1e-9);
        assert!((conv.convert(conv.convert(250.0, false), true) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_order() {
        let paths = vec![
            PathBuf::from("/d/readme.txt"),
            PathBuf::from("/d/HS_H08_20150714_0040_B01_FLDK_R10.tif"),
            PathBuf::from("/d/HS_H08_20150714_0030_B03_FLDK_R05.tif"),
            PathBuf::from("/d/HS_H08_20150714_0030_B01_FLDK_R10.tif"),
        ];
        let sorted = ImagerGuidebook.sort_paths_into_load_order(paths);
        let names: Vec<_> = sorted
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "HS_H08_20150714_0030_B01_FLDK_R10.tif",
                "HS_H08_20150714_0030_B03_FLDK_R05.tif",
                "HS_H08_20150714_0040_B01_FLDK_R10.tif",
                "readme.txt",
            ]
        );
    }
}
