//! Layer definitions and metadata for the layer document.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::time::ScheduledTime;
use crate::ColorLimits;

/// Spectral band number (e.g. AHI band 1-16).
pub type Band = u8;

/// Unique identifier for a layer.
///
/// Random 128-bit value; ordering is only used as a deterministic tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LayerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of layer it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Single-band float field shown with a colormap
    Image,
    /// Combination of three image layers as color channels
    Rgb,
    /// Geographic outline, typically political borders
    Outline,
    /// User-selected region: point, line or polygon
    Shape,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LayerKind::Image => "image",
            LayerKind::Rgb => "rgb",
            LayerKind::Outline => "outline",
            LayerKind::Shape => "shape",
        };
        write!(f, "{}", s)
    }
}

/// Color channel of an RGB composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Channel::Red => 'R',
            Channel::Green => 'G',
            Channel::Blue => 'B',
        }
    }
}

/// Band identity used for sibling matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandKey {
    Unknown,
    Single(Band),
    Triple([Option<Band>; 3]),
}

/// Grid placement of an image in projection coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    /// PROJ.4 definition of the native projection
    #[serde(default)]
    pub proj4: String,
}

/// Image-specific metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub band: Option<Band>,
    /// Default color limits for the data
    pub clim: Option<ColorLimits>,
    pub grid: Option<GridGeometry>,
    /// udunits-style units, e.g. "K" or "1"
    pub units: Option<String>,
}

/// RGB composite state.
///
/// Channels hold identifiers of component image layers; they are looked up
/// through the catalogue and never own the component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RgbComposite {
    pub channels: [Option<LayerId>; 3],
    pub clims: [Option<ColorLimits>; 3],
    /// Bands of the assigned components, derived
    pub bands: [Option<Band>; 3],
    /// Grid of the components, derived
    pub grid: Option<GridGeometry>,
}

impl RgbComposite {
    pub fn component(&self, channel: Channel) -> Option<LayerId> {
        self.channels[channel.index()]
    }

    pub fn clim(&self, channel: Channel) -> Option<ColorLimits> {
        self.clims[channel.index()]
    }

    /// All three channels assigned.
    pub fn is_complete(&self) -> bool {
        self.channels.iter().all(Option::is_some)
    }

    /// Assigned components in R, G, B order.
    pub fn components(&self) -> impl Iterator<Item = (Channel, LayerId)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(|ch| self.component(ch).map(|id| (ch, id)))
    }
}

/// Kind-specific layer payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerPayload {
    Image(ImageInfo),
    Rgb(RgbComposite),
    Outline,
    Shape,
}

/// A layer record in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    id: LayerId,

    /// Display name
    pub name: String,

    /// Source file the layer was imported from
    pub source: Option<PathBuf>,

    /// Spacecraft, e.g. "Himawari-8"
    pub platform: Option<String>,

    /// Instrument, e.g. "AHI"
    pub instrument: Option<String>,

    /// Nominal observation time
    pub scheduled_time: Option<ScheduledTime>,

    pub payload: LayerPayload,
}

/// Default name of a composite before any channel is assigned.
pub const UNCONFIGURED_RGB_NAME: &str = "-RGB-";

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, payload: LayerPayload) -> Self {
        Self {
            id,
            name: name.into(),
            source: None,
            platform: None,
            instrument: None,
            scheduled_time: None,
            payload,
        }
    }

    pub fn image(id: LayerId, name: impl Into<String>, info: ImageInfo) -> Self {
        Self::new(id, name, LayerPayload::Image(info))
    }

    /// A new composite with no channel assigned.
    pub fn rgb(id: LayerId) -> Self {
        Self::new(id, UNCONFIGURED_RGB_NAME, LayerPayload::Rgb(RgbComposite::default()))
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn kind(&self) -> LayerKind {
        match self.payload {
            LayerPayload::Image(_) => LayerKind::Image,
            LayerPayload::Rgb(_) => LayerKind::Rgb,
            LayerPayload::Outline => LayerKind::Outline,
            LayerPayload::Shape => LayerKind::Shape,
        }
    }

    /// Whether enough metadata is known to display the layer.
    ///
    /// Images need a grid and color limits. Composites additionally need all
    /// three channels and their limits; an incomplete composite is a normal
    /// intermediate state, not an error.
    pub fn is_valid(&self) -> bool {
        match &self.payload {
            LayerPayload::Image(info) => info.grid.is_some() && info.clim.is_some(),
            LayerPayload::Rgb(rgb) => {
                rgb.is_complete() && rgb.clims.iter().all(Option::is_some) && rgb.grid.is_some()
            }
            LayerPayload::Outline | LayerPayload::Shape => true,
        }
    }

    pub fn band_key(&self) -> BandKey {
        match &self.payload {
            LayerPayload::Image(ImageInfo { band: Some(b), .. }) => BandKey::Single(*b),
            LayerPayload::Rgb(rgb) => BandKey::Triple(rgb.bands),
            _ => BandKey::Unknown,
        }
    }

    pub fn band(&self) -> Option<Band> {
        self.as_image().and_then(|info| info.band)
    }

    pub fn as_image(&self) -> Option<&ImageInfo> {
        match &self.payload {
            LayerPayload::Image(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<&RgbComposite> {
        match &self.payload {
            LayerPayload::Rgb(rgb) => Some(rgb),
            _ => None,
        }
    }

    pub fn as_rgb_mut(&mut self) -> Option<&mut RgbComposite> {
        match &mut self.payload {
            LayerPayload::Rgb(rgb) => Some(rgb),
            _ => None,
        }
    }

    /// Default color limits of an image layer.
    pub fn clim(&self) -> Option<ColorLimits> {
        self.as_image().and_then(|info| info.clim)
    }

    pub fn grid(&self) -> Option<&GridGeometry> {
        match &self.payload {
            LayerPayload::Image(info) => info.grid.as_ref(),
            LayerPayload::Rgb(rgb) => rgb.grid.as_ref(),
            _ => None,
        }
    }

    pub fn units(&self) -> Option<&str> {
        self.as_image().and_then(|info| info.units.as_deref())
    }

    /// Merge a partial update into this layer.
    ///
    /// Never changes the identifier or kind. Image-only fields are ignored for
    /// other kinds. Returns the names of the fields that changed.
    pub fn apply(&mut self, update: &LayerUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();

        fn merge<T: Clone + PartialEq>(
            slot: &mut T,
            value: &Option<T>,
            name: &'static str,
            changed: &mut Vec<&'static str>,
        ) {
            if let Some(v) = value {
                if slot != v {
                    *slot = v.clone();
                    changed.push(name);
                }
            }
        }

        fn merge_opt<T: Clone + PartialEq>(
            slot: &mut Option<T>,
            value: &Option<T>,
            name: &'static str,
            changed: &mut Vec<&'static str>,
        ) {
            if let Some(v) = value {
                if slot.as_ref() != Some(v) {
                    *slot = Some(v.clone());
                    changed.push(name);
                }
            }
        }

        merge(&mut self.name, &update.name, "name", &mut changed);
        merge_opt(&mut self.source, &update.source, "source", &mut changed);
        merge_opt(&mut self.platform, &update.platform, "platform", &mut changed);
        merge_opt(&mut self.instrument, &update.instrument, "instrument", &mut changed);
        merge_opt(
            &mut self.scheduled_time,
            &update.scheduled_time,
            "scheduled_time",
            &mut changed,
        );

        if let LayerPayload::Image(info) = &mut self.payload {
            merge_opt(&mut info.band, &update.band, "band", &mut changed);
            merge_opt(&mut info.clim, &update.clim, "clim", &mut changed);
            merge_opt(&mut info.grid, &update.grid, "grid", &mut changed);
            merge_opt(&mut info.units, &update.units, "units", &mut changed);
        }

        changed
    }
}

/// Partial layer metadata, as reported by importers and the guidebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerUpdate {
    pub name: Option<String>,
    pub source: Option<PathBuf>,
    pub platform: Option<String>,
    pub instrument: Option<String>,
    pub scheduled_time: Option<ScheduledTime>,
    pub band: Option<Band>,
    pub clim: Option<ColorLimits>,
    pub grid: Option<GridGeometry>,
    pub units: Option<String>,
}

impl LayerUpdate {
    pub fn is_empty(&self) -> bool {
        *self == LayerUpdate::default()
    }

    /// Fill fields that are unset here from `other`.
    pub fn or(mut self, other: LayerUpdate) -> Self {
        self.name = self.name.or(other.name);
        self.source = self.source.or(other.source);
        self.platform = self.platform.or(other.platform);
        self.instrument = self.instrument.or(other.instrument);
        self.scheduled_time = self.scheduled_time.or(other.scheduled_time);
        self.band = self.band.or(other.band);
        self.clim = self.clim.or(other.clim);
        self.grid = self.grid.or(other.grid);
        self.units = self.units.or(other.units);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridGeometry {
        GridGeometry {
            origin_x: -5_500_000.0,
            origin_y: 5_500_000.0,
            cell_width: 2000.0,
            cell_height: -2000.0,
            proj4: "+proj=geos +h=35785863".to_string(),
        }
    }

    #[test]
    fn test_image_validity() {
        let mut layer = Layer::image(LayerId::new(), "B01", ImageInfo::default());
        assert!(!layer.is_valid());

        layer.apply(&LayerUpdate {
            grid: Some(grid()),
            clim: Some(ColorLimits::new(0.0, 1.0)),
            ..Default::default()
        });
        assert!(layer.is_valid());
    }

    #[test]
    fn test_apply_reports_changes_and_is_idempotent() {
        let mut layer = Layer::image(LayerId::new(), "B01", ImageInfo::default());
        let update = LayerUpdate {
            name: Some("AHI B01".to_string()),
            band: Some(1),
            ..Default::default()
        };
        assert_eq!(layer.apply(&update), vec!["name", "band"]);
        assert!(layer.apply(&update).is_empty());
        assert_eq!(layer.band_key(), BandKey::Single(1));
    }

    #[test]
    fn test_apply_ignores_image_fields_on_rgb() {
        let id = LayerId::new();
        let mut layer = Layer::rgb(id);
        let changed = layer.apply(&LayerUpdate {
            band: Some(3),
            ..Default::default()
        });
        assert!(changed.is_empty());
        assert_eq!(layer.kind(), LayerKind::Rgb);
        assert_eq!(layer.id(), id);
        assert_eq!(layer.band_key(), BandKey::Triple([None, None, None]));
    }

    #[test]
    fn test_rgb_incomplete_is_not_valid() {
        let mut layer = Layer::rgb(LayerId::new());
        assert!(!layer.is_valid());
        let rgb = layer.as_rgb_mut().unwrap();
        rgb.channels = [Some(LayerId::new()), Some(LayerId::new()), None];
        assert!(!rgb.is_complete());
        assert_eq!(rgb.components().count(), 2);
    }

    #[test]
    fn test_update_or() {
        let a = LayerUpdate {
            name: Some("a".into()),
            ..Default::default()
        };
        let b = LayerUpdate {
            name: Some("b".into()),
            band: Some(7),
            ..Default::default()
        };
        let merged = a.or(b);
        assert_eq!(merged.name.as_deref(), Some("a"));
        assert_eq!(merged.band, Some(7));
        assert!(LayerUpdate::default().is_empty());
    }
}
