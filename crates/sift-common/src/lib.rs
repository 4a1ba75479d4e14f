//! Common types shared across the layer document crates.

pub mod colormap;
pub mod error;
pub mod layer;
pub mod limits;
pub mod time;

pub use colormap::ColormapRef;
pub use error::{DocumentError, DocumentResult};
pub use layer::{
    Band, BandKey, Channel, GridGeometry, ImageInfo, Layer, LayerId, LayerKind, LayerPayload,
    LayerUpdate, RgbComposite,
};
pub use limits::ColorLimits;
pub use time::{display_time, ScheduledTime};
