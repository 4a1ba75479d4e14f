//! Tests for layer records as they cross process and thread boundaries.

use chrono::{TimeZone, Utc};
use sift_common::layer::UNCONFIGURED_RGB_NAME;
use sift_common::{
    BandKey, ColorLimits, GridGeometry, ImageInfo, Layer, LayerId, LayerKind, LayerPayload,
    LayerUpdate,
};

fn grid() -> GridGeometry {
    GridGeometry {
        origin_x: -5_500_000.0,
        origin_y: 5_500_000.0,
        cell_width: 2000.0,
        cell_height: -2000.0,
        proj4: "+proj=geos +h=35785863".to_string(),
    }
}

// ============================================================================
// Payload serialization
// ============================================================================

#[test]
fn test_payload_is_tagged_by_kind() {
    let image = serde_json::to_value(LayerPayload::Image(ImageInfo::default())).unwrap();
    assert_eq!(image["kind"], "image");

    let outline = serde_json::to_value(LayerPayload::Outline).unwrap();
    assert_eq!(outline, serde_json::json!({ "kind": "outline" }));
}

#[test]
fn test_layer_json_round_trip() {
    let mut layer = Layer::image(
        LayerId::new(),
        "AHI B13",
        ImageInfo {
            band: Some(13),
            clim: Some(ColorLimits::new(164.15, 328.15)),
            grid: Some(grid()),
            units: Some("K".to_string()),
        },
    );
    layer.platform = Some("Himawari-8".to_string());
    layer.scheduled_time = Utc.with_ymd_and_hms(2015, 7, 14, 0, 30, 0).single();

    let json = serde_json::to_string(&layer).unwrap();
    let back: Layer = serde_json::from_str(&json).unwrap();
    assert_eq!(back, layer);
    assert_eq!(back.id(), layer.id());
    assert_eq!(back.band_key(), BandKey::Single(13));
}

#[test]
fn test_partial_update_from_json() {
    let update: LayerUpdate =
        serde_json::from_str(r#"{"name":"IR","clim":{"min":200.0,"max":300.0}}"#).unwrap();
    assert_eq!(update.name.as_deref(), Some("IR"));
    assert_eq!(update.clim, Some(ColorLimits::new(200.0, 300.0)));
    assert!(update.grid.is_none());
    assert!(!update.is_empty());
}

// ============================================================================
// Layer kinds
// ============================================================================

#[test]
fn test_new_composite() {
    let rgb = Layer::rgb(LayerId::new());
    assert_eq!(rgb.kind(), LayerKind::Rgb);
    assert_eq!(rgb.name, UNCONFIGURED_RGB_NAME);
    assert_eq!(rgb.band_key(), BandKey::Triple([None; 3]));
    assert!(!rgb.is_valid());
    assert!(rgb.clim().is_none());
}

#[test]
fn test_update_fills_missing_metadata() {
    let mut layer = Layer::image(LayerId::new(), "B13", ImageInfo::default());
    assert!(!layer.is_valid());

    let changed = layer.apply(&LayerUpdate {
        grid: Some(grid()),
        clim: Some(ColorLimits::new(0.0, 1.0)),
        ..Default::default()
    });
    assert_eq!(changed, vec!["clim", "grid"]);
    assert!(layer.is_valid());
}
