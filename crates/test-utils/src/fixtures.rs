//! Common test fixtures for layer document tests.
//!
//! File names follow the real AHI and ABI naming schemes so that the imager
//! guidebook recognizes platform, band and time.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use sift_common::GridGeometry;

/// AHI file names at 2015-07-14.
pub mod ahi {
    /// Blue, 00:30
    pub const B01_0030: &str = "HS_H08_20150714_0030_B01_FLDK_R10.merc.tif";
    /// Green, 00:30
    pub const B02_0030: &str = "HS_H08_20150714_0030_B02_FLDK_R10.merc.tif";
    /// Red, 00:30
    pub const B03_0030: &str = "HS_H08_20150714_0030_B03_FLDK_R05.merc.tif";
    /// Clean IR, 00:30
    pub const B13_0030: &str = "HS_H08_20150714_0030_B13_FLDK_R20.merc.tif";

    pub const B01_0040: &str = "HS_H08_20150714_0040_B01_FLDK_R10.merc.tif";
    pub const B02_0040: &str = "HS_H08_20150714_0040_B02_FLDK_R10.merc.tif";
    pub const B03_0040: &str = "HS_H08_20150714_0040_B03_FLDK_R05.merc.tif";
    pub const B13_0040: &str = "HS_H08_20150714_0040_B13_FLDK_R20.merc.tif";

    pub const B01_0050: &str = "HS_H08_20150714_0050_B01_FLDK_R10.merc.tif";
    pub const B02_0050: &str = "HS_H08_20150714_0050_B02_FLDK_R10.merc.tif";
    pub const B13_0050: &str = "HS_H08_20150714_0050_B13_FLDK_R20.merc.tif";
}

/// ABI file names.
pub mod abi {
    /// GOES-16 red visible, 2024-12-17 18:00
    pub const C02_1800: &str =
        "OR_ABI-L1b-RadF-M6C02_G16_s20243521800210_e20243521809518_c20243521809553.nc";
    /// GOES-16 clean IR, 2024-12-17 18:00
    pub const C13_1800: &str =
        "OR_ABI-L1b-RadF-M6C13_G16_s20243521800210_e20243521809530_c20243521809588.nc";
}

/// Scan time of the AHI fixtures at `hhmm` on 2015-07-14.
pub fn ahi_time(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 7, 14, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

/// Absolute-looking path for a fixture file name.
pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from("/data/ahi").join(name)
}

/// Full-disk geostationary grid at 2 km.
pub fn full_disk_grid() -> GridGeometry {
    GridGeometry {
        origin_x: -5_500_000.0,
        origin_y: 5_500_000.0,
        cell_width: 2000.0,
        cell_height: -2000.0,
        proj4: "+proj=geos +lon_0=140.7 +h=35785863 +a=6378137.0 +b=6356752.3".to_string(),
    }
}
