//! Satellite file name parsing.
//!
//! Supports Himawari AHI HSF-derived names
//! (`HS_H08_20150714_0030_B10_FLDK_R20.merc.tif`) and GOES ABI names
//! (`OR_ABI-L1b-RadF-M6C02_G16_s20243521800210_e..._c....nc`).

use chrono::{DurationRound, TimeDelta};
use std::path::Path;

use sift_common::time::{parse_date_hhmm, parse_day_of_year_timestamp};
use sift_common::{Band, ScheduledTime};

/// Information extracted from a satellite file name.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteFileInfo {
    /// Spacecraft, e.g. "Himawari-8" or "GOES-16"
    pub platform: String,
    /// "AHI" or "ABI"
    pub instrument: String,
    pub band: Band,
    /// Nominal scan start, truncated to the minute
    pub scheduled_time: ScheduledTime,
    /// Sector or product, e.g. "FLDK" or "RadF"
    pub sector: String,
}

/// Parse any supported satellite file name from a path.
pub fn parse_satellite_path(path: &Path) -> Option<SatelliteFileInfo> {
    let filename = path.file_name().and_then(|s| s.to_str())?;
    parse_ahi_filename(filename).or_else(|| parse_abi_filename(filename))
}

/// Parse an AHI HSF-style file name.
///
/// Example: `HS_H08_20150714_0030_B10_FLDK_R20.merc.tif`
pub fn parse_ahi_filename(filename: &str) -> Option<SatelliteFileInfo> {
    let mut parts = filename.split('_');
    if parts.next()? != "HS" {
        return None;
    }

    let platform = match parts.next()? {
        "H08" => "Himawari-8",
        "H09" => "Himawari-9",
        _ => return None,
    };
    let date = parts.next()?;
    let hhmm = parts.next()?;
    let band = parts.next()?.strip_prefix('B')?.parse::<Band>().ok()?;
    let sector = parts.next()?.to_string();

    Some(SatelliteFileInfo {
        platform: platform.to_string(),
        instrument: "AHI".to_string(),
        band,
        scheduled_time: parse_date_hhmm(date, hhmm)?,
        sector,
    })
}

/// Parse a GOES ABI file name.
///
/// Example: `OR_ABI-L1b-RadF-M6C02_G16_s20243521800210_e..._c....nc`
pub fn parse_abi_filename(filename: &str) -> Option<SatelliteFileInfo> {
    if !filename.contains("_ABI-") {
        return None;
    }

    let platform = if filename.contains("_G16_") {
        "GOES-16"
    } else if filename.contains("_G17_") {
        "GOES-17"
    } else if filename.contains("_G18_") {
        "GOES-18"
    } else if filename.contains("_G19_") {
        "GOES-19"
    } else {
        return None;
    };

    // Band from M6C## / M3C## / M4C##
    let band = ["M6C", "M3C", "M4C"]
        .iter()
        .find_map(|mode| filename.find(mode))
        .and_then(|pos| filename.get(pos + 3..pos + 5))
        .and_then(|s| s.parse::<Band>().ok())?;

    // Observation start from _s{YYYYDDDHHMMSS}
    let scheduled_time = filename
        .find("_s")
        .and_then(|pos| filename.get(pos + 2..pos + 15))
        .and_then(parse_day_of_year_timestamp)
        .and_then(|t| t.duration_trunc(TimeDelta::minutes(1)).ok())?;

    // Product between "ABI-L1b-" (or L2) and the mode
    let sector = filename
        .split('-')
        .nth(2)
        .unwrap_or("RadF")
        .to_string();

    Some(SatelliteFileInfo {
        platform: platform.to_string(),
        instrument: "ABI".to_string(),
        band,
        scheduled_time,
        sector,
    })
}

/// Central wavelength in micrometers for a band of a known instrument.
pub fn central_wavelength(instrument: &str, band: Band) -> Option<f64> {
    const AHI: [f64; 16] = [
        0.47, 0.51, 0.64, 0.86, 1.6, 2.3, 3.9, 6.2, 6.9, 7.3, 8.6, 9.6, 10.4, 11.2, 12.4, 13.3,
    ];
    const ABI: [f64; 16] = [
        0.47, 0.64, 0.86, 1.37, 1.6, 2.2, 3.9, 6.2, 6.9, 7.3, 8.4, 9.6, 10.3, 11.2, 12.3, 13.3,
    ];
    let table = match instrument {
        "AHI" => &AHI,
        "ABI" => &ABI,
        _ => return None,
    };
    table.get(usize::from(band).checked_sub(1)?).copied()
}

/// Bands 1-6 of both imagers measure reflectance; the rest brightness temperature.
pub fn is_reflective_band(band: Band) -> bool {
    (1..=6).contains(&band)
}

/// Water vapor absorption bands (8-10 on both imagers).
pub fn is_water_vapor_band(band: Band) -> bool {
    (8..=10).contains(&band)
}
