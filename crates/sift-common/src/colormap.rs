//! Colormap references.
//!
//! Colormap tables live outside the document. Presentation entries only carry
//! a reference: either the name of a built-in colormap or the identifier of a
//! user-defined one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Names of the built-in colormaps the rendering side is expected to provide.
pub mod names {
    pub const CLOUD_AMOUNT_DEFAULT: &str = "cloud_amount_default";
    pub const CLOUD_TOP_HEIGHT: &str = "cloud_top_height";
    pub const LOW_CLOUD_BASE: &str = "low_cloud_base";
    pub const RAIN_RATE: &str = "rain_rate";
    pub const CIRA_IR_DEFAULT: &str = "circa_ir_default";
    pub const FOG: &str = "fog";
    pub const IR_WV: &str = "ir_wv";
    pub const SKIN_TEMP_DEFAULT: &str = "skin_temp_default";
    pub const LINEAR: &str = "linear";
    pub const ZA_VIS_DEFAULT: &str = "za_vis_default";
    pub const GRAY_SCALE_WATER_VAPOR: &str = "gray_scale_water_vapor";
    pub const RAMSDIS_WV: &str = "ramsdis_wv";

    /// All built-in colormap names.
    pub const ALL: &[&str] = &[
        CLOUD_AMOUNT_DEFAULT,
        CLOUD_TOP_HEIGHT,
        LOW_CLOUD_BASE,
        RAIN_RATE,
        CIRA_IR_DEFAULT,
        FOG,
        IR_WV,
        SKIN_TEMP_DEFAULT,
        LINEAR,
        ZA_VIS_DEFAULT,
        GRAY_SCALE_WATER_VAPOR,
        RAMSDIS_WV,
    ];
}

/// Reference to a colormap by built-in name or user-defined identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ColormapRef {
    Named(String),
    Custom(Uuid),
}

impl ColormapRef {
    pub fn named(name: impl Into<String>) -> Self {
        ColormapRef::Named(name.into())
    }

    /// True when this refers to one of the built-in colormaps.
    pub fn is_builtin(&self) -> bool {
        match self {
            ColormapRef::Named(name) => names::ALL.contains(&name.as_str()),
            ColormapRef::Custom(_) => false,
        }
    }
}

impl From<&str> for ColormapRef {
    fn from(name: &str) -> Self {
        ColormapRef::Named(name.to_string())
    }
}

impl From<Uuid> for ColormapRef {
    fn from(id: Uuid) -> Self {
        ColormapRef::Custom(id)
    }
}

impl std::fmt::Display for ColormapRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColormapRef::Named(name) => write!(f, "{}", name),
            ColormapRef::Custom(id) => write!(f, "custom:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(ColormapRef::from(names::FOG).is_builtin());
        assert!(!ColormapRef::named("mystery").is_builtin());
        assert!(!ColormapRef::Custom(Uuid::new_v4()).is_builtin());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&ColormapRef::named("linear")).unwrap();
        assert_eq!(json, r#"{"type":"named","value":"linear"}"#);
    }
}
