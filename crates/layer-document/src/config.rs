//! Document configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use sift_common::{DocumentError, DocumentResult};

use crate::presentation::Mixing;

/// Layer sets allocated when a document is created.
pub const DEFAULT_LAYER_SET_COUNT: usize = 1;

/// Upper bound on layer sets, matching the four map panes of the viewer.
pub const DEFAULT_MAX_LAYER_SETS: usize = 4;

/// Configuration for a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Layer set slots allocated up front; only the first is initialised
    pub layer_set_count: usize,

    /// Maximum number of layer set slots
    pub max_layer_sets: usize,

    /// Mixing mode of new presentation entries
    pub default_mixing: Mixing,

    /// Row at which new layers are inserted (0 = top)
    pub insert_before: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            layer_set_count: DEFAULT_LAYER_SET_COUNT,
            max_layer_sets: DEFAULT_MAX_LAYER_SETS,
            default_mixing: Mixing::Normal,
            insert_before: 0,
        }
    }
}

impl DocumentConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> DocumentResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DocumentError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> DocumentResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| DocumentError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SIFT_LAYER_SET_COUNT") {
            if let Ok(count) = val.parse() {
                config.layer_set_count = count;
            }
        }

        if let Ok(val) = std::env::var("SIFT_MAX_LAYER_SETS") {
            if let Ok(max) = val.parse() {
                config.max_layer_sets = max;
            }
        }

        if let Ok(val) = std::env::var("SIFT_DEFAULT_MIXING") {
            config.default_mixing = match val.to_lowercase().as_str() {
                "additive" => Mixing::Additive,
                _ => Mixing::Normal,
            };
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> DocumentResult<()> {
        if self.layer_set_count == 0 {
            return Err(DocumentError::InvalidConfig(
                "layer_set_count must be > 0".to_string(),
            ));
        }

        if self.max_layer_sets < self.layer_set_count {
            return Err(DocumentError::InvalidConfig(format!(
                "max_layer_sets ({}) must be >= layer_set_count ({})",
                self.max_layer_sets, self.layer_set_count
            )));
        }

        Ok(())
    }
}
