//! Configuration for feature export.

use serde::{Deserialize, Serialize};

/// Configuration for rendering fields as feature collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Grid cells whose mask value is below this threshold are left out.
    pub mask_threshold: f64,

    /// Property name for the sampled value when no property names are given.
    pub value_property: String,

    /// Property name for the feature id.
    pub id_property: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mask_threshold: 0.5,
            value_property: "value".to_string(),
            id_property: "id".to_string(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CDM_MASK_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.mask_threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("CDM_VALUE_PROPERTY") {
            config.value_property = val;
        }

        if let Ok(val) = std::env::var("CDM_ID_PROPERTY") {
            config.id_property = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.mask_threshold.is_finite() {
            return Err("mask_threshold must be finite".to_string());
        }

        if self.value_property.is_empty() {
            return Err("value_property must not be empty".to_string());
        }

        if self.id_property.is_empty() {
            return Err("id_property must not be empty".to_string());
        }

        if self.value_property == self.id_property {
            return Err("value_property and id_property must differ".to_string());
        }

        Ok(())
    }
}
