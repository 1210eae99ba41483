use serde::{Deserialize, Serialize};

use crate::aspect::CustomRatio;
use crate::config::AppConfig;
use crate::export::{OutputFormat, Quality};

/// User choices that survive a restart, stored through eframe's storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)] // fields added later get their default when reading old state
pub struct Preferences {
    pub custom_width: String,
    pub custom_height: String,
    pub output_format: OutputFormat,
    pub quality: Quality,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl Preferences {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            custom_width: String::new(),
            custom_height: String::new(),
            output_format: config.default_format,
            quality: Quality::new(config.default_quality),
        }
    }

    /// Load saved preferences, falling back to the configured defaults.
    pub fn load(storage: Option<&dyn eframe::Storage>, config: &AppConfig) -> Self {
        storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_else(|| Self::from_config(config))
    }

    pub fn store(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    pub fn custom_ratio(&self) -> CustomRatio {
        CustomRatio::new(self.custom_width.clone(), self.custom_height.clone())
    }
}
