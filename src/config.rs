use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::{OutputFormat, Quality};

/// Startup configuration, read once from an optional JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial window size in points.
    pub window_size: [f32; 2],
    /// Smallest zoom factor (0.1 = 10 %).
    pub min_zoom: f32,
    /// Largest zoom factor (3.0 = 300 %).
    pub max_zoom: f32,
    /// Zoom change per button press.
    pub zoom_step: f32,
    /// Output format used until the user picks one.
    pub default_format: OutputFormat,
    /// Encoder quality used until the user picks one.
    pub default_quality: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: [960.0, 720.0],
            min_zoom: 0.1,
            max_zoom: 3.0,
            zoom_step: 0.1,
            default_format: OutputFormat::Jpeg,
            default_quality: Quality::DEFAULT.get(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_zoom > 0.0) {
            return Err(Error::Config(format!(
                "min_zoom must be positive, got {}",
                self.min_zoom
            )));
        }
        if self.max_zoom < self.min_zoom {
            return Err(Error::Config(format!(
                "max_zoom ({}) is below min_zoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }
        if !(self.zoom_step > 0.0) {
            return Err(Error::Config(format!(
                "zoom_step must be positive, got {}",
                self.zoom_step
            )));
        }
        if !(Quality::MIN..=Quality::MAX).contains(&self.default_quality) {
            return Err(Error::Config(format!(
                "default_quality must be within {}..={}, got {}",
                Quality::MIN,
                Quality::MAX,
                self.default_quality
            )));
        }
        if self.window_size.iter().any(|v| !(*v > 0.0)) {
            return Err(Error::Config("window_size must be positive".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_zoom, 0.1);
        assert_eq!(config.max_zoom, 3.0);
        assert_eq!(config.default_format, OutputFormat::Jpeg);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "max_zoom": 5.0, "default_format": "png" }"#).unwrap();
        assert_eq!(config.max_zoom, 5.0);
        assert_eq!(config.min_zoom, 0.1);
        assert_eq!(config.default_format, OutputFormat::Png);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let inverted = AppConfig {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::Config(_))));

        let no_step = AppConfig {
            zoom_step: 0.0,
            ..Default::default()
        };
        assert!(no_step.validate().is_err());

        let loud = AppConfig {
            default_quality: 1.5,
            ..Default::default()
        };
        assert!(loud.validate().is_err());

        let nan = AppConfig {
            min_zoom: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let path = std::env::temp_dir().join(format!(
            "image-trimmer-bad-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        match err {
            Error::ConfigParse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/image-trimmer.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
