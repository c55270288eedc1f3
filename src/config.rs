use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "CONVNET_VISUALIZER_CONFIG";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub layout: LayoutSettings,
    pub style: StyleSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 900.0,
            title: "ConvNet Visualizer".to_string(),
        }
    }
}

/// Which shape axis the multiplier is fitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleAxis {
    #[default]
    Width,
    Height,
    Depth,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Smallest block's extent along `scale_axis`, as a fraction of the display width.
    pub min_block_fraction: f32,
    pub scale_axis: ScaleAxis,
    /// Vertical room reserved per block for arrows and labels.
    pub block_spacing: f32,
    pub base_margin: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_block_fraction: 0.05,
            scale_axis: ScaleAxis::Width,
            block_spacing: 300.0,
            base_margin: 300.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub font_size: f32,
    pub arrow_length: f32,
    pub arrow_head: f32,
    /// Edge length, in shape units, of the cube drawn for unknown shapes.
    pub placeholder_size: f32,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            arrow_length: 50.0,
            arrow_head: 7.0,
            placeholder_size: 10.0,
        }
    }
}

impl Settings {
    /// Loads settings from `$CONVNET_VISUALIZER_CONFIG`, or defaults when it is unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_file(PathBuf::from(raw)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(source) => Err(ConfigError::Env {
                var: CONFIG_ENV,
                source,
            }),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&text).map_err(|err| match err {
            ConfigError::Json { source, .. } => ConfigError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: PathBuf::new(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("window.width", self.window.width),
            ("window.height", self.window.height),
            ("layout.min_block_fraction", self.layout.min_block_fraction),
            ("style.font_size", self.style.font_size),
            ("style.arrow_length", self.style.arrow_length),
            ("style.arrow_head", self.style.arrow_head),
            ("style.placeholder_size", self.style.placeholder_size),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("expected a positive number, got {}", value),
                });
            }
        }

        let non_negative = [
            ("layout.block_spacing", self.layout.block_spacing),
            ("layout.base_margin", self.layout.base_margin),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("expected a non-negative number, got {}", value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.layout.scale_axis, ScaleAxis::Width);
        assert_eq!(settings.layout.min_block_fraction, 0.05);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{"layout": {"scale_axis": "depth", "block_spacing": 120}}"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.layout.scale_axis, ScaleAxis::Depth);
        assert_eq!(settings.layout.block_spacing, 120.0);
        assert_eq!(settings.layout.base_margin, 300.0);
        assert_eq!(settings.style.font_size, 16.0);
    }

    #[test]
    fn rejects_non_positive_fraction() {
        let err = Settings::from_json(r#"{"layout": {"min_block_fraction": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "layout.min_block_fraction", .. }));
    }

    #[test]
    fn reports_missing_file() {
        let err = Settings::from_file("/nonexistent/convnet-visualizer.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
