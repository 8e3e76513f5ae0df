//! Configuration file handling for pixelcam.
//!
//! Loads configuration from `<config dir>/pixelcam/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::camera::Resolution;
use crate::pixelate::BlockSize;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub pixelate: PixelateConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Device id from `list-devices --video`; default camera when unset
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default = "default_camera_fps")]
    pub fps: u32,
    #[serde(default)]
    pub mirror: bool,
    #[serde(default)]
    pub strict_resolution: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            resolution: default_resolution(),
            fps: default_camera_fps(),
            mirror: false,
            strict_resolution: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PixelateConfig {
    #[serde(default = "default_block_size")]
    pub block_size: u32,
}

impl Default for PixelateConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Ticks per second; 0 renders as fast as possible
    #[serde(default)]
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub status_bar: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { status_bar: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_resolution() -> String {
    Resolution::default().to_string()
}

fn default_camera_fps() -> u32 {
    30
}

fn default_block_size() -> u32 {
    BlockSize::DEFAULT.get()
}

/// Upper bound for `render.fps` and `camera.fps`.
pub const MAX_FPS: u32 = 120;

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            log::debug!("No config file at {}; using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        let config = Config::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.resolution()?;
        self.block_size()?;
        if self.render.fps > MAX_FPS {
            return Err(ConfigError::Invalid {
                key: "render.fps",
                reason: format!("must be between 0 and {}, got {}", MAX_FPS, self.render.fps),
            });
        }
        if self.camera.fps == 0 || self.camera.fps > MAX_FPS {
            return Err(ConfigError::Invalid {
                key: "camera.fps",
                reason: format!("must be between 1 and {}, got {}", MAX_FPS, self.camera.fps),
            });
        }
        Ok(())
    }

    pub fn resolution(&self) -> Result<Resolution, ConfigError> {
        self.camera
            .resolution
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                key: "camera.resolution",
                reason,
            })
    }

    pub fn block_size(&self) -> Result<BlockSize, ConfigError> {
        BlockSize::new(self.pixelate.block_size).map_err(|e| ConfigError::Invalid {
            key: "pixelate.block_size",
            reason: e.to_string(),
        })
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pixelcam").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/pixelcam/config.toml")
        })
}

/// Commented default configuration written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# pixelcam configuration

[camera]
# Camera device id (see `pixelcam list-devices --video`); default camera when unset
# device = "0"
# Requested capture resolution
resolution = "640x640"
# Requested capture frame rate
fps = 30
# Mirror horizontally (selfie mode)
mirror = false
# Fail instead of accepting the closest resolution the camera offers
strict_resolution = false

[pixelate]
# Edge length of each square block in pixels (1-256)
block_size = 8

[render]
# Preview updates per second; 0 renders as fast as possible
fps = 0

[audio]
# Microphone and speaker names (see `pixelcam list-devices --audio`)
# input = "Built-in Microphone"
# output = "Built-in Output"

[ui]
# Show status bar
status_bar = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pixelate.block_size, 8);
        assert_eq!(config.render.fps, 0);
        assert_eq!(config.camera.resolution, "640x640");
        assert!(config.ui.status_bar);
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pixelate]\nblock_size = 16\n\n[camera]\ndevice = \"1\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.pixelate.block_size, 16);
        assert_eq!(config.camera.device.as_deref(), Some("1"));
        assert_eq!(config.camera.fps, 30);
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pixelate\nblock_size = ").unwrap();

        match Config::load(Some(file.path())) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key_is_error() {
        assert!(matches!(
            Config::from_toml("[camera]\nzoom = 2\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_toml("[pixelate]\nblock_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("pixelate.block_size"));

        let err = Config::from_toml("[camera]\nresolution = \"wide\"\n").unwrap_err();
        assert!(err.to_string().contains("camera.resolution"));

        let err = Config::from_toml("[render]\nfps = 500\n").unwrap_err();
        assert!(err.to_string().contains("render.fps"));
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config = Config::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_to_toml_reloads() {
        let mut config = Config::default();
        config.audio.output = Some("HDMI".to_string());
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("pixelcam/config.toml"));
    }
}
