//! Camera types and data structures.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Square 640x640, the size requested from every camera by default
    pub const SQUARE: Resolution = Resolution {
        width: 640,
        height: 640,
    };

    /// Largest resolution accepted on the command line or in config
    pub const MAX: Resolution = Resolution {
        width: 7680,
        height: 4320,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| {
            format!(
                "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 640x640)",
                s
            )
        })?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("Invalid width '{}' in resolution", w))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("Invalid height '{}' in resolution", h))?;
        if width == 0 || height == 0 {
            return Err("Resolution width and height must be greater than 0".to_string());
        }
        if width > Self::MAX.width || height > Self::MAX.height {
            return Err(format!("Resolution exceeds maximum supported ({})", Self::MAX));
        }
        Ok(Resolution { width, height })
    }
}

/// Settings for opening one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    /// Device id as listed by enumeration; `None` opens the first camera
    pub device_id: Option<String>,
    /// Requested capture resolution
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
    /// Fail instead of falling back when the exact resolution is unavailable
    pub strict_resolution: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_id: None,
            resolution: Resolution::default(),
            fps: 30,
            mirror: false,
            strict_resolution: false,
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("No cameras found")]
    NoDevices,

    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),

    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    #[error(
        "Camera permission denied. On macOS, grant access in System Settings > Privacy & Security > Camera"
    )]
    PermissionDenied,

    #[error("Camera device '{0}' not found. Run 'list-devices --video' to see available devices")]
    DeviceNotFound(String),

    #[error("Camera cannot deliver {requested} (closest available: {actual})")]
    UnsupportedResolution {
        requested: Resolution,
        actual: Resolution,
    },

    #[error("Failed to start camera stream: {0}")]
    StreamFailed(String),

    #[error("Capture thread is already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_default_is_square() {
        let res = Resolution::default();
        assert_eq!(res, Resolution::new(640, 640));
        assert_eq!(res.to_string(), "640x640");
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("1280x720".parse(), Ok(Resolution::new(1280, 720)));
        assert_eq!("320X240".parse(), Ok(Resolution::new(320, 240)));
    }

    #[test]
    fn test_resolution_parse_errors() {
        assert!("1280".parse::<Resolution>().is_err());
        assert!("0x720".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
        assert!("8000x100".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_camera_settings_default() {
        let settings = CameraSettings::default();
        assert_eq!(settings.device_id, None);
        assert_eq!(settings.resolution, Resolution::SQUARE);
        assert_eq!(settings.fps, 30);
        assert!(!settings.mirror);
        assert!(!settings.strict_resolution);
    }

    #[test]
    fn test_camera_error_display() {
        assert_eq!(CameraError::NoDevices.to_string(), "No cameras found");
        assert_eq!(
            CameraError::OpenFailed("test".to_string()).to_string(),
            "Failed to open camera: test"
        );
        assert!(CameraError::PermissionDenied
            .to_string()
            .contains("permission denied"));
        assert!(CameraError::DeviceNotFound("5".to_string())
            .to_string()
            .contains("'5'"));
        let err = CameraError::UnsupportedResolution {
            requested: Resolution::SQUARE,
            actual: Resolution::new(640, 480),
        };
        assert_eq!(
            err.to_string(),
            "Camera cannot deliver 640x640 (closest available: 640x480)"
        );
    }
}
