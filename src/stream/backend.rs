//! The seam between stream management and platform media APIs.

use thiserror::Error;

use super::session::CaptureSession;
use crate::audio::RouteError;
use crate::camera::Resolution;
use crate::devices::{DeviceInfo, DeviceKind, Selection};

/// What to ask the platform for when acquiring a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Camera id; `None` takes the default camera
    pub video_device: Option<String>,
    /// Microphone id; `None` takes the default microphone, if any
    pub audio_device: Option<String>,
    pub resolution: Resolution,
    pub fps: u32,
    pub mirror: bool,
    /// Treat the resolution as an exact requirement
    pub strict_resolution: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            video_device: None,
            audio_device: None,
            resolution: Resolution::default(),
            fps: 30,
            mirror: false,
            strict_resolution: false,
        }
    }
}

impl StreamConstraints {
    /// These constraints with devices taken from `selection`.
    pub fn for_selection(&self, selection: &Selection) -> StreamConstraints {
        StreamConstraints {
            video_device: selection.video_input.clone(),
            audio_device: selection.audio_input.clone(),
            ..self.clone()
        }
    }
}

/// Why a stream could not be acquired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceAcquisitionError {
    #[error("permission to use the {} was denied", .kind.noun())]
    NotAllowed { kind: DeviceKind },

    #[error("{} '{}' not found", .kind.noun(), .device_id.as_deref().unwrap_or("default"))]
    NotFound {
        kind: DeviceKind,
        /// `None` when no device of this kind exists at all
        device_id: Option<String>,
    },

    #[error("constraint '{constraint}' cannot be satisfied: {reason}")]
    Overconstrained { constraint: String, reason: String },

    #[error("media backend error: {0}")]
    Backend(String),
}

/// Result of a device enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceScan {
    pub devices: Vec<DeviceInfo>,
    /// Kinds whose query failed; `devices` holds none of them
    pub unavailable: Vec<DeviceKind>,
}

impl From<Vec<DeviceInfo>> for DeviceScan {
    fn from(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            unavailable: Vec::new(),
        }
    }
}

/// Platform media access: device enumeration, stream acquisition and
/// playback routing.
///
/// Methods block on platform calls; async callers run them on the blocking
/// pool.
pub trait MediaBackend: Send + Sync + 'static {
    /// All currently attached devices. Labels may be empty.
    ///
    /// A query that fails for some kinds only is reported through
    /// [`DeviceScan::unavailable`]; `Err` means nothing could be listed.
    fn enumerate_devices(&self) -> Result<DeviceScan, DeviceAcquisitionError>;

    /// Open the devices named by `constraints` as one live session.
    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<CaptureSession, DeviceAcquisitionError>;

    /// Whether playback can be pointed at a specific output device.
    fn supports_output_selection(&self) -> bool {
        false
    }

    /// Route playback to `device_id`.
    fn route_output(&self, device_id: &str) -> Result<(), RouteError> {
        let _ = device_id;
        Err(RouteError::Unsupported)
    }
}
