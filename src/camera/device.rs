//! Camera device enumeration.

use nokhwa::query;
use nokhwa::utils::{ApiBackend, CameraIndex};

use super::types::CameraError;
use crate::devices::{DeviceInfo, DeviceKind};

/// List all available cameras as video input devices.
///
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_video_devices() -> Result<Vec<DeviceInfo>, CameraError> {
    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| DeviceInfo::new(index_to_id(d.index()), DeviceKind::VideoInput, d.human_name()))
        .collect())
}

/// Device id string for a nokhwa camera index.
pub fn index_to_id(index: &CameraIndex) -> String {
    match index {
        CameraIndex::Index(i) => i.to_string(),
        CameraIndex::String(s) => s.clone(),
    }
}

/// Camera index for a device id produced by [`index_to_id`].
pub fn id_to_index(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(i) => CameraIndex::Index(i),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}
