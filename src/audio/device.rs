//! Audio device enumeration and the microphone track.

use cpal::traits::{DeviceTrait, HostTrait};
use thiserror::Error;

use crate::devices::{DeviceInfo, DeviceKind};
use crate::stream::MediaTrack;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to query audio devices: {0}")]
    QueryFailed(String),

    #[error("Audio device '{0}' not found. Run 'list-devices --audio' to see available devices")]
    DeviceNotFound(String),
}

/// List microphones and speakers of the default host.
///
/// cpal has no stable device ids, so the device name doubles as the id.
/// Devices whose name cannot be read get an empty label and a positional id.
pub fn list_audio_devices() -> Result<Vec<DeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let inputs = host
        .input_devices()
        .map_err(|e| AudioError::QueryFailed(e.to_string()))?;
    collect(&mut devices, inputs, DeviceKind::AudioInput);

    let outputs = host
        .output_devices()
        .map_err(|e| AudioError::QueryFailed(e.to_string()))?;
    collect(&mut devices, outputs, DeviceKind::AudioOutput);

    Ok(devices)
}

fn collect(out: &mut Vec<DeviceInfo>, devices: impl Iterator<Item = cpal::Device>, kind: DeviceKind) {
    for (i, device) in devices.enumerate() {
        match device.name() {
            Ok(name) => out.push(DeviceInfo::new(name.clone(), kind, name)),
            Err(e) => {
                log::debug!("Unnamed {} #{}: {}", kind, i, e);
                out.push(DeviceInfo::new(format!("{}-{}", kind, i), kind, ""));
            }
        }
    }
}

/// Microphone attached to a capture session.
///
/// No samples are read; the track records which input the session was
/// acquired with.
#[derive(Debug)]
pub struct AudioInputTrack {
    id: String,
    live: bool,
}

impl AudioInputTrack {
    /// Attach the named microphone, or the host's default when `None`.
    ///
    /// Returns `Ok(None)` when no device is requested and the host has no
    /// microphone at all.
    pub fn open(device_id: Option<&str>) -> Result<Option<Self>, AudioError> {
        let host = cpal::default_host();
        let id = match device_id {
            Some(id) => {
                let found = host
                    .input_devices()
                    .map_err(|e| AudioError::QueryFailed(e.to_string()))?
                    .any(|d| d.name().ok().as_deref() == Some(id));
                if !found {
                    return Err(AudioError::DeviceNotFound(id.to_string()));
                }
                id.to_string()
            }
            None => match host.default_input_device() {
                Some(device) => device
                    .name()
                    .map_err(|e| AudioError::QueryFailed(e.to_string()))?,
                None => return Ok(None),
            },
        };
        log::debug!("Microphone {} attached", id);
        Ok(Some(Self::attached(id)))
    }

    /// A live track for an already-validated device id.
    pub fn attached(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            live: true,
        }
    }
}

impl MediaTrack for AudioInputTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::AudioInput
    }

    fn stop(&mut self) {
        if self.live {
            log::debug!("Microphone {} released", self.id);
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_track_stop_is_idempotent() {
        let mut track = AudioInputTrack::attached("Built-in Microphone");
        assert!(track.is_live());
        assert_eq!(track.kind(), DeviceKind::AudioInput);
        track.stop();
        track.stop();
        assert!(!track.is_live());
    }

    #[test]
    fn test_open_unknown_input_fails() {
        match AudioInputTrack::open(Some("no-such-microphone-999")) {
            Err(AudioError::DeviceNotFound(id)) => assert_eq!(id, "no-such-microphone-999"),
            // Hosts without an audio stack fail the query itself
            Err(AudioError::QueryFailed(_)) => {}
            Ok(_) => panic!("unknown microphone should not open"),
        }
    }
}
