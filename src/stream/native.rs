//! Media backend over the host's cameras (nokhwa) and audio devices (cpal).

use super::backend::{DeviceAcquisitionError, DeviceScan, MediaBackend, StreamConstraints};
use super::session::{CaptureSession, MediaTrack};
use crate::audio::{list_audio_devices, AudioError, AudioInputTrack, OutputRouter, RouteError};
use crate::camera::{list_video_devices, CameraError, CameraSettings, CameraTrack};
use crate::devices::DeviceKind;
use crate::frame::FrameSlot;

#[derive(Debug, Default)]
pub struct NativeBackend {
    router: OutputRouter,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaBackend for NativeBackend {
    fn enumerate_devices(&self) -> Result<DeviceScan, DeviceAcquisitionError> {
        let video = list_video_devices();
        let audio = list_audio_devices();

        match (video, audio) {
            (Ok(mut v), Ok(a)) => {
                v.extend(a);
                Ok(v.into())
            }
            (Ok(v), Err(e)) => {
                log::warn!("{}", e);
                Ok(DeviceScan {
                    devices: v,
                    unavailable: vec![DeviceKind::AudioInput, DeviceKind::AudioOutput],
                })
            }
            (Err(e), Ok(a)) => {
                log::warn!("{}", e);
                Ok(DeviceScan {
                    devices: a,
                    unavailable: vec![DeviceKind::VideoInput],
                })
            }
            (Err(ve), Err(ae)) => Err(DeviceAcquisitionError::Backend(format!("{}; {}", ve, ae))),
        }
    }

    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<CaptureSession, DeviceAcquisitionError> {
        let slot = FrameSlot::new();
        let settings = CameraSettings {
            device_id: constraints.video_device.clone(),
            resolution: constraints.resolution,
            fps: constraints.fps,
            mirror: constraints.mirror,
            strict_resolution: constraints.strict_resolution,
        };

        let camera = CameraTrack::start(settings, slot.clone())
            .map_err(|e| camera_error(e, constraints.video_device.as_deref()))?;
        let mut tracks: Vec<Box<dyn MediaTrack>> = vec![Box::new(camera)];

        // A failed microphone drops (and so stops) the camera opened above
        match AudioInputTrack::open(constraints.audio_device.as_deref()) {
            Ok(Some(mic)) => tracks.push(Box::new(mic)),
            Ok(None) => log::debug!("No microphone available; session is video only"),
            Err(AudioError::QueryFailed(e)) if constraints.audio_device.is_none() => {
                log::warn!("Skipping microphone: {}", e);
            }
            Err(e) => return Err(audio_error(e)),
        }

        Ok(CaptureSession::new(tracks, slot))
    }

    fn supports_output_selection(&self) -> bool {
        self.router.supports_output_selection()
    }

    fn route_output(&self, device_id: &str) -> Result<(), RouteError> {
        self.router.set_output(device_id)
    }
}

fn camera_error(e: CameraError, requested: Option<&str>) -> DeviceAcquisitionError {
    match e {
        CameraError::PermissionDenied => DeviceAcquisitionError::NotAllowed {
            kind: DeviceKind::VideoInput,
        },
        CameraError::DeviceNotFound(id) => DeviceAcquisitionError::NotFound {
            kind: DeviceKind::VideoInput,
            device_id: Some(id),
        },
        CameraError::NoDevices => DeviceAcquisitionError::NotFound {
            kind: DeviceKind::VideoInput,
            device_id: requested.map(str::to_string),
        },
        CameraError::UnsupportedResolution { requested, actual } => {
            DeviceAcquisitionError::Overconstrained {
                constraint: "resolution".to_string(),
                reason: format!("requested {}, camera offers {}", requested, actual),
            }
        }
        other => DeviceAcquisitionError::Backend(other.to_string()),
    }
}

fn audio_error(e: AudioError) -> DeviceAcquisitionError {
    match e {
        AudioError::DeviceNotFound(id) => DeviceAcquisitionError::NotFound {
            kind: DeviceKind::AudioInput,
            device_id: Some(id),
        },
        other => DeviceAcquisitionError::Backend(other.to_string()),
    }
}
