//! Camera video track.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand};
use super::device::list_video_devices;
use super::types::{CameraError, CameraSettings, Resolution};
use crate::devices::DeviceKind;
use crate::frame::FrameSlot;
use crate::stream::MediaTrack;

/// A live camera feeding a [`FrameSlot`] from a background thread.
///
/// The camera is opened inside the thread; `start` blocks until the thread
/// reports the negotiated format or an error, so a returned track is always
/// live. Stopping is idempotent and also happens on drop.
pub struct CameraTrack {
    /// Device id this track was opened with
    id: String,
    /// Latest captured frame (shared with capture thread)
    slot: FrameSlot,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    settings: CameraSettings,
    actual_resolution: Resolution,
    actual_fps: u32,
}

impl std::fmt::Debug for CameraTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraTrack")
            .field("id", &self.id)
            .field("resolution", &self.actual_resolution)
            .field("is_live", &self.is_live())
            .finish_non_exhaustive()
    }
}

impl CameraTrack {
    /// Open the camera named by `settings` and start publishing into `slot`.
    ///
    /// Blocks while the platform opens the device; call from a blocking
    /// context.
    ///
    /// # Errors
    /// * `CameraError::NoDevices` - no camera attached and none requested
    /// * `CameraError::DeviceNotFound` - the requested id is not attached
    /// * `CameraError::PermissionDenied` - camera access is denied
    /// * `CameraError::UnsupportedResolution` - strict resolution not available
    /// * `CameraError::OpenFailed` / `StreamFailed` - other platform failures
    pub fn start(mut settings: CameraSettings, slot: FrameSlot) -> Result<Self, CameraError> {
        let devices = list_video_devices()?;
        let id = match settings.device_id.as_deref() {
            Some(id) if devices.iter().any(|d| d.device_id == id) => id.to_string(),
            Some(id) => return Err(CameraError::DeviceNotFound(id.to_string())),
            None => devices
                .first()
                .map(|d| d.device_id.clone())
                .ok_or(CameraError::NoDevices)?,
        };
        settings.device_id = Some(id.clone());

        let stop_signal = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        let thread_slot = slot.clone();
        let stop = Arc::clone(&stop_signal);
        let thread_settings = settings.clone();
        let handle = std::thread::Builder::new()
            .name(format!("camera-{}", id))
            .spawn(move || run_capture_loop(thread_settings, thread_slot, stop, rx, info_tx))
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                log::info!("Camera {} streaming at {} @ {} fps", id, res, fps);
                Ok(Self {
                    id,
                    slot,
                    capture_thread: Some(handle),
                    command_tx: Some(tx),
                    stop_signal,
                    settings,
                    actual_resolution: res,
                    actual_fps: fps,
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution the camera negotiated, which may differ from the request.
    pub fn actual_resolution(&self) -> Resolution {
        self.actual_resolution
    }

    pub fn actual_fps(&self) -> u32 {
        self.actual_fps
    }

    /// Slot this track publishes into.
    pub fn frames(&self) -> &FrameSlot {
        &self.slot
    }
}

impl MediaTrack for CameraTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::VideoInput
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }

        if let Some(handle) = self.capture_thread.take() {
            if handle.join().is_err() {
                log::error!("Capture thread for camera {} panicked", self.id);
            }
            log::debug!("Camera {} stopped", self.id);
        }
    }

    fn is_live(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
