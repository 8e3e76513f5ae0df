//! Background capture thread implementation.

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::{Camera, NokhwaError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::device::{id_to_index, index_to_id};
use super::frame_utils::{convert_to_rgba, mirror_horizontal};
use super::types::{CameraError, CameraSettings, Resolution};
use crate::frame::FrameSlot;

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    Stop,
}

/// Native formats tried in order: NV12 (macOS), MJPEG (most USB cameras), YUYV.
const NATIVE_FORMATS: [NokhwaFrameFormat; 3] = [
    NokhwaFrameFormat::NV12,
    NokhwaFrameFormat::MJPEG,
    NokhwaFrameFormat::YUYV,
];

/// Run the capture loop in a background thread.
///
/// Reports the negotiated resolution and frame rate (or the open error) on
/// `info_tx` exactly once, then publishes decoded frames into `slot` until
/// stopped.
pub fn run_capture_loop(
    settings: CameraSettings,
    slot: FrameSlot,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = settings
        .device_id
        .as_deref()
        .map(id_to_index)
        .unwrap_or(CameraIndex::Index(0));

    let mut camera = match open_camera(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(classify_open_error(e)));
        return;
    }

    let res = camera.resolution();
    let actual_res = Resolution::new(res.width(), res.height());
    let actual_fps = camera.frame_rate();
    let _ = info_tx.send(Ok((actual_res, actual_fps)));

    let mut failures = 0u64;
    while !stop.load(Ordering::Relaxed) {
        if let Ok(CaptureCommand::Stop) = rx.try_recv() {
            break;
        }

        match camera.frame() {
            Ok(raw_frame) => {
                if let Some(mut frame) = convert_to_rgba(&raw_frame) {
                    if settings.mirror {
                        mirror_horizontal(&mut frame);
                    }
                    slot.publish(frame);
                }
                // Undecodable frames are skipped
            }
            Err(e) => {
                failures += 1;
                if failures == 1 {
                    log::warn!("Camera frame read failed: {}", e);
                }
            }
        }

        thread::sleep(Duration::from_millis(1));
    }

    if let Err(e) = camera.stop_stream() {
        log::debug!("Error stopping camera stream: {}", e);
    }
    log::debug!("Capture thread for camera {} exited", index_to_id(&index));
}

/// Open a camera, preferring the exact requested format.
///
/// Without `strict_resolution` the closest supported format is accepted when
/// no exact one exists. With it, a camera that cannot deliver the requested
/// resolution is an error.
fn open_camera(index: &CameraIndex, settings: &CameraSettings) -> Result<Camera, CameraError> {
    let requested = settings.resolution;

    let exact = NATIVE_FORMATS.iter().map(|&fourcc| {
        RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Exact(camera_format(
            settings, fourcc,
        )))
    });
    match try_formats(index, exact) {
        Ok(cam) => return Ok(cam),
        Err(e) if is_permission_error(&e) => return Err(CameraError::PermissionDenied),
        Err(e) => log::debug!(
            "No exact {} format on camera {}: {}",
            requested,
            index_to_id(index),
            e
        ),
    }

    let closest = NATIVE_FORMATS
        .iter()
        .map(|&fourcc| {
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Closest(camera_format(
                settings, fourcc,
            )))
        })
        .chain(std::iter::once(RequestedFormat::new::<RgbAFormat>(
            RequestedFormatType::AbsoluteHighestResolution,
        )));
    let camera = try_formats(index, closest).map_err(classify_open_error)?;

    let res = camera.resolution();
    let actual = Resolution::new(res.width(), res.height());
    if actual != requested {
        if settings.strict_resolution {
            return Err(CameraError::UnsupportedResolution { requested, actual });
        }
        log::info!(
            "Camera {} delivers {} instead of requested {}",
            index_to_id(index),
            actual,
            requested
        );
    }
    Ok(camera)
}

fn camera_format(settings: &CameraSettings, fourcc: NokhwaFrameFormat) -> CameraFormat {
    CameraFormat::new(
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
        fourcc,
        settings.fps,
    )
}

fn try_formats(
    index: &CameraIndex,
    formats: impl IntoIterator<Item = RequestedFormat<'static>>,
) -> Result<Camera, NokhwaError> {
    let mut last_error = None;
    for requested in formats {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error
        .unwrap_or_else(|| NokhwaError::GeneralError("no formats to try".to_string())))
}

fn is_permission_error(e: &NokhwaError) -> bool {
    let msg = e.to_string().to_lowercase();
    msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("not authorized")
}

fn classify_open_error(e: NokhwaError) -> CameraError {
    if is_permission_error(&e) {
        CameraError::PermissionDenied
    } else {
        CameraError::OpenFailed(e.to_string())
    }
}
