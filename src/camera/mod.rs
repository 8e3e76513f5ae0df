//! Camera capture module for webcam access and frame capture.
//!
//! - Device enumeration via [`list_video_devices`]
//! - Live capture via [`CameraTrack`], a [`MediaTrack`](crate::stream::MediaTrack)
//!   publishing RGBA frames into a [`FrameSlot`](crate::frame::FrameSlot)
//! - Configuration via [`CameraSettings`] and [`Resolution`]

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod types;

pub use capture::CameraTrack;
pub use device::{id_to_index, index_to_id, list_video_devices};
pub use frame_utils::mirror_horizontal;
pub use types::{CameraError, CameraSettings, Resolution};
