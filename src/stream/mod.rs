//! Capture stream lifecycle.
//!
//! A [`StreamManager`] owns the single live [`CaptureSession`] and swaps it
//! when the user picks another device. Platform access sits behind
//! [`MediaBackend`]; [`NativeBackend`] is the real one.

mod backend;
mod controller;
#[cfg(test)]
pub(crate) mod fake;
mod manager;
mod native;
mod session;

pub use backend::{DeviceAcquisitionError, DeviceScan, MediaBackend, StreamConstraints};
pub use controller::{coalesce, spawn_controller, ControllerHandle, DeviceRequest};
pub use manager::{RouteOutcome, StreamError, StreamEvent, StreamManager};
pub use native::NativeBackend;
pub use session::{CaptureSession, MediaTrack};
