//! Audio device access through cpal.
//!
//! Audio is never captured or played here: input selection only records the
//! chosen microphone on the session, and output selection designates the
//! playback device.

mod device;
mod router;

pub use device::{list_audio_devices, AudioError, AudioInputTrack};
pub use router::{OutputRouter, RouteError};
