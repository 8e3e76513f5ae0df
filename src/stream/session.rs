//! Capture sessions and the tracks they own.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::devices::DeviceKind;
use crate::frame::FrameSlot;
use crate::render_loop::FrameSource;

/// One live media track of a session (a camera, a microphone).
pub trait MediaTrack: Send + Sync {
    /// Device id the track was opened with.
    fn id(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    /// Release the device. Must be safe to call more than once.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// An acquired media stream: its tracks plus the slot the video track
/// publishes frames into.
///
/// Stopping stops every track exactly once and clears the frame slot, so
/// readers holding the slot see "no frame" rather than a stale picture from
/// a released camera. Dropping a session stops it.
pub struct CaptureSession {
    id: u64,
    tracks: Vec<Box<dyn MediaTrack>>,
    frames: FrameSlot,
    stopped: bool,
}

impl CaptureSession {
    pub fn new(tracks: Vec<Box<dyn MediaTrack>>, frames: FrameSlot) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            tracks,
            frames,
            stopped: false,
        }
    }

    /// Process-unique id, increasing with each acquisition.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Latest-frame slot of this session.
    pub fn frames(&self) -> &FrameSlot {
        &self.frames
    }

    /// The session's frames as a render loop source.
    pub fn frame_source(&self) -> Arc<dyn FrameSource> {
        Arc::new(self.frames.clone())
    }

    /// Device id of the first track of `kind`.
    pub fn track_id(&self, kind: DeviceKind) -> Option<&str> {
        self.tracks
            .iter()
            .find(|t| t.kind() == kind)
            .map(|t| t.id())
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether any track is still delivering.
    pub fn is_live(&self) -> bool {
        !self.stopped && self.tracks.iter().any(|t| t.is_live())
    }

    /// Stop all tracks. Later calls do nothing.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        for track in &mut self.tracks {
            track.stop();
        }
        self.frames.clear();
        log::debug!("Session {} stopped ({} track(s))", self.id, self.tracks.len());
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracks: Vec<String> = self
            .tracks
            .iter()
            .map(|t| format!("{}:{}", t.kind(), t.id()))
            .collect();
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("tracks", &tracks)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
