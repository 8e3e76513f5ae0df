//! In-memory media backend for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{DeviceAcquisitionError, DeviceScan, MediaBackend, StreamConstraints};
use super::session::{CaptureSession, MediaTrack};
use crate::audio::RouteError;
use crate::devices::{DeviceInfo, DeviceKind};
use crate::frame::{Frame, FrameSlot, Rgba};

#[derive(Default)]
struct State {
    devices: Vec<DeviceInfo>,
    failures: HashMap<String, DeviceAcquisitionError>,
    /// Kinds whose enumeration fails
    failed_queries: HashSet<DeviceKind>,
    /// Constraints of every successful acquisition, in order
    acquired: Vec<StreamConstraints>,
    /// (acquisition number, track kind) for every track stop
    stops: Vec<(usize, DeviceKind)>,
    /// Cameras currently held by a live track
    open: HashSet<String>,
    output_supported: bool,
    broken_outputs: HashSet<String>,
    routed: Vec<String>,
}

/// Backend whose cameras, like real ones, cannot be opened twice.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn with_cameras(ids: &[&str]) -> Self {
        let backend = FakeBackend::default();
        {
            let mut state = backend.lock();
            for id in ids {
                state
                    .devices
                    .push(DeviceInfo::new(*id, DeviceKind::VideoInput, ""));
            }
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_device(&self, info: DeviceInfo) {
        self.lock().devices.push(info);
    }

    pub fn remove_device(&self, kind: DeviceKind, id: &str) {
        self.lock()
            .devices
            .retain(|d| !(d.kind == kind && d.device_id == id));
    }

    pub fn fail_device(&self, id: &str, error: DeviceAcquisitionError) {
        self.lock().failures.insert(id.to_string(), error);
    }

    pub fn fail_query(&self, kind: DeviceKind) {
        self.lock().failed_queries.insert(kind);
    }

    pub fn support_outputs(&self, broken: &[&str]) {
        let mut state = self.lock();
        state.output_supported = true;
        state.broken_outputs = broken.iter().map(|s| s.to_string()).collect();
    }

    pub fn acquired_cameras(&self) -> Vec<Option<String>> {
        self.lock()
            .acquired
            .iter()
            .map(|c| c.video_device.clone())
            .collect()
    }

    pub fn acquired(&self) -> Vec<StreamConstraints> {
        self.lock().acquired.clone()
    }

    /// Number of track stops of the `n`th acquisition (0-based).
    pub fn stops_of(&self, n: usize) -> usize {
        self.lock().stops.iter().filter(|(g, _)| *g == n).count()
    }

    pub fn open_cameras(&self) -> usize {
        self.lock().open.len()
    }

    pub fn routed(&self) -> Vec<String> {
        self.lock().routed.clone()
    }
}

struct FakeTrack {
    id: String,
    kind: DeviceKind,
    generation: usize,
    live: bool,
    state: Arc<Mutex<State>>,
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.stops.push((self.generation, self.kind));
        if self.live && self.kind == DeviceKind::VideoInput {
            state.open.remove(&self.id);
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl MediaBackend for FakeBackend {
    fn enumerate_devices(&self) -> Result<DeviceScan, DeviceAcquisitionError> {
        let state = self.lock();
        let failed = &state.failed_queries;
        Ok(DeviceScan {
            devices: state
                .devices
                .iter()
                .filter(|d| !failed.contains(&d.kind))
                .cloned()
                .collect(),
            unavailable: DeviceKind::ALL
                .into_iter()
                .filter(|k| failed.contains(k))
                .collect(),
        })
    }

    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<CaptureSession, DeviceAcquisitionError> {
        let mut state = self.lock();

        let camera = match &constraints.video_device {
            Some(id) => id.clone(),
            None => state
                .devices
                .iter()
                .find(|d| d.kind == DeviceKind::VideoInput)
                .map(|d| d.device_id.clone())
                .ok_or(DeviceAcquisitionError::NotFound {
                    kind: DeviceKind::VideoInput,
                    device_id: None,
                })?,
        };
        if let Some(error) = state.failures.get(&camera) {
            return Err(error.clone());
        }
        if !state
            .devices
            .iter()
            .any(|d| d.kind == DeviceKind::VideoInput && d.device_id == camera)
        {
            return Err(DeviceAcquisitionError::NotFound {
                kind: DeviceKind::VideoInput,
                device_id: Some(camera),
            });
        }
        if state.open.contains(&camera) {
            return Err(DeviceAcquisitionError::Backend(format!(
                "camera {} is busy",
                camera
            )));
        }
        if let Some(mic) = &constraints.audio_device {
            if let Some(error) = state.failures.get(mic) {
                return Err(error.clone());
            }
        }

        let generation = state.acquired.len();
        state.acquired.push(constraints.clone());
        state.open.insert(camera.clone());

        let mut tracks: Vec<Box<dyn MediaTrack>> = vec![Box::new(FakeTrack {
            id: camera,
            kind: DeviceKind::VideoInput,
            generation,
            live: true,
            state: Arc::clone(&self.state),
        })];
        if let Some(mic) = &constraints.audio_device {
            tracks.push(Box::new(FakeTrack {
                id: mic.clone(),
                kind: DeviceKind::AudioInput,
                generation,
                live: true,
                state: Arc::clone(&self.state),
            }));
        }

        let slot = FrameSlot::new();
        slot.publish(Frame::filled(16, 16, Rgba::new(10, 20, 30, 255)));
        Ok(CaptureSession::new(tracks, slot))
    }

    fn supports_output_selection(&self) -> bool {
        self.lock().output_supported
    }

    fn route_output(&self, device_id: &str) -> Result<(), RouteError> {
        let mut state = self.lock();
        if state.broken_outputs.contains(device_id) {
            return Err(RouteError::Backend(format!("{} rejected the stream", device_id)));
        }
        state.routed.push(device_id.to_string());
        Ok(())
    }
}
