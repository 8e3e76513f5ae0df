//! Device/stream lifecycle: acquisition, replacement, teardown.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use super::backend::{DeviceAcquisitionError, MediaBackend, StreamConstraints};
use super::session::CaptureSession;
use crate::audio::RouteError;
use crate::devices::{DeviceKind, DeviceList, Selection};
use crate::pixelate::BlockSize;
use crate::render_loop::{LoopState, LoopStats, RenderLoop, SharedSink, TickRate};

/// Notifications for front-ends.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A new session is live and feeding the render loop. `restored` is set
    /// when a failed switch reopened the previous devices.
    SessionStarted {
        session_id: u64,
        selection: Selection,
        restored: bool,
    },
    /// The device list was refreshed; `selection` is the manager's after
    /// dropping devices that disappeared.
    DevicesChanged {
        devices: DeviceList,
        selection: Selection,
    },
    /// A request for a device of `kind` failed; the previous state stands.
    AcquisitionFailed {
        kind: DeviceKind,
        error: DeviceAcquisitionError,
    },
    /// Playback was routed. `fell_back` is set when the requested device
    /// failed and the default was used instead.
    OutputRouted {
        device_id: Option<String>,
        fell_back: bool,
    },
    /// The platform cannot select outputs; `device_id` was not applied.
    OutputUnsupported { device_id: String },
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Acquisition(#[from] DeviceAcquisitionError),

    #[error("no capture session is active")]
    NoSession,

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of an output routing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Playback goes to the requested device.
    Routed(String),
    /// The requested device failed; playback goes to this one (or the
    /// platform default when `None`).
    FellBack(Option<String>),
    /// The platform cannot select outputs; nothing changed.
    Unsupported,
}

/// Owns the active [`CaptureSession`], the device list, the selection and
/// the [`RenderLoop`] fed by the session.
///
/// `&mut self` methods serialize acquisitions: a second request cannot start
/// until the first has settled.
pub struct StreamManager<B: MediaBackend> {
    backend: Arc<B>,
    base: StreamConstraints,
    session: Option<CaptureSession>,
    selection: Selection,
    devices: DeviceList,
    render: RenderLoop,
    events: Option<UnboundedSender<StreamEvent>>,
}

impl<B: MediaBackend> StreamManager<B> {
    /// `base` supplies resolution, fps and mirroring for every acquisition;
    /// its device fields seed the initial selection.
    pub fn new(backend: B, base: StreamConstraints, block: BlockSize) -> Self {
        let selection = Selection {
            video_input: base.video_device.clone(),
            audio_input: base.audio_device.clone(),
            audio_output: None,
        };
        Self {
            backend: Arc::new(backend),
            base,
            session: None,
            selection,
            devices: DeviceList::default(),
            render: RenderLoop::new(block),
            events: None,
        }
    }

    /// Publish [`StreamEvent`]s on `tx`.
    pub fn with_events(mut self, tx: UnboundedSender<StreamEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn devices(&self) -> &DeviceList {
        &self.devices
    }

    pub fn render_state(&self) -> LoopState {
        self.render.state()
    }

    pub fn render_stats(&self) -> LoopStats {
        self.render.stats()
    }

    pub fn block_size(&self) -> BlockSize {
        self.render.block_size()
    }

    /// Re-enumerate devices, keeping selections that are still attached.
    ///
    /// Kinds the backend could not query keep their previous entries and
    /// selection.
    pub async fn refresh_devices(&mut self) -> Result<&DeviceList, StreamError> {
        let backend = Arc::clone(&self.backend);
        let scan = tokio::task::spawn_blocking(move || backend.enumerate_devices()).await??;

        for kind in &scan.unavailable {
            log::warn!("Could not list {}s; keeping the previous list", kind.noun());
        }
        self.devices = self.devices.refreshed(scan.devices, &scan.unavailable);
        let queried: Vec<DeviceKind> = DeviceKind::ALL
            .into_iter()
            .filter(|k| !scan.unavailable.contains(k))
            .collect();
        for kind in self.selection.reconcile_kinds(&self.devices, &queried) {
            log::info!("Selected {} disappeared; using the default", kind.noun());
        }
        self.emit(StreamEvent::DevicesChanged {
            devices: self.devices.clone(),
            selection: self.selection.clone(),
        });
        Ok(&self.devices)
    }

    /// Acquire the initial session for the current selection.
    pub async fn start(&mut self) -> Result<(), StreamError> {
        let selection = self.selection.clone();
        self.switch_to(selection, DeviceKind::VideoInput).await
    }

    /// Switch the device of `kind` to `device_id`.
    ///
    /// Input devices re-acquire the stream; on failure the previous session
    /// and selection are kept and the error is returned. Output devices are
    /// routed with [`route_audio_output`](Self::route_audio_output).
    pub async fn select_device(&mut self, device_id: &str, kind: DeviceKind) -> Result<(), StreamError> {
        match kind {
            DeviceKind::AudioOutput => {
                self.route_audio_output(device_id).await?;
                Ok(())
            }
            DeviceKind::VideoInput | DeviceKind::AudioInput => {
                let next = self.selection.with(kind, device_id);
                self.switch_to(next, kind).await
            }
        }
    }

    async fn switch_to(&mut self, next: Selection, kind: DeviceKind) -> Result<(), StreamError> {
        let constraints = self.base.for_selection(&next);

        if !self.holds_camera_for(&next) {
            return match self.acquire(constraints).await {
                Ok(session) => {
                    self.install(session, next, false).await;
                    Ok(())
                }
                Err(e) => Err(self.acquisition_failed(kind, e)),
            };
        }

        // The camera is already open in the live session and cannot be
        // opened twice, so release it before acquiring
        let previous = self.selection.clone();
        if let Some(old) = self.session.take() {
            retire(old).await;
        }
        match self.acquire(constraints).await {
            Ok(session) => {
                self.install(session, next, false).await;
                Ok(())
            }
            Err(e) => {
                let err = self.acquisition_failed(kind, e);
                let restore = self.base.for_selection(&previous);
                match self.acquire(restore).await {
                    Ok(session) => {
                        log::info!("Restored previous stream");
                        self.install(session, previous, true).await;
                    }
                    Err(e) => log::error!("Could not restore previous stream: {}", e),
                }
                Err(err)
            }
        }
    }

    /// Whether the live session already has the camera `next` would open.
    fn holds_camera_for(&self, next: &Selection) -> bool {
        let Some(current) = self
            .session
            .as_ref()
            .and_then(|s| s.track_id(DeviceKind::VideoInput))
        else {
            return false;
        };
        let target = next
            .video_input
            .as_deref()
            .or_else(|| self.devices.first(DeviceKind::VideoInput).map(|d| d.device_id.as_str()));
        // Unknown default camera: assume it is the open one
        target.map_or(true, |t| t == current)
    }

    async fn acquire(
        &self,
        constraints: StreamConstraints,
    ) -> Result<CaptureSession, DeviceAcquisitionError> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.acquire(&constraints))
            .await
            .map_err(|e| DeviceAcquisitionError::Backend(e.to_string()))?
    }

    /// Make `session` current: feed it to the render loop, stop the previous
    /// session, record the selection and refresh the device list.
    async fn install(&mut self, session: CaptureSession, selection: Selection, restored: bool) {
        let session_id = session.id();
        self.render.replace_source(session.frame_source()).await;

        if let Some(old) = self.session.replace(session) {
            retire(old).await;
        }
        self.selection = selection;
        log::info!("Capture session {} started", session_id);
        self.emit(StreamEvent::SessionStarted {
            session_id,
            selection: self.selection.clone(),
            restored,
        });

        // Labels are often only readable once a device has been opened
        if let Err(e) = self.refresh_devices().await {
            log::warn!("Device refresh failed: {}", e);
        }
    }

    fn acquisition_failed(&self, kind: DeviceKind, error: DeviceAcquisitionError) -> StreamError {
        log::error!("Could not switch {}: {}", kind.noun(), error);
        self.emit(StreamEvent::AcquisitionFailed {
            kind,
            error: error.clone(),
        });
        StreamError::Acquisition(error)
    }

    /// Route playback to `device_id`.
    ///
    /// Unsupported platforms log a warning and change nothing. When the
    /// device cannot be used, playback falls back to the first listed
    /// output (or the platform default if none is listed).
    pub async fn route_audio_output(&mut self, device_id: &str) -> Result<RouteOutcome, StreamError> {
        if !self.backend.supports_output_selection() {
            log::warn!("This platform does not support audio output device selection");
            self.emit(StreamEvent::OutputUnsupported {
                device_id: device_id.to_string(),
            });
            return Ok(RouteOutcome::Unsupported);
        }

        let error = match self.route(device_id.to_string()).await? {
            Ok(()) => {
                self.selection
                    .set(DeviceKind::AudioOutput, Some(device_id.to_string()));
                self.emit(StreamEvent::OutputRouted {
                    device_id: Some(device_id.to_string()),
                    fell_back: false,
                });
                return Ok(RouteOutcome::Routed(device_id.to_string()));
            }
            Err(e) => e,
        };
        log::error!("Could not route audio to {}: {}", device_id, error);

        let fallback = self
            .devices
            .first(DeviceKind::AudioOutput)
            .map(|d| d.device_id.clone())
            .filter(|id| id != device_id);
        let routed = match fallback {
            Some(id) => match self.route(id.clone()).await? {
                Ok(()) => Some(id),
                Err(e) => {
                    log::error!("Could not route audio to default output {}: {}", id, e);
                    None
                }
            },
            None => None,
        };

        self.selection.set(DeviceKind::AudioOutput, routed.clone());
        self.emit(StreamEvent::OutputRouted {
            device_id: routed.clone(),
            fell_back: true,
        });
        Ok(RouteOutcome::FellBack(routed))
    }

    async fn route(&self, device_id: String) -> Result<Result<(), RouteError>, StreamError> {
        let backend = Arc::clone(&self.backend);
        Ok(tokio::task::spawn_blocking(move || backend.route_output(&device_id)).await?)
    }

    /// Start the render loop against the current session.
    pub async fn start_rendering(&mut self, sink: SharedSink, rate: TickRate) -> Result<(), StreamError> {
        let source = self
            .session
            .as_ref()
            .map(CaptureSession::frame_source)
            .ok_or(StreamError::NoSession)?;
        self.render.start(source, sink, rate).await;
        Ok(())
    }

    pub async fn stop_rendering(&mut self) {
        self.render.stop().await;
    }

    /// Stop rendering and release every device.
    pub async fn shutdown(&mut self) {
        self.render.stop().await;
        if let Some(old) = self.session.take() {
            retire(old).await;
        }
        log::info!("Stream manager shut down");
    }

    fn emit(&self, event: StreamEvent) {
        if let Some(tx) = &self.events {
            // Front-end gone; nothing to notify
            let _ = tx.send(event);
        }
    }
}

/// Stop a session on the blocking pool; camera threads are joined there.
async fn retire(session: CaptureSession) {
    let id = session.id();
    let result = tokio::task::spawn_blocking(move || {
        let mut session = session;
        session.stop();
    })
    .await;
    if let Err(e) = result {
        log::error!("Stopping session {} failed: {}", id, e);
    }
}
