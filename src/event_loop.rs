//! Async event loop for the terminal front-end.
//!
//! Keyboard input becomes device requests for the stream controller, and
//! stream events update what the status bar shows. Rendering itself happens
//! in the render loop task; this loop only resizes the sink and hands it
//! status text.

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::devices::{DeviceKind, DeviceList, Selection};
use crate::input::{handle_key_event, AppAction};
use crate::pixelate::BlockSize;
use crate::render_loop::TickRate;
use crate::stream::{ControllerHandle, DeviceRequest, StreamEvent};
use crate::terminal::{StatusBar, TerminalSink};

/// What the front-end knows about devices, kept in sync by stream events.
#[derive(Debug)]
pub struct FrontEnd {
    devices: DeviceList,
    /// Devices the manager confirmed
    selection: Selection,
    /// Devices requested but possibly not yet confirmed; hotkeys cycle from here
    pending: Selection,
    status_bar: StatusBar,
    block: BlockSize,
    rate: TickRate,
}

impl FrontEnd {
    pub fn new(
        devices: DeviceList,
        selection: Selection,
        status_bar: StatusBar,
        block: BlockSize,
        rate: TickRate,
    ) -> Self {
        Self {
            devices,
            pending: selection.clone(),
            selection,
            status_bar,
            block,
            rate,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Request for the device after the current one of `kind`, or `None`
    /// when there is nothing to switch to.
    pub fn next_device(&mut self, kind: DeviceKind) -> Option<DeviceRequest> {
        let current = self
            .pending
            .get(kind)
            .or_else(|| self.devices.first(kind).map(|d| d.device_id.as_str()));
        let Some(next) = self.devices.next_after(kind, current) else {
            self.status_bar.set_notice(format!("no {} found", kind.noun()));
            return None;
        };
        if Some(next.device_id.as_str()) == current {
            self.status_bar
                .set_notice(format!("only one {} available", kind.noun()));
            return None;
        }

        let device_id = next.device_id.clone();
        log::info!("Switching {} to {}", kind.noun(), next.label);
        self.pending.set(kind, Some(device_id.clone()));
        Some(DeviceRequest::Select { kind, device_id })
    }

    pub fn apply_event(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::SessionStarted {
                selection,
                restored,
                ..
            } => {
                self.selection.video_input = selection.video_input.clone();
                self.selection.audio_input = selection.audio_input.clone();
                self.pending.video_input = selection.video_input.clone();
                self.pending.audio_input = selection.audio_input.clone();
                // A restore follows a failure whose notice must stay visible
                if !restored {
                    self.status_bar.clear_notice();
                }
            }
            StreamEvent::DevicesChanged { devices, selection } => {
                self.devices = devices.clone();
                self.selection = selection.clone();
                self.pending.reconcile(&self.devices);
            }
            StreamEvent::AcquisitionFailed { kind, error } => {
                let confirmed = self.selection.get(*kind).map(str::to_string);
                self.pending.set(*kind, confirmed);
                self.status_bar
                    .set_notice(format!("{} switch failed: {}", kind.noun(), error));
            }
            StreamEvent::OutputRouted {
                device_id,
                fell_back,
            } => {
                self.selection
                    .set(DeviceKind::AudioOutput, device_id.clone());
                self.pending.set(DeviceKind::AudioOutput, device_id.clone());
                if *fell_back {
                    self.status_bar
                        .set_notice("speaker unavailable, using default");
                } else {
                    self.status_bar.clear_notice();
                }
            }
            StreamEvent::OutputUnsupported { .. } => {
                let confirmed = self.selection.get(DeviceKind::AudioOutput).map(str::to_string);
                self.pending.set(DeviceKind::AudioOutput, confirmed);
                self.status_bar
                    .set_notice("speaker selection not supported here");
            }
        }
    }

    /// Status bar text, `None` when hidden.
    pub fn status_line(&self) -> Option<String> {
        self.status_bar.visible.then(|| {
            self.status_bar
                .format(&self.devices, &self.selection, self.block, self.rate)
        })
    }
}

/// Run until the user quits, the terminal closes or the controller exits.
pub async fn run(
    mut front: FrontEnd,
    controller: ControllerHandle,
    mut events: UnboundedReceiver<StreamEvent>,
    sink: Arc<Mutex<TerminalSink<Stdout>>>,
) -> io::Result<()> {
    let mut event_stream = EventStream::new();
    push_status(&front, &sink);

    loop {
        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => match handle_key_event(key_event) {
                        AppAction::Quit => break,
                        AppAction::NextDevice(kind) => {
                            if let Some(request) = front.next_device(kind) {
                                if !controller.send(request) {
                                    break;
                                }
                            }
                        }
                        AppAction::None => {}
                    },
                    Some(Ok(Event::Resize(cols, rows))) => {
                        if let Ok(mut sink) = sink.lock() {
                            sink.resize(cols, rows);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e),
                    None => break,
                }
            }

            maybe_stream = events.recv() => {
                match maybe_stream {
                    Some(event) => front.apply_event(&event),
                    // Controller exited
                    None => break,
                }
            }
        }

        push_status(&front, &sink);
    }

    Ok(())
}

fn push_status(front: &FrontEnd, sink: &Mutex<TerminalSink<Stdout>>) {
    if let Ok(mut sink) = sink.lock() {
        sink.set_status(front.status_line());
    }
}
