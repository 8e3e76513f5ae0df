//! Actor task owning the [`StreamManager`].
//!
//! Front-ends send requests over a channel and never block on device work.
//! Requests that pile up while an acquisition is in flight are coalesced so
//! that only the latest one per device kind runs.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::backend::MediaBackend;
use super::manager::{StreamError, StreamManager};
use crate::devices::DeviceKind;

/// A device change requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRequest {
    Select { kind: DeviceKind, device_id: String },
    Refresh,
}

#[derive(Debug)]
enum Command {
    Request(DeviceRequest),
    Shutdown(oneshot::Sender<()>),
}

/// Drop requests superseded by a later one: the last `Select` per kind and
/// a single `Refresh` survive, in the order of their last occurrence.
pub fn coalesce(requests: Vec<DeviceRequest>) -> Vec<DeviceRequest> {
    let mut kept: Vec<DeviceRequest> = Vec::with_capacity(requests.len());
    for request in requests.into_iter().rev() {
        let superseded = kept.iter().any(|later| match (&request, later) {
            (DeviceRequest::Select { kind: a, .. }, DeviceRequest::Select { kind: b, .. }) => a == b,
            (DeviceRequest::Refresh, DeviceRequest::Refresh) => true,
            _ => false,
        });
        if !superseded {
            kept.push(request);
        }
    }
    kept.reverse();
    kept
}

/// Sending side of the controller. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ControllerHandle {
    /// Queue a request. Returns `false` if the controller has exited.
    pub fn send(&self, request: DeviceRequest) -> bool {
        self.tx.send(Command::Request(request)).is_ok()
    }

    pub fn select(&self, kind: DeviceKind, device_id: impl Into<String>) -> bool {
        self.send(DeviceRequest::Select {
            kind,
            device_id: device_id.into(),
        })
    }

    pub fn refresh(&self) -> bool {
        self.send(DeviceRequest::Refresh)
    }

    /// Stop rendering, release all devices and wait for the controller to
    /// exit. Queued requests are discarded.
    pub async fn shutdown(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown(reply_tx)).is_ok() {
            let _ = reply_rx.await;
        }
    }
}

/// Move `manager` into a controller task.
///
/// The task also shuts the manager down when every handle is dropped.
pub fn spawn_controller<B: MediaBackend>(manager: StreamManager<B>) -> (ControllerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(manager, rx));
    (ControllerHandle { tx }, task)
}

async fn run<B: MediaBackend>(mut manager: StreamManager<B>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(more) = rx.try_recv() {
            batch.push(more);
        }

        let mut requests = Vec::with_capacity(batch.len());
        let mut shutdown = None;
        for command in batch {
            match command {
                Command::Request(r) => requests.push(r),
                Command::Shutdown(reply) => shutdown = Some(reply),
            }
        }

        if let Some(reply) = shutdown {
            manager.shutdown().await;
            let _ = reply.send(());
            return;
        }

        let received = requests.len();
        let requests = coalesce(requests);
        if requests.len() < received {
            log::debug!("Coalesced {} device request(s) into {}", received, requests.len());
        }
        for request in requests {
            handle(&mut manager, request).await;
        }
    }

    manager.shutdown().await;
}

async fn handle<B: MediaBackend>(manager: &mut StreamManager<B>, request: DeviceRequest) {
    let result = match &request {
        DeviceRequest::Select { kind, device_id } => manager.select_device(device_id, *kind).await,
        DeviceRequest::Refresh => manager.refresh_devices().await.map(|_| ()),
    };
    match result {
        Ok(()) => {}
        // Already logged and published by the manager
        Err(StreamError::Acquisition(_)) => {}
        Err(e) => log::error!("{:?} failed: {}", request, e),
    }
}
