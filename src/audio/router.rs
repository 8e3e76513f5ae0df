//! Playback device selection.

use std::sync::Mutex;

use cpal::traits::{DeviceTrait, HostTrait};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Audio output selection is not supported on this platform")]
    Unsupported,

    #[error("Audio output '{0}' not found")]
    DeviceNotFound(String),

    #[error("Audio output routing failed: {0}")]
    Backend(String),
}

/// Holds the playback device chosen for the session.
#[derive(Debug, Default)]
pub struct OutputRouter {
    current: Mutex<Option<String>>,
}

impl OutputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the host can enumerate output devices at all.
    pub fn supports_output_selection(&self) -> bool {
        cpal::default_host().output_devices().is_ok()
    }

    /// Route playback to the named output device.
    pub fn set_output(&self, device_id: &str) -> Result<(), RouteError> {
        let host = cpal::default_host();
        let mut outputs = host
            .output_devices()
            .map_err(|_| RouteError::Unsupported)?;
        if !outputs.any(|d| d.name().ok().as_deref() == Some(device_id)) {
            return Err(RouteError::DeviceNotFound(device_id.to_string()));
        }

        let mut current = self
            .current
            .lock()
            .map_err(|e| RouteError::Backend(e.to_string()))?;
        *current = Some(device_id.to_string());
        log::info!("Audio output routed to {}", device_id);
        Ok(())
    }

    /// The device playback is routed to, if one was set.
    pub fn current_output(&self) -> Option<String> {
        self.current.lock().ok()?.clone()
    }
}
