//! Status bar shown on the last terminal row.

use crate::devices::{DeviceKind, DeviceList, Selection};
use crate::pixelate::BlockSize;
use crate::render_loop::TickRate;

/// Shows: camera | microphone | speaker | block size | rate | hotkeys
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub visible: bool,
    /// One-shot message (e.g. a failed device switch) shown until the next
    /// successful change
    notice: Option<String>,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self::with_visibility(true)
    }

    pub fn with_visibility(visible: bool) -> Self {
        Self {
            visible,
            notice: None,
        }
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Format: " cam: X | mic: Y | out: Z | 8px | 30 fps | c/m/s switch, q quit "
    pub fn format(
        &self,
        devices: &DeviceList,
        selection: &Selection,
        block: BlockSize,
        rate: TickRate,
    ) -> String {
        let label = |kind| selection.label(devices, kind).unwrap_or("none");
        let mut text = format!(
            " cam: {} | mic: {} | out: {} | {} | {} | c/m/s switch, q quit ",
            label(DeviceKind::VideoInput),
            label(DeviceKind::AudioInput),
            label(DeviceKind::AudioOutput),
            block,
            rate,
        );
        if let Some(notice) = &self.notice {
            text = format!(" {} |{}", notice, text);
        }
        text
    }
}
