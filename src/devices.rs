//! Device enumeration results and the user's per-kind selection.
//!
//! Labels may be empty until the platform grants capture permission, so the
//! list substitutes numbered placeholders and is meant to be rebuilt after
//! every successful acquisition. Rebuilding never drops a selection whose
//! device is still present.

use std::fmt;

/// Kind of media device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [
        DeviceKind::VideoInput,
        DeviceKind::AudioInput,
        DeviceKind::AudioOutput,
    ];

    /// Noun used for placeholder labels and the status bar.
    pub fn noun(self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "camera",
            DeviceKind::AudioInput => "microphone",
            DeviceKind::AudioOutput => "speaker",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::AudioInput => "audioinput",
            DeviceKind::AudioOutput => "audiooutput",
        };
        f.write_str(name)
    }
}

/// One enumerated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Stable identifier used for selection
    pub device_id: String,
    pub kind: DeviceKind,
    /// Human-readable name, possibly empty before permission is granted
    pub label: String,
}

impl DeviceInfo {
    pub fn new(device_id: impl Into<String>, kind: DeviceKind, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            label: label.into(),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.device_id, self.label)
    }
}

/// Snapshot of available devices, grouped by kind, with non-empty labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    video_inputs: Vec<DeviceInfo>,
    audio_inputs: Vec<DeviceInfo>,
    audio_outputs: Vec<DeviceInfo>,
}

impl DeviceList {
    /// Group enumerated devices, replacing empty labels with `camera N`,
    /// `microphone N` or `speaker N`.
    pub fn from_infos(infos: impl IntoIterator<Item = DeviceInfo>) -> Self {
        let mut list = DeviceList::default();
        for mut info in infos {
            let group = list.group_mut(info.kind);
            if info.label.trim().is_empty() {
                info.label = format!("{} {}", info.kind.noun(), group.len() + 1);
            }
            group.push(info);
        }
        list
    }

    pub fn devices(&self, kind: DeviceKind) -> &[DeviceInfo] {
        match kind {
            DeviceKind::VideoInput => &self.video_inputs,
            DeviceKind::AudioInput => &self.audio_inputs,
            DeviceKind::AudioOutput => &self.audio_outputs,
        }
    }

    fn group_mut(&mut self, kind: DeviceKind) -> &mut Vec<DeviceInfo> {
        match kind {
            DeviceKind::VideoInput => &mut self.video_inputs,
            DeviceKind::AudioInput => &mut self.audio_inputs,
            DeviceKind::AudioOutput => &mut self.audio_outputs,
        }
    }

    pub fn find(&self, kind: DeviceKind, device_id: &str) -> Option<&DeviceInfo> {
        self.devices(kind).iter().find(|d| d.device_id == device_id)
    }

    pub fn contains(&self, kind: DeviceKind, device_id: &str) -> bool {
        self.find(kind, device_id).is_some()
    }

    /// First (default) device of a kind.
    pub fn first(&self, kind: DeviceKind) -> Option<&DeviceInfo> {
        self.devices(kind).first()
    }

    /// Device after `current` in list order, wrapping around. With no
    /// current device (or one no longer listed) this is the first device.
    pub fn next_after(&self, kind: DeviceKind, current: Option<&str>) -> Option<&DeviceInfo> {
        let devices = self.devices(kind);
        let pos = current.and_then(|id| devices.iter().position(|d| d.device_id == id));
        match pos {
            Some(i) => devices.get((i + 1) % devices.len()),
            None => devices.first(),
        }
    }

    pub fn is_empty(&self) -> bool {
        DeviceKind::ALL.iter().all(|&k| self.devices(k).is_empty())
    }

    /// A new list from `infos`, except that kinds in `unqueried` keep this
    /// list's entries: a failed query says nothing about what is attached.
    pub fn refreshed(
        &self,
        infos: impl IntoIterator<Item = DeviceInfo>,
        unqueried: &[DeviceKind],
    ) -> Self {
        let mut list =
            DeviceList::from_infos(infos.into_iter().filter(|d| !unqueried.contains(&d.kind)));
        for &kind in unqueried {
            *list.group_mut(kind) = self.devices(kind).to_vec();
        }
        list
    }
}

/// Currently selected device id per kind. `None` means the platform default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub video_input: Option<String>,
    pub audio_input: Option<String>,
    pub audio_output: Option<String>,
}

impl Selection {
    pub fn get(&self, kind: DeviceKind) -> Option<&str> {
        match kind {
            DeviceKind::VideoInput => self.video_input.as_deref(),
            DeviceKind::AudioInput => self.audio_input.as_deref(),
            DeviceKind::AudioOutput => self.audio_output.as_deref(),
        }
    }

    pub fn set(&mut self, kind: DeviceKind, device_id: Option<String>) {
        let slot = match kind {
            DeviceKind::VideoInput => &mut self.video_input,
            DeviceKind::AudioInput => &mut self.audio_input,
            DeviceKind::AudioOutput => &mut self.audio_output,
        };
        *slot = device_id;
    }

    /// Copy of this selection with one kind changed.
    pub fn with(&self, kind: DeviceKind, device_id: &str) -> Selection {
        let mut next = self.clone();
        next.set(kind, Some(device_id.to_string()));
        next
    }

    /// Keep selections still present in `list`; reset the rest to the
    /// default. Returns the kinds that were reset.
    pub fn reconcile(&mut self, list: &DeviceList) -> Vec<DeviceKind> {
        self.reconcile_kinds(list, &DeviceKind::ALL)
    }

    /// [`reconcile`](Self::reconcile) restricted to `kinds`.
    pub fn reconcile_kinds(&mut self, list: &DeviceList, kinds: &[DeviceKind]) -> Vec<DeviceKind> {
        let mut reset = Vec::new();
        for &kind in kinds {
            if let Some(id) = self.get(kind) {
                if !list.contains(kind, id) {
                    reset.push(kind);
                }
            }
        }
        for &kind in &reset {
            self.set(kind, None);
        }
        reset
    }

    /// Label of the selected device, falling back to the list's default.
    pub fn label<'a>(&self, list: &'a DeviceList, kind: DeviceKind) -> Option<&'a str> {
        let device = match self.get(kind) {
            Some(id) => list.find(kind, id),
            None => list.first(kind),
        };
        device.map(|d| d.label.as_str())
    }
}

/// Print the device list to stdout.
///
/// If both `show_video` and `show_audio` are false, all devices are shown.
pub fn print_devices(devices: &DeviceList, show_video: bool, show_audio: bool) {
    let show_both = !show_video && !show_audio;

    let mut sections = Vec::new();
    if show_video || show_both {
        sections.push(("Cameras:", DeviceKind::VideoInput));
    }
    if show_audio || show_both {
        sections.push(("Microphones:", DeviceKind::AudioInput));
        sections.push(("Speakers:", DeviceKind::AudioOutput));
    }

    for (i, (title, kind)) in sections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", title);
        let group = devices.devices(*kind);
        if group.is_empty() {
            println!("  (none found)");
        }
        for device in group {
            println!("  {}", device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeviceList {
        DeviceList::from_infos([
            DeviceInfo::new("0", DeviceKind::VideoInput, "FaceTime HD Camera"),
            DeviceInfo::new("1", DeviceKind::VideoInput, ""),
            DeviceInfo::new("Built-in Mic", DeviceKind::AudioInput, "Built-in Mic"),
            DeviceInfo::new("Speakers", DeviceKind::AudioOutput, ""),
        ])
    }

    #[test]
    fn test_empty_labels_get_placeholders() {
        let list = sample();
        assert_eq!(list.devices(DeviceKind::VideoInput)[1].label, "camera 2");
        assert_eq!(list.devices(DeviceKind::AudioOutput)[0].label, "speaker 1");
        assert_eq!(
            list.devices(DeviceKind::VideoInput)[0].label,
            "FaceTime HD Camera"
        );
    }

    #[test]
    fn test_next_after_wraps() {
        let list = sample();
        let kind = DeviceKind::VideoInput;
        assert_eq!(list.next_after(kind, None).unwrap().device_id, "0");
        assert_eq!(list.next_after(kind, Some("0")).unwrap().device_id, "1");
        assert_eq!(list.next_after(kind, Some("1")).unwrap().device_id, "0");
        assert_eq!(list.next_after(kind, Some("gone")).unwrap().device_id, "0");
    }

    #[test]
    fn test_next_after_empty_kind() {
        let list = DeviceList::default();
        assert!(list.next_after(DeviceKind::AudioInput, None).is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_reconcile_preserves_present_selection() {
        let mut selection = Selection {
            video_input: Some("1".to_string()),
            audio_input: Some("Built-in Mic".to_string()),
            audio_output: None,
        };
        let reset = selection.reconcile(&sample());
        assert!(reset.is_empty());
        assert_eq!(selection.get(DeviceKind::VideoInput), Some("1"));
        assert_eq!(selection.get(DeviceKind::AudioInput), Some("Built-in Mic"));
    }

    #[test]
    fn test_reconcile_resets_missing_selection() {
        let mut selection = Selection {
            video_input: Some("7".to_string()),
            ..Selection::default()
        };
        let reset = selection.reconcile(&sample());
        assert_eq!(reset, vec![DeviceKind::VideoInput]);
        assert_eq!(selection.get(DeviceKind::VideoInput), None);
    }

    #[test]
    fn test_refreshed_keeps_unqueried_kinds() {
        let previous = sample();
        let list = previous.refreshed(
            [
                DeviceInfo::new("Mic 2", DeviceKind::AudioInput, "Mic 2"),
                // Stale entry for a kind that failed to enumerate
                DeviceInfo::new("9", DeviceKind::VideoInput, ""),
            ],
            &[DeviceKind::VideoInput],
        );
        assert_eq!(
            list.devices(DeviceKind::VideoInput),
            previous.devices(DeviceKind::VideoInput)
        );
        assert!(list.contains(DeviceKind::AudioInput, "Mic 2"));
        assert_eq!(list.devices(DeviceKind::AudioInput).len(), 1);
    }

    #[test]
    fn test_reconcile_kinds_skips_others() {
        let mut selection = Selection::default()
            .with(DeviceKind::VideoInput, "gone")
            .with(DeviceKind::AudioInput, "gone");
        let reset = selection.reconcile_kinds(&sample(), &[DeviceKind::AudioInput]);
        assert_eq!(reset, vec![DeviceKind::AudioInput]);
        assert_eq!(selection.get(DeviceKind::VideoInput), Some("gone"));
        assert_eq!(selection.get(DeviceKind::AudioInput), None);
    }

    #[test]
    fn test_reconcile_is_repeatable() {
        let list = sample();
        let mut selection = Selection::default().with(DeviceKind::VideoInput, "1");
        for _ in 0..3 {
            selection.reconcile(&list);
        }
        assert_eq!(selection.get(DeviceKind::VideoInput), Some("1"));
    }

    #[test]
    fn test_selection_label_falls_back_to_default() {
        let list = sample();
        let selection = Selection::default();
        assert_eq!(
            selection.label(&list, DeviceKind::VideoInput),
            Some("FaceTime HD Camera")
        );
        let selection = selection.with(DeviceKind::VideoInput, "1");
        assert_eq!(selection.label(&list, DeviceKind::VideoInput), Some("camera 2"));
    }

    #[test]
    fn test_device_kind_display() {
        assert_eq!(DeviceKind::VideoInput.to_string(), "videoinput");
        assert_eq!(DeviceKind::AudioOutput.noun(), "speaker");
    }
}
