//! Keyboard hotkeys.
//!
//! - `c`: next camera
//! - `m`: next microphone
//! - `s`: next speaker
//! - `q`, Esc, Ctrl+C: quit

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::devices::DeviceKind;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Switch to the next device of this kind
    NextDevice(DeviceKind),
    Quit,
    None,
}

pub fn handle_key_event(event: KeyEvent) -> AppAction {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    // Windows reports releases too
    if kind == KeyEventKind::Release {
        return AppAction::None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => AppAction::Quit,
            _ => AppAction::None,
        };
    }

    match code {
        KeyCode::Char('c') | KeyCode::Char('C') => AppAction::NextDevice(DeviceKind::VideoInput),
        KeyCode::Char('m') | KeyCode::Char('M') => AppAction::NextDevice(DeviceKind::AudioInput),
        KeyCode::Char('s') | KeyCode::Char('S') => AppAction::NextDevice(DeviceKind::AudioOutput),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => AppAction::Quit,
        _ => AppAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_device_hotkeys() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('c'), KeyModifiers::NONE)),
            AppAction::NextDevice(DeviceKind::VideoInput)
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('M'), KeyModifiers::SHIFT)),
            AppAction::NextDevice(DeviceKind::AudioInput)
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('s'), KeyModifiers::NONE)),
            AppAction::NextDevice(DeviceKind::AudioOutput)
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            AppAction::Quit
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Esc, KeyModifiers::NONE)),
            AppAction::Quit
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            AppAction::Quit
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('x'), KeyModifiers::NONE)),
            AppAction::None
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Char('m'), KeyModifiers::CONTROL)),
            AppAction::None
        );
    }

    #[test]
    fn test_release_ignored() {
        let event = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(handle_key_event(event), AppAction::None);
    }
}
