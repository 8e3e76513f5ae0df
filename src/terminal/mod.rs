//! Terminal front-end: raw mode, the preview sink and the status bar.

mod preview;
mod raw_mode;
mod status_bar;

pub use preview::TerminalSink;
pub use raw_mode::RawModeGuard;
pub use status_bar::StatusBar;
