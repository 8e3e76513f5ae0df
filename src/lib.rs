//! pixelcam library crate.
//!
//! Exposes the capture, pixelation and rendering components so the binary
//! and integration tests share them.

pub mod audio;
pub mod camera;
pub mod cli;
pub mod config;
pub mod devices;
pub mod event_loop;
pub mod frame;
pub mod input;
pub mod pixelate;
pub mod render_loop;
pub mod stream;
pub mod terminal;
