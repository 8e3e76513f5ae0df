//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::camera::Resolution;
use crate::config::MAX_FPS;
use crate::pixelate::BlockSize;

/// Live camera pixelation preview for the terminal
#[derive(Parser, Debug)]
#[command(name = "pixelcam")]
#[command(version, about = "Live camera pixelation preview for the terminal", long_about = None)]
#[command(after_help = "HOTKEYS:
    c          next camera
    m          next microphone
    s          next speaker
    q, Esc     quit

EXAMPLES:
    pixelcam                          # default camera, 8px blocks
    pixelcam --camera 1 --block-size 16 --fps 30
    pixelcam --headless               # render without a terminal preview
    pixelcam list-devices --video")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device id (from list-devices)
    #[arg(long)]
    pub camera: Option<String>,

    /// Microphone name (from list-devices --audio)
    #[arg(long)]
    pub audio_input: Option<String>,

    /// Speaker name (from list-devices --audio)
    #[arg(long)]
    pub audio_output: Option<String>,

    /// Edge length of each pixelation block in pixels (1-256)
    #[arg(long, short, value_parser = parse_block_size)]
    pub block_size: Option<BlockSize>,

    /// Preview updates per second; 0 renders as fast as possible (0-120)
    #[arg(long, value_parser = parse_fps)]
    pub fps: Option<u32>,

    /// Requested capture resolution (WIDTHxHEIGHT)
    #[arg(long, short, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Mirror camera horizontally
    #[arg(long)]
    pub mirror: bool,

    /// Hide status bar
    #[arg(long)]
    pub no_status: bool,

    /// Render without a terminal preview until Ctrl-C
    #[arg(long)]
    pub headless: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras, microphones and speakers
    ListDevices {
        /// Only list cameras
        #[arg(long)]
        video: bool,
        /// Only list microphones and speakers
        #[arg(long)]
        audio: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
}

fn parse_block_size(s: &str) -> Result<BlockSize, String> {
    let size: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid block size", s))?;
    BlockSize::new(size).map_err(|e| e.to_string())
}

fn parse_fps(s: &str) -> Result<u32, String> {
    let fps: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid frame rate", s))?;
    if fps > MAX_FPS {
        return Err(format!(
            "Frame rate must be between 0 and {} fps, got {}",
            MAX_FPS, fps
        ));
    }
    Ok(fps)
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    s.parse()
}
