//! Effective run settings: config file values overridden by CLI flags.

use super::args::Args;
use crate::config::{Config, ConfigError};
use crate::pixelate::BlockSize;
use crate::render_loop::TickRate;
use crate::stream::StreamConstraints;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub constraints: StreamConstraints,
    pub audio_output: Option<String>,
    pub block: BlockSize,
    pub rate: TickRate,
    pub status_bar: bool,
    pub headless: bool,
}

impl RunSettings {
    pub fn resolve(args: &Args, config: &Config) -> Result<Self, ConfigError> {
        let resolution = match args.resolution {
            Some(r) => r,
            None => config.resolution()?,
        };
        let block = match args.block_size {
            Some(b) => b,
            None => config.block_size()?,
        };

        Ok(Self {
            constraints: StreamConstraints {
                video_device: args.camera.clone().or_else(|| config.camera.device.clone()),
                audio_device: args
                    .audio_input
                    .clone()
                    .or_else(|| config.audio.input.clone()),
                resolution,
                fps: config.camera.fps,
                mirror: args.mirror || config.camera.mirror,
                strict_resolution: config.camera.strict_resolution,
            },
            audio_output: args
                .audio_output
                .clone()
                .or_else(|| config.audio.output.clone()),
            block,
            rate: TickRate::from_fps(args.fps.unwrap_or(config.render.fps)),
            status_bar: config.ui.status_bar && !args.no_status,
            headless: args.headless,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Resolution;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["pixelcam"]);
        let settings = RunSettings::resolve(&args, &Config::default()).unwrap();
        assert_eq!(settings.block, BlockSize::DEFAULT);
        assert_eq!(settings.rate, TickRate::Continuous);
        assert_eq!(settings.constraints.resolution, Resolution::new(640, 640));
        assert_eq!(settings.constraints.video_device, None);
        assert!(settings.status_bar);
        assert!(!settings.headless);
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::from_toml(
            "[camera]\ndevice = \"0\"\nresolution = \"320x240\"\n\
             [pixelate]\nblock_size = 4\n[render]\nfps = 10\n\
             [audio]\noutput = \"Speakers\"\n",
        )
        .unwrap();
        let args = Args::parse_from([
            "pixelcam",
            "--camera",
            "2",
            "--block-size",
            "32",
            "--fps",
            "0",
            "--no-status",
        ]);
        let settings = RunSettings::resolve(&args, &config).unwrap();
        assert_eq!(settings.constraints.video_device.as_deref(), Some("2"));
        assert_eq!(settings.constraints.resolution, Resolution::new(320, 240));
        assert_eq!(settings.block.get(), 32);
        assert_eq!(settings.rate, TickRate::Continuous);
        assert_eq!(settings.audio_output.as_deref(), Some("Speakers"));
        assert!(!settings.status_bar);
    }

    #[test]
    fn test_config_values_used_without_flags() {
        let config = Config::from_toml("[render]\nfps = 15\n[camera]\nmirror = true\n").unwrap();
        let args = Args::parse_from(["pixelcam"]);
        let settings = RunSettings::resolve(&args, &config).unwrap();
        assert_eq!(settings.rate, TickRate::Fps(15));
        assert!(settings.constraints.mirror);
    }
}
