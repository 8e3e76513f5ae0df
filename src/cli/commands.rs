//! Subcommand handlers for list-devices and config actions.

use std::path::{Path, PathBuf};

use super::args::ConfigAction;
use crate::config::{default_path, Config, ConfigError, DEFAULT_CONFIG_TOML};
use crate::devices::{print_devices, DeviceList};
use crate::stream::{DeviceAcquisitionError, MediaBackend, NativeBackend};

/// List available devices and print them to stdout.
pub fn list_devices(video: bool, audio: bool) -> Result<(), DeviceAcquisitionError> {
    let scan = NativeBackend::new().enumerate_devices()?;
    let devices = DeviceList::from_infos(scan.devices);

    if devices.is_empty() {
        println!("No devices found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
        return Ok(());
    }

    print_devices(&devices, video, audio);
    println!();
    if video || !audio {
        println!("Use --camera <id> to select a camera.");
    }
    if audio || !video {
        println!("Use --audio-input / --audio-output <name> to select audio devices.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), ConfigError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&config_path))?;
            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!("# Config file: {} (not found, showing defaults)", config_path.display());
            }
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            init_config(&config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

/// Write the default config to `path`, refusing to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "config file already exists; use 'pixelcam config show' to view it",
            ),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_config(&path).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pixelate]\nblock_size = 3\n").unwrap();

        let err = init_config(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.pixelate.block_size, 3);
    }
}
