//! Command-line interface definitions and helpers.

mod args;
mod commands;
mod settings;

pub use args::{Args, Command, ConfigAction};
pub use commands::{handle_config_action, init_config, list_devices};
pub use settings::RunSettings;
