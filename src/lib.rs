//! Nested subcommand dispatch for command-line programs
//!
//! Programs register named commands on a root [`Command`], parse their arguments to select one,
//! and run the selected command's handler with the arguments that follow its name. A command can
//! parse its own flags and own further subcommands, so dispatch can continue level by level.
//!
//! ```
//! use cmdset::Command;
//!
//! let mut root = Command::root("tool");
//! root.register_sub("greet", "Print a greeting", "")?
//!     .set_run(|_, args| {
//!         println!("hello {}", args.join(" "));
//!         Ok(())
//!     });
//! root.parse_and_run(["greet", "world"])?;
//! # Ok::<(), cmdset::DispatchError>(())
//! ```

use std::path::PathBuf;

use log::debug;

use crate::config_file::{Config, ConfigError};

pub mod commands;
pub mod config_file;
pub mod logger;

pub use commands::command::{Command, RunFn, dispatch_nested};
pub use commands::flags::{ClapFlags, FlagSet};
pub use commands::set::CommandSet;
pub use commands::{BoxError, DispatchError};

/// Load configuration from a file (or auto-detect), returning it with the directory containing it.
///
/// # Errors
///
/// Returns `ConfigError` if the config file is not found or cannot be parsed.
pub fn load_config(config_file: Option<&str>) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            let config_path = PathBuf::from(file);
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            config_path
        }
        None => Config::find_config()?,
    };
    let cwd = config_path
        .parent()
        .ok_or_else(|| ConfigError::ConfigNotFound(config_path.clone()))?
        .to_path_buf();
    debug!(
        "Loading commands from config file: {} (cwd: {})",
        config_path.display(),
        cwd.display()
    );
    let config = Config::from_file(&config_path)?;
    Ok((config, cwd))
}
