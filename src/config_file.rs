//! Declarative command trees loaded from YAML or JSON

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::DispatchError;
use crate::commands::command::Command;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found in current directory or its parents: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Invalid command `{entry}`: {source}")]
    Command {
        entry: String,
        #[source]
        source: DispatchError,
    },
}

/// Configuration for a single command and its subcommands
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ConfigCommand {
    pub name: String,
    pub short: Option<String>,
    pub long: Option<String>,
    /// Shell script run when this command is selected
    pub cmd: Option<String>,
    pub env: Option<HashMap<String, String>>,
    pub commands: Option<Vec<ConfigCommand>>,
}

/// Root configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Program name, used as the root command's name
    pub name: String,
    #[serde(default)]
    pub commands: Vec<ConfigCommand>,
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = [".cmdset.json", ".cmdset.yaml", ".cmdset.yml"];

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        let config: Config = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        Ok(config)
    }

    /// Searches for a configuration file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `ConfigError::ConfigNotFound` if no config file is found.
    pub fn find_config() -> Result<PathBuf, ConfigError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        Self::find_config_from(&cwd)
    }

    /// Searches for a configuration file in `start` and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if no config file is found.
    pub fn find_config_from(start: &Path) -> Result<PathBuf, ConfigError> {
        let mut path = start.to_path_buf();
        debug!("Searching for config file in {}", start.display());
        loop {
            for file in &FILENAMES {
                let config_path = path.join(file);
                if config_path.exists() {
                    info!("Found config file: {}", config_path.display());
                    return Ok(config_path);
                }
            }
            if !path.pop() {
                return Err(ConfigError::ConfigNotFound(start.to_path_buf()));
            }
        }
    }

    /// Register the configured commands under a new root command.
    ///
    /// `attach` is called once for every entry, right after it is registered, so the caller can
    /// set run handlers or flag parsers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Command` if an entry has an empty or duplicate name.
    pub fn build<F>(&self, mut attach: F) -> Result<Command, ConfigError>
    where
        F: FnMut(&mut Command, &ConfigCommand),
    {
        let mut root = Command::root(&self.name);
        let mut entry_path = Vec::new();
        register_all(&mut root, &self.commands, &mut entry_path, &mut attach)?;
        Ok(root)
    }
}

fn register_all<F>(
    parent: &mut Command,
    entries: &[ConfigCommand],
    entry_path: &mut Vec<String>,
    attach: &mut F,
) -> Result<(), ConfigError>
where
    F: FnMut(&mut Command, &ConfigCommand),
{
    for entry in entries {
        entry_path.push(entry.name.clone());
        let command = parent
            .register_sub(
                &entry.name,
                entry.short.as_deref().unwrap_or_default(),
                entry.long.as_deref().unwrap_or_default(),
            )
            .map_err(|source| ConfigError::Command {
                entry: entry_path.join("."),
                source,
            })?;
        attach(command, entry);
        if let Some(children) = &entry.commands {
            register_all(command, children, entry_path, attach)?;
        }
        entry_path.pop();
    }
    Ok(())
}
