use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

use cmdset::config_file::ConfigCommand;
use cmdset::{BoxError, Command, dispatch_nested};
use log::{debug, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("failed to start `{script}`: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{script}` exited with status {code}")]
    Failed { script: String, code: i32 },
    #[error("`{script}` was terminated by a signal")]
    Killed { script: String },
}

/// A shell script bound to a command
struct Script {
    body: String,
    cwd: PathBuf,
    env: HashMap<String, String>,
}

impl Script {
    /// Run the script with `sh -c`, passing the command name as `$0` and `args` as `$1...`.
    fn run(&self, name: &str, args: &[String]) -> Result<(), ShellError> {
        let mut process = ProcessCommand::new("sh");
        process
            .arg("-c")
            .arg(&self.body)
            .arg(name)
            .args(args)
            .envs(&self.env);
        if !self.cwd.as_os_str().is_empty() {
            process.current_dir(&self.cwd);
        }

        debug!("Running `{}` for '{name}'", self.body);
        let status = process.status().map_err(|source| ShellError::Spawn {
            script: self.body.clone(),
            source,
        })?;
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(ShellError::Failed {
                script: self.body.clone(),
                code,
            }),
            None => Err(ShellError::Killed {
                script: self.body.clone(),
            }),
        }
    }
}

/// Attach a run handler to `cmd` according to its config entry.
///
/// Entries with a script run it; entries with only subcommands continue dispatch below them.
pub fn attach(cmd: &mut Command, entry: &ConfigCommand, cwd: &Path, dry_run: bool) {
    let has_children = entry.commands.as_ref().is_some_and(|c| !c.is_empty());
    match &entry.cmd {
        Some(script) => {
            if has_children {
                warn!(
                    "Command '{}' has both a script and subcommands, subcommands are unreachable",
                    entry.name
                );
            }
            let script = Script {
                body: script.clone(),
                cwd: cwd.to_path_buf(),
                env: entry.env.clone().unwrap_or_default(),
            };
            cmd.set_run(move |cmd, args| -> Result<(), BoxError> {
                if dry_run {
                    println!("{} {}", cmd.name(), shell_words(args));
                    return Ok(());
                }
                script.run(cmd.name(), args)?;
                Ok(())
            });
        }
        None if has_children => {
            cmd.set_run(dispatch_nested);
        }
        None => {}
    }
}

fn shell_words(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("'{arg}'")
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_words_quotes_spaces() {
        let args = vec!["a".to_string(), "b c".to_string(), String::new()];
        assert_eq!(shell_words(&args), "a 'b c' ''");
    }

    #[cfg(unix)]
    #[test]
    fn test_script_receives_args() {
        let dir = tempfile::tempdir().unwrap();
        let script = Script {
            body: "printf '%s|%s' \"$0\" \"$*\" > out.txt".to_string(),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        script
            .run("build", &["--release".to_string(), "x".to_string()])
            .unwrap();
        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out, "build|--release x");
    }

    #[cfg(unix)]
    #[test]
    fn test_script_failure_code() {
        let script = Script {
            body: "exit 3".to_string(),
            cwd: PathBuf::new(),
            env: HashMap::new(),
        };
        match script.run("fail", &[]) {
            Err(ShellError::Failed { code, .. }) => assert_eq!(code, 3),
            other => panic!("Expected Failed, got: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_dry_run_does_not_execute() {
        let dir = tempfile::tempdir().unwrap();
        let entry = ConfigCommand {
            name: "touch".to_string(),
            cmd: Some("touch created".to_string()),
            ..Default::default()
        };
        let mut root = Command::root("tool");
        let cmd = root.register_sub("touch", "", "").unwrap();
        attach(cmd, &entry, dir.path(), true);
        root.parse_and_run(["touch"]).unwrap();
        assert!(!dir.path().join("created").exists());
    }
}
