//! Subcommand dispatch with nested command sets
//!
//! A [`set::CommandSet`] maps names to [`command::Command`]s. Parsing an argument list against a
//! set selects at most one command by its first argument and records the arguments following it.
//! Every command owns a nested set of its own, so dispatch continues one level at a time: a
//! command consumes its flags, then parses whatever the flag parser leaves over against its
//! subcommands.

pub mod command;
pub mod flags;
pub mod set;

use thiserror::Error;

/// Error type returned by run handlers and flag parsers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while registering, parsing or running commands
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("empty command name")]
    EmptyName,
    #[error("duplicate command '{0}'")]
    DuplicateName(String),
    #[error("command '{0}' was already parsed")]
    AlreadyParsed(String),
    #[error("not parsed yet")]
    NotParsed,
    #[error("no command selected")]
    NoCommandSelected,
    #[error("command '{0}' is not runnable")]
    NoRunHandler(String),
    #[error("invalid flags for '{command}': {source}")]
    Flags {
        command: String,
        #[source]
        source: BoxError,
    },
    #[error("command '{command}' failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        insta::assert_snapshot!(DispatchError::EmptyName, @"empty command name");
        insta::assert_snapshot!(
            DispatchError::DuplicateName("build".to_string()),
            @"duplicate command 'build'"
        );
        insta::assert_snapshot!(
            DispatchError::NoRunHandler("group".to_string()),
            @"command 'group' is not runnable"
        );
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let err = DispatchError::Handler {
            command: "deploy".to_string(),
            source: "connection refused".into(),
        };
        insta::assert_snapshot!(err, @"command 'deploy' failed: connection refused");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection refused"));
    }
}
