//! Flag parsing for commands
//!
//! Dispatch treats flag parsing as an opaque capability: a [`FlagSet`] consumes the options it
//! understands and reports the arguments it leaves over. [`ClapFlags`] provides one on top of a
//! `clap::Command`.

use std::any::Any;

use clap::{Arg, ArgMatches};

use crate::commands::BoxError;

/// A parser for a command's own flags
pub trait FlagSet: Any {
    /// Parse `args`, consuming the flags this parser knows about.
    ///
    /// # Errors
    ///
    /// Returns the parser's own error if `args` contain invalid flags.
    fn parse(&mut self, args: &[String]) -> Result<(), BoxError>;

    /// The `i`th argument left over after parsing
    fn arg(&self, i: usize) -> Option<&str> {
        self.args().get(i).map(String::as_str)
    }

    /// All arguments left over after parsing
    fn args(&self) -> &[String];
}

/// Id of the hidden positional collecting everything after the flags
const REMAINING: &str = "__cmdset_remaining";

/// A [`FlagSet`] backed by clap
///
/// Flags are parsed by the wrapped `clap::Command`. The first argument that is not a flag, and
/// everything after it, is left over for nested dispatch.
#[derive(Debug)]
pub struct ClapFlags {
    command: clap::Command,
    matches: Option<ArgMatches>,
    remaining: Vec<String>,
}

impl ClapFlags {
    #[must_use]
    pub fn new(command: clap::Command) -> Self {
        let command = command.arg(
            Arg::new(REMAINING)
                .num_args(1..)
                .trailing_var_arg(true)
                .hide(true),
        );
        Self {
            command,
            matches: None,
            remaining: Vec::new(),
        }
    }

    /// Matches of the last successful parse
    #[must_use]
    pub fn matches(&self) -> Option<&ArgMatches> {
        self.matches.as_ref()
    }
}

impl FlagSet for ClapFlags {
    fn parse(&mut self, args: &[String]) -> Result<(), BoxError> {
        let bin_name = self.command.get_name().to_string();
        let matches = self
            .command
            .try_get_matches_from_mut(std::iter::once(bin_name).chain(args.iter().cloned()))?;
        self.remaining = matches
            .get_many::<String>(REMAINING)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        self.matches = Some(matches);
        Ok(())
    }

    fn args(&self) -> &[String] {
        &self.remaining
    }
}

#[cfg(test)]
mod tests {
    use clap::ArgAction;

    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    fn build_flags() -> ClapFlags {
        ClapFlags::new(
            clap::Command::new("build")
                .arg(
                    Arg::new("release")
                        .long("release")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("jobs").short('j').long("jobs")),
        )
    }

    #[test]
    fn test_flags_then_remaining() {
        let mut flags = build_flags();
        flags
            .parse(&strings(&["--release", "-j", "4", "test", "--nocapture"]))
            .unwrap();
        assert_eq!(flags.args(), ["test", "--nocapture"]);
        assert_eq!(flags.arg(0), Some("test"));
        assert_eq!(flags.arg(2), None);

        let matches = flags.matches().unwrap();
        assert!(matches.get_flag("release"));
        assert_eq!(
            matches.get_one::<String>("jobs").map(String::as_str),
            Some("4")
        );
    }

    #[test]
    fn test_no_remaining() {
        let mut flags = build_flags();
        flags.parse(&strings(&["--release"])).unwrap();
        assert!(flags.args().is_empty());
        assert_eq!(flags.arg(0), None);
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        let mut flags = build_flags();
        assert!(flags.parse(&strings(&["--bogus"])).is_err());
        assert!(flags.matches().is_none());
    }
}
