use std::any::Any;
use std::ffi::OsString;
use std::fmt;

use log::{debug, trace};

use crate::commands::flags::FlagSet;
use crate::commands::set::CommandSet;
use crate::commands::{BoxError, DispatchError};

/// Handler invoked with the command and the arguments remaining after its name
pub type RunFn = Box<dyn FnMut(&mut Command, &[String]) -> Result<(), BoxError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParseState {
    #[default]
    Unparsed,
    Parsed,
    /// The flag parser rejected the arguments
    Failed,
}

/// A named node in the command tree
///
/// A command optionally parses its own flags, optionally runs a handler, and always owns a
/// (possibly empty) set of subcommands.
pub struct Command {
    name: String,
    short: String,
    long: String,
    flags: Option<Box<dyn FlagSet>>,
    handler: Option<RunFn>,
    sub: CommandSet,
    state: ParseState,
}

impl Command {
    pub(crate) fn new(name: &str, short: &str, long: &str) -> Self {
        Command {
            name: name.to_string(),
            short: short.to_string(),
            long: long.to_string(),
            flags: None,
            handler: None,
            sub: CommandSet::new(),
            state: ParseState::Unparsed,
        }
    }

    /// Create the root command of a program, usually named after the binary.
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self::new(name, "", "")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn short(&self) -> &str {
        &self.short
    }

    #[must_use]
    pub fn long(&self) -> &str {
        &self.long
    }

    /// Register a subcommand below this command.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::EmptyName` or `DispatchError::DuplicateName`, see
    /// [`CommandSet::register`].
    pub fn register_sub(
        &mut self,
        name: &str,
        short: &str,
        long: &str,
    ) -> Result<&mut Command, DispatchError> {
        self.sub.register(name, short, long)
    }

    #[must_use]
    pub fn subcommands(&self) -> &CommandSet {
        &self.sub
    }

    pub fn subcommands_mut(&mut self) -> &mut CommandSet {
        &mut self.sub
    }

    pub fn set_flags<F: FlagSet>(&mut self, flags: F) -> &mut Self {
        self.flags = Some(Box::new(flags));
        self
    }

    #[must_use]
    pub fn flags(&self) -> Option<&dyn FlagSet> {
        self.flags.as_deref()
    }

    /// The attached flag parser, if it is a `T`
    #[must_use]
    pub fn flags_as<T: FlagSet>(&self) -> Option<&T> {
        let flags: &dyn Any = self.flags.as_deref()?;
        flags.downcast_ref()
    }

    pub fn set_run<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&mut Command, &[String]) -> Result<(), BoxError> + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.handler.is_some()
    }

    /// Parse this command's flags, then select a subcommand with what the flags leave over.
    ///
    /// Without a flag parser the arguments go to the subcommands unchanged. Once parsed
    /// successfully, later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Flags` if the flag parser rejects `args`, and
    /// `DispatchError::AlreadyParsed` when called again after such a failure.
    pub fn parse<I, T>(&mut self, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        match self.state {
            ParseState::Parsed => {
                trace!("Command '{}' already parsed", self.name);
                return Ok(());
            }
            ParseState::Failed => return Err(DispatchError::AlreadyParsed(self.name.clone())),
            ParseState::Unparsed => {}
        }

        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.state = ParseState::Failed;
        let remaining = match self.flags.as_mut() {
            Some(flags) => {
                flags.parse(&args).map_err(|source| DispatchError::Flags {
                    command: self.name.clone(),
                    source,
                })?;
                flags.args().to_vec()
            }
            None => args,
        };
        self.state = ParseState::Parsed;

        self.sub.parse(remaining);
        Ok(())
    }

    /// Parse the process arguments, without the program name.
    ///
    /// # Errors
    ///
    /// See [`Command::parse`].
    pub fn parse_env(&mut self) -> Result<(), DispatchError> {
        self.parse_os(std::env::args_os().skip(1))
    }

    /// Parse OS strings, replacing invalid UTF-8 with `U+FFFD`.
    ///
    /// # Errors
    ///
    /// See [`Command::parse`].
    pub fn parse_os<I>(&mut self, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = OsString>,
    {
        self.parse(
            args.into_iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        )
    }

    #[must_use]
    pub fn parsed(&self) -> bool {
        self.state != ParseState::Unparsed
    }

    /// Run the subcommand selected by [`Command::parse`].
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotParsed` if this command was never parsed, otherwise see
    /// [`CommandSet::execute`].
    pub fn execute(&mut self) -> Result<(), DispatchError> {
        if !self.parsed() {
            return Err(DispatchError::NotParsed);
        }
        self.sub.execute()
    }

    /// Parse `args` and run the selected subcommand.
    ///
    /// # Errors
    ///
    /// See [`Command::parse`] and [`Command::execute`].
    pub fn parse_and_run<I, T>(&mut self, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.parse(args)?;
        self.execute()
    }

    /// Call the run handler with `args`.
    pub(crate) fn invoke(&mut self, args: &[String]) -> Result<(), DispatchError> {
        let Some(mut handler) = self.handler.take() else {
            return Err(DispatchError::NoRunHandler(self.name.clone()));
        };
        debug!("Running command '{}' with {args:?}", self.name);
        let result = handler(self, args);
        // Keep a replacement installed by the handler itself
        if self.handler.is_none() {
            self.handler = Some(handler);
        }
        result.map_err(|source| DispatchError::Handler {
            command: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("long", &self.long)
            .field("has_flags", &self.flags.is_some())
            .field("runnable", &self.handler.is_some())
            .field("sub", &self.sub)
            .field("state", &self.state)
            .finish()
    }
}

/// Run handler that continues dispatch below `cmd`.
///
/// Attach it with [`Command::set_run`] to commands that only group subcommands.
///
/// # Errors
///
/// Returns the `DispatchError` of parsing or running the nested command.
pub fn dispatch_nested(cmd: &mut Command, args: &[String]) -> Result<(), BoxError> {
    cmd.parse_and_run(args.iter().cloned())?;
    Ok(())
}
