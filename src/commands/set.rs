use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, trace};

use crate::commands::DispatchError;
use crate::commands::command::Command;

/// A set of named, mutually exclusive commands
///
/// A set is parsed at most once. The first argument selects a command by exact name and the
/// arguments after it are kept for the selected command's handler.
#[derive(Debug, Default)]
pub struct CommandSet {
    commands: HashMap<String, Command>,
    args: Vec<String>,
    parsed: bool,
    selected: Option<String>,
}

impl CommandSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new command and return it for further configuration.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::EmptyName` if `name` is empty, or
    /// `DispatchError::DuplicateName` if a command with that name already exists.
    pub fn register(
        &mut self,
        name: &str,
        short: &str,
        long: &str,
    ) -> Result<&mut Command, DispatchError> {
        if name.is_empty() {
            return Err(DispatchError::EmptyName);
        }
        match self.commands.entry(name.to_string()) {
            Entry::Occupied(_) => Err(DispatchError::DuplicateName(name.to_string())),
            Entry::Vacant(entry) => {
                debug!("Registered command '{name}'");
                Ok(entry.insert(Command::new(name, short, long)))
            }
        }
    }

    /// Select a command using the first argument.
    ///
    /// Only the first call does any work; later calls return the selection made then, whatever
    /// arguments they are given.
    pub fn parse<I, T>(&mut self, args: I) -> Option<&Command>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if self.parsed {
            trace!("Command set already parsed, keeping previous selection");
            return self.selected();
        }
        self.parsed = true;

        let mut args = args.into_iter().map(Into::into);
        let Some(name) = args.next() else {
            debug!("No arguments, nothing selected");
            return None;
        };

        if self.commands.contains_key(&name) {
            self.args = args.collect();
            debug!(
                "Selected command '{name}' with {} remaining argument(s)",
                self.args.len()
            );
            self.selected = Some(name);
        } else {
            debug!("No command matches '{name}'");
        }
        self.selected()
    }

    /// Run the selected command's handler with the remaining arguments.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotParsed` if [`CommandSet::parse`] was never called,
    /// `DispatchError::NoCommandSelected` if no command matched,
    /// `DispatchError::NoRunHandler` if the selected command has no handler, or
    /// `DispatchError::Handler` if the handler fails.
    pub fn execute(&mut self) -> Result<(), DispatchError> {
        let Self {
            commands,
            args,
            parsed,
            selected,
        } = self;
        if !*parsed {
            return Err(DispatchError::NotParsed);
        }
        let command = selected
            .as_deref()
            .and_then(|name| commands.get_mut(name))
            .ok_or(DispatchError::NoCommandSelected)?;
        command.invoke(args)
    }

    /// Parse `args` (if not parsed yet) and run the selected command.
    ///
    /// # Errors
    ///
    /// Same as [`CommandSet::execute`], except that `NotParsed` cannot occur.
    pub fn parse_and_run<I, T>(&mut self, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.parse(args);
        self.execute()
    }

    #[must_use]
    pub fn parsed(&self) -> bool {
        self.parsed
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Command> {
        self.selected
            .as_deref()
            .and_then(|name| self.commands.get(name))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Command> {
        self.selected
            .as_deref()
            .and_then(|name| self.commands.get_mut(name))
    }

    /// Arguments following the selected command's name
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.get_mut(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the registered commands in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }
}
