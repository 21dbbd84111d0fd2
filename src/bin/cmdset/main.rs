mod shell;

use std::fmt::Write;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use cmdset::{Command, CommandSet, DispatchError, load_config};

#[derive(Parser, Debug)]
#[command(name = "cmdset", about = "Dispatch subcommands declared in a config file")]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    /// Log file path (logs also go to stderr)
    #[arg(long)]
    log_file: Option<String>,

    /// Print the selected command and its arguments instead of running it
    #[arg(long)]
    dry_run: bool,

    /// List the declared commands and exit
    #[arg(long)]
    list: bool,

    /// Command to dispatch, followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    cmdset::logger::init(log_file)?;

    let (config, cwd) = load_config(cli.config.as_deref())?;
    let dry_run = cli.dry_run;
    let mut root = config.build(|cmd, entry| shell::attach(cmd, entry, &cwd, dry_run))?;

    if cli.list {
        print!("{}", render_tree(root.subcommands()));
        return Ok(ExitCode::SUCCESS);
    }

    debug!("Dispatching {:?}", cli.args);
    match root.parse_and_run(cli.args) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match unmatched_level(&root, &e) {
            Some(set) => {
                eprintln!("No matching command. Available commands:");
                eprint!("{}", render_tree(set));
                Ok(ExitCode::FAILURE)
            }
            None => Err(e.into()),
        },
    }
}

/// The set in which dispatch found no matching command, following nested handler errors down
fn unmatched_level<'a>(root: &'a Command, err: &DispatchError) -> Option<&'a CommandSet> {
    let mut set = root.subcommands();
    let mut err = err;
    loop {
        match err {
            DispatchError::NoCommandSelected => return Some(set),
            DispatchError::Handler { command, source } => {
                set = set.get(command)?.subcommands();
                err = source.downcast_ref::<DispatchError>()?;
            }
            _ => return None,
        }
    }
}

/// Indented listing of `set` and everything below it, sorted by name
fn render_tree(set: &CommandSet) -> String {
    let mut out = String::new();
    render_level(set, 0, &mut out);
    out
}

fn render_level(set: &CommandSet, depth: usize, out: &mut String) {
    let mut commands: Vec<_> = set.iter().collect();
    commands.sort_by(|a, b| a.name().cmp(b.name()));
    for cmd in commands {
        let indent = "  ".repeat(depth + 1);
        if cmd.short().is_empty() {
            let _ = writeln!(out, "{indent}{}", cmd.name());
        } else {
            let _ = writeln!(out, "{indent}{:<16} {}", cmd.name(), cmd.short());
        }
        render_level(cmd.subcommands(), depth + 1, out);
    }
}
