#![allow(clippy::doc_markdown)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "keycmd",
    version,
    about = "Typed argument parsing for keyboard-driven browser commands",
    long_about = "keycmd parses the command lines a keyboard-driven browser accepts in its \
        command prompt (':open -t example.com', ':zoom 120') into typed arguments. Each \
        command declares its parameters with types (int, float, str, enums, or unions of \
        those) and optional choices; keycmd validates the tokens, converts them, and reports \
        precise, parameter-prefixed errors.\n\n\
        Every subcommand produces structured JSON on stdout and structured JSON errors on \
        stderr. Passing -h/--help to a browser command opens its documentation page instead \
        of running it.",
    after_long_help = "\
QUICK START:
  # Parse a single command
  keycmd parse ':zoom 120'

  # Chain commands and use quoting
  keycmd parse ':tab-close --select left ;; set-cmd-text -s \":open 'two words'\"'

  # List the built-in commands
  keycmd commands

EXIT CODES:
  0  Success (including help requests)
  1  General error (I/O, serialization)
  2  Usage error (unknown command, unrecognized or missing arguments)
  3  Argument error (a value failed type conversion)
  4  Definition error (a command declares an unsupported type)

ENVIRONMENT VARIABLES:
  KEYCMD_CONFIG  Path to configuration file
  RUST_LOG       Log filter for stderr diagnostics (e.g. keycmd=debug)",
    term_width = 100
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalOpts {
    /// Path to configuration file (overrides default search)
    #[arg(long, global = true, env = "KEYCMD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log parser decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub output: OutputFormat,
}

#[derive(Args)]
#[group(multiple = false)]
pub struct OutputFormat {
    /// Output as compact JSON (mutually exclusive with --pretty, --plain)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output as pretty-printed JSON (mutually exclusive with --json, --plain)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Output as human-readable plain text (mutually exclusive with --json, --pretty)
    #[arg(long, global = true)]
    pub plain: bool,
}

/// Output style after merging flags with the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Pretty,
    Plain,
}

impl OutputFormat {
    /// Flags win; otherwise `configured` (`json`, `pretty` or `plain`).
    #[must_use]
    pub fn resolve(&self, configured: &str) -> Format {
        if self.json {
            Format::Json
        } else if self.pretty {
            Format::Pretty
        } else if self.plain {
            Format::Plain
        } else {
            match configured {
                "pretty" => Format::Pretty,
                "plain" => Format::Plain,
                _ => Format::Json,
            }
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a browser command line and print the typed arguments
    #[command(
        long_about = "Parse a browser command line the way the command prompt does: a leading \
            ':' is optional, ';;' chains several commands, the first word may be an alias from \
            the config file, and shell-style quoting keeps words together. Prints one JSON \
            object per command with its converted arguments, or the documentation URL that \
            was opened when -h/--help was given.",
        after_long_help = "\
EXAMPLES:
  # Integer argument
  keycmd parse ':zoom 120'

  # Enum argument (hyphenated names map to enum members)
  keycmd parse scroll half-page-down --count 3

  # Int-or-string union
  keycmd parse 'tab-focus last'

  # Help opens the documentation page
  keycmd parse 'open --help'"
    )]
    Parse(ParseArgs),

    /// List built-in browser commands and their parameters
    #[command(
        long_about = "List the built-in browser commands with their usage line, description, \
            and parameters (kind, accepted types, choices, default). With a command name, shows \
            only that command.",
        after_long_help = "\
EXAMPLES:
  # All commands
  keycmd commands

  # A single command as plain text
  keycmd commands scroll --plain"
    )]
    Commands(CommandsArgs),

    /// Configuration file management (show, init, path)
    #[command(
        long_about = "Manage the keycmd configuration file. Show the resolved configuration, \
            create a default config file, or display the active config file path. Config files \
            use TOML format and are searched in priority order: --config flag, $KEYCMD_CONFIG \
            env var, project-local, XDG config dir, home directory.",
        after_long_help = "\
EXAMPLES:
  # Show the resolved configuration
  keycmd config show

  # Create a default config file
  keycmd config init

  # Show the active config file path
  keycmd config path"
    )]
    Config(ConfigArgs),

    /// Generate shell completion scripts
    #[command(
        long_about = "Generate shell completion scripts for tab-completion of keycmd \
            subcommands and flags. Pipe the output to the appropriate file for your shell.",
        after_long_help = "\
EXAMPLES:
  # Bash
  keycmd completions bash > /etc/bash_completion.d/keycmd

  # Zsh
  keycmd completions zsh > ~/.zfunc/_keycmd

  # Fish
  keycmd completions fish > ~/.config/fish/completions/keycmd.fish"
    )]
    Completions(CompletionsArgs),
}

/// Arguments for the `parse` subcommand.
#[derive(Args)]
pub struct ParseArgs {
    /// Command line to parse; several words are joined with spaces
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub line: Vec<String>,
}

impl ParseArgs {
    #[must_use]
    pub fn joined(&self) -> String {
        self.line.join(" ")
    }
}

/// Arguments for the `commands` subcommand.
#[derive(Args)]
pub struct CommandsArgs {
    /// Show only this command
    pub name: Option<String>,
}

/// Arguments for the `config` subcommand group.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config management subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration
    Show,

    /// Create a default config file with commented example values
    #[command(
        long_about = "Create a new configuration file with all available settings documented \
            as comments. By default, the file is created at the XDG config directory \
            (~/.config/keycmd/config.toml on Linux). Use --path to specify a custom location. \
            Will not overwrite an existing file."
    )]
    Init(ConfigInitArgs),

    /// Show the active config file path (or null if none)
    Path,
}

/// Arguments for `config init`.
#[derive(Args)]
pub struct ConfigInitArgs {
    /// Create config file at a custom path instead of the default XDG location
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the `completions` subcommand.
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
    pub shell: Shell,
}
