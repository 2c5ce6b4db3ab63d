//! Built-in browser commands.

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::ValueEnum;
use url::Url;

use crate::argparser::{ArgType, EnumType};
use crate::command::{Command, ParamSpec};
use crate::tabs::TabOpener;

/// Scroll targets accepted by `scroll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
}

/// Commands by name.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: BTreeMap<String, Command>,
}

impl CommandTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any command already registered under the same name.
    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name().to_owned(), command);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The built-in commands. Their `--help` opens the documentation page
    /// through `docs`, under `help_base` when given.
    #[must_use]
    pub fn builtin(docs: &Arc<dyn TabOpener>, help_base: Option<&Url>) -> Self {
        let builder = |name: &str| {
            Command::builder(name)
                .docs(Arc::clone(docs))
                .help_base(help_base.cloned())
        };

        let mut table = Self::new();

        table.register(
            builder("open")
                .description("Open a URL in the current or a new tab")
                .param(ParamSpec::switch("tab").short('t').help("Open in a new tab"))
                .param(ParamSpec::switch("bg").short('b').help("Open in a background tab"))
                .param(ParamSpec::switch("window").short('w').help("Open in a new window"))
                .param(ParamSpec::remainder("url").help("URL or search terms"))
                .build(),
        );

        table.register(
            builder("tab-focus")
                .description("Select the tab given as argument, or the last one")
                .param(
                    ParamSpec::positional("index", [ArgType::Int, ArgType::Str])
                        .choices(["last"])
                        .optional()
                        .help("Tab index, or 'last' for the last focused tab"),
                )
                .build(),
        );

        table.register(
            builder("zoom")
                .description("Set the zoom level for the current tab")
                .param(
                    ParamSpec::positional("level", [ArgType::Int])
                        .optional()
                        .help("Zoom percentage"),
                )
                .build(),
        );

        table.register(
            builder("scroll")
                .description("Scroll the current tab in the given direction")
                .param(
                    ParamSpec::positional("direction", [ArgType::Enum(EnumType::of::<Direction>())])
                        .help("Where to scroll"),
                )
                .param(
                    ParamSpec::option("count", [ArgType::Int])
                        .short('c')
                        .default(1_i64)
                        .help("How many times to scroll"),
                )
                .build(),
        );

        table.register(
            builder("set-cmd-text")
                .description("Preset the statusbar to some text")
                .param(ParamSpec::switch("space").short('s').help("Append a space"))
                .param(ParamSpec::remainder("text").help("The text to set"))
                .build(),
        );

        table.register(
            builder("tab-close")
                .description("Close the current tab")
                .param(
                    ParamSpec::option("select", [ArgType::Str])
                        .choices(["left", "right", "last"])
                        .optional()
                        .help("Which tab to focus afterwards"),
                )
                .build(),
        );

        table.register(
            builder("help")
                .description("Show help about a command or setting")
                .param(
                    ParamSpec::positional("topic", [ArgType::Str])
                        .optional()
                        .help("Command (prefixed with ':') or setting"),
                )
                .build(),
        );

        table
    }
}
