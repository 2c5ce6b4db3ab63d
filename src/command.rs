//! Command definitions: named parameters with types, turned into a parser.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches};
use serde::Serialize;
use url::Url;

use crate::argparser::{
    ArgType, ArgumentParser, ArgumentParserError, ArgumentParserExit, ConversionError,
    HelpAction, Param, ParamKind, ParseError, Value, arg_name, multitype_conv, type_conv,
};
use crate::tabs::TabOpener;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while turning a command line into a [`ParsedCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The line was empty after stripping.
    EmptyLine,
    /// A quote was opened and never closed.
    UnbalancedQuotes,
    /// No command with that name is registered.
    NoSuchCommand(String),
    /// The tokens did not fit the command's arguments.
    Parse(ArgumentParserError),
    /// A token could not be converted.
    Conversion(ConversionError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLine => f.write_str("No command given"),
            Self::UnbalancedQuotes => f.write_str("Unbalanced quotes in command line"),
            Self::NoSuchCommand(name) => write!(f, "{name}: no such command"),
            Self::Parse(e) => e.fmt(f),
            Self::Conversion(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Conversion(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArgumentParserError> for CommandError {
    fn from(e: ArgumentParserError) -> Self {
        Self::Parse(e)
    }
}

impl From<ConversionError> for CommandError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

impl From<CommandError> for crate::error::AppError {
    fn from(e: CommandError) -> Self {
        use crate::error::ExitCode;
        let code = match &e {
            CommandError::EmptyLine
            | CommandError::UnbalancedQuotes
            | CommandError::NoSuchCommand(_)
            | CommandError::Parse(_) => ExitCode::UsageError,
            CommandError::Conversion(c) if c.is_user_error() => ExitCode::ArgumentError,
            CommandError::Conversion(_) => ExitCode::DefinitionError,
        };
        Self {
            message: e.to_string(),
            code,
        }
    }
}

// =============================================================================
// Parameter specs
// =============================================================================

/// A parameter plus everything needed to parse and convert it.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub param: Param,
    /// One type, or several tried in order.
    pub types: Vec<ArgType>,
    /// Accepted values for `str` conversion.
    pub choices: Option<Vec<String>>,
    pub short: Option<char>,
    pub help: String,
}

impl ParamSpec {
    fn new(name: &str, kind: ParamKind, types: Vec<ArgType>) -> Self {
        Self {
            param: Param::new(name, kind),
            types,
            choices: None,
            short: None,
            help: String::new(),
        }
    }

    #[must_use]
    pub fn positional(name: &str, types: impl Into<Vec<ArgType>>) -> Self {
        Self::new(name, ParamKind::Positional, types.into())
    }

    /// `--name VALUE`; optional once a default is set.
    #[must_use]
    pub fn option(name: &str, types: impl Into<Vec<ArgType>>) -> Self {
        Self::new(name, ParamKind::Option, types.into())
    }

    /// `--name` flag; converts to `Bool`.
    #[must_use]
    pub fn switch(name: &str) -> Self {
        let mut spec = Self::new(name, ParamKind::Switch, Vec::new());
        spec.param.default = Some(Value::Bool(false));
        spec
    }

    /// Every remaining token, joined with single spaces.
    #[must_use]
    pub fn remainder(name: &str) -> Self {
        Self::new(name, ParamKind::Remainder, vec![ArgType::Str])
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.param.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.param.default = Some(Value::None);
        self
    }

    #[must_use]
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Single-letter alias; only options and switches have one.
    #[must_use]
    pub const fn short(mut self, short: char) -> Self {
        debug_assert!(
            matches!(self.param.kind, ParamKind::Option | ParamKind::Switch),
            "only options and switches take a short flag"
        );
        self.short = Some(short);
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    fn to_arg(&self) -> Arg {
        let name = arg_name(&self.param.name);
        let required = self.param.default.is_none();
        let mut arg = Arg::new(self.param.name.clone()).help(self.help.clone());

        arg = match self.param.kind {
            ParamKind::Positional => arg
                .value_name(name)
                .required(required)
                .action(ArgAction::Set),
            ParamKind::Option => arg
                .long(name.clone())
                .value_name(name)
                .required(required)
                .action(ArgAction::Set),
            ParamKind::Switch => arg.long(name).action(ArgAction::SetTrue),
            ParamKind::Remainder => arg
                .value_name(name)
                .required(required)
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        };
        if let (Some(short), ParamKind::Option | ParamKind::Switch) =
            (self.short, self.param.kind)
        {
            arg = arg.short(short);
        }
        arg
    }

    fn convert(&self, matches: &ArgMatches) -> Result<Value, ConversionError> {
        let id = self.param.name.as_str();
        let raw = match self.param.kind {
            ParamKind::Switch => return Ok(Value::Bool(matches.get_flag(id))),
            ParamKind::Remainder => matches
                .get_many::<String>(id)
                .map(|parts| parts.map(String::as_str).collect::<Vec<_>>().join(" ")),
            ParamKind::Positional | ParamKind::Option => matches.get_one::<String>(id).cloned(),
        };

        let choices = self.choices.as_deref();
        match self.types.as_slice() {
            [single] => type_conv(&self.param, single, raw.as_deref(), choices),
            types => multitype_conv(&self.param, types, raw.as_deref(), choices),
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Outcome of parsing a command's arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Arguments parsed and converted; the command should run.
    Run(ParsedCommand),
    /// A help flag stopped parsing; the command should not run.
    Help(ArgumentParserExit),
}

/// A command name with its converted arguments, keyed by parameter name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCommand {
    pub command: String,
    pub args: BTreeMap<String, Value>,
}

/// A registered command.
#[derive(Debug)]
pub struct Command {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    parser: ArgumentParser,
}

impl Command {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            docs: None,
            help_base: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[must_use]
    pub fn usage(&self) -> String {
        self.parser.usage()
    }

    /// # Errors
    ///
    /// Fails only if the configured help base cannot be parsed.
    pub fn help_url(&self) -> Result<Url, url::ParseError> {
        self.parser.help_url()
    }

    /// Parse and convert `tokens` (the words after the command name).
    ///
    /// # Errors
    ///
    /// - [`CommandError::Parse`] if the tokens do not fit the parameters
    /// - [`CommandError::Conversion`] if a value does not convert
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Outcome, CommandError> {
        let matches = match self.parser.parse_args(tokens) {
            Ok(matches) => matches,
            Err(ParseError::Exit(exit)) => return Ok(Outcome::Help(exit)),
            Err(ParseError::Error(e)) => return Err(e.into()),
        };

        let mut args = BTreeMap::new();
        for spec in &self.params {
            let value = spec.convert(&matches)?;
            args.insert(spec.param.name.clone(), value);
        }
        tracing::debug!(command = %self.name, ?args, "arguments converted");

        Ok(Outcome::Run(ParsedCommand {
            command: self.name.clone(),
            args,
        }))
    }
}

/// Builder for [`Command`].
pub struct CommandBuilder {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    docs: Option<Arc<dyn TabOpener>>,
    help_base: Option<Url>,
}

impl CommandBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Make `-h/--help` open the command's documentation page through
    /// `opener`. Without this, help only renders the usage text.
    #[must_use]
    pub fn docs(mut self, opener: Arc<dyn TabOpener>) -> Self {
        self.docs = Some(opener);
        self
    }

    #[must_use]
    pub fn help_base(mut self, base: Option<Url>) -> Self {
        self.help_base = base;
        self
    }

    #[must_use]
    pub fn build(self) -> Command {
        let mut parser = ArgumentParser::new(self.name.clone());
        parser.about(self.description.clone());
        if let Some(base) = self.help_base {
            parser.help_base(base);
        }
        let help = match self.docs {
            Some(opener) => HelpAction::OpenDocs(opener),
            None => HelpAction::Exit,
        };
        parser.add_help("help", Some('h'), help);
        for spec in &self.params {
            parser.add_argument(spec.to_arg());
        }

        Command {
            name: self.name,
            description: self.description,
            params: self.params,
            parser,
        }
    }
}
