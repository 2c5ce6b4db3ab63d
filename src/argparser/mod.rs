//! Argument parsing for interactive browser commands.
//!
//! [`ArgumentParser`] wraps a [`clap::Command`] so that parse failures and
//! help requests come back as values instead of printing and terminating the
//! process. The [`convert`] submodule turns the raw tokens it collects into
//! typed [`Value`]s.

pub mod convert;
pub mod error;

use std::fmt;
use std::sync::Arc;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, ColorChoice};
use url::Url;

use crate::tabs::TabOpener;

pub use convert::{
    ArgType, EnumType, EnumValue, Param, ParamKind, Value, arg_name, convert_enum,
    multitype_conv, type_conv,
};
pub use error::{
    ArgumentParserError, ArgumentParserExit, ArgumentTypeError, ConversionError, ParseError,
};

/// Page that documents every command; the command name is the fragment.
pub const DEFAULT_HELP_BASE: &str = "qute://help/commands.html";

/// What a help flag does when it is given.
#[derive(Clone)]
pub enum HelpAction {
    /// Stop parsing with status 0 and the rendered help text.
    Exit,
    /// Open the command's documentation page in a new tab, then stop with
    /// status 0.
    OpenDocs(Arc<dyn TabOpener>),
}

impl fmt::Debug for HelpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit => f.write_str("Exit"),
            Self::OpenDocs(_) => f.write_str("OpenDocs(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct HelpFlag {
    long: String,
    short: Option<char>,
    action: HelpAction,
}

impl HelpFlag {
    /// `--<long>`, or a short cluster made only of registered `switches`
    /// that includes this flag's short name.
    fn matches(&self, token: &str, switches: &[char]) -> bool {
        if token.strip_prefix("--") == Some(self.long.as_str()) {
            return true;
        }
        let (Some(short), Some(cluster)) = (self.short, token.strip_prefix('-')) else {
            return false;
        };
        !cluster.is_empty()
            && !cluster.starts_with('-')
            && cluster.contains(short)
            && cluster.chars().all(|c| switches.contains(&c))
    }
}

/// Parser for the arguments of a single command.
#[derive(Debug)]
pub struct ArgumentParser {
    name: String,
    command: clap::Command,
    help_flags: Vec<HelpFlag>,
    help_base: Option<Url>,
}

impl ArgumentParser {
    /// Create a parser for the command `name`, with no arguments and no help
    /// flag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let command = clap::Command::new(name.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .allow_negative_numbers(true)
            .color(ColorChoice::Never);
        Self {
            name,
            command,
            help_flags: Vec::new(),
            help_base: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the one-line description shown in rendered help.
    pub fn about(&mut self, about: impl Into<String>) -> &mut Self {
        self.command = std::mem::take(&mut self.command).about(about.into());
        self
    }

    /// Use `base` instead of [`DEFAULT_HELP_BASE`] for documentation links.
    pub fn help_base(&mut self, base: Url) -> &mut Self {
        self.help_base = Some(base);
        self
    }

    pub fn add_argument(&mut self, arg: Arg) -> &mut Self {
        self.command = std::mem::take(&mut self.command).arg(arg);
        self
    }

    /// Register `--<long>` (and `-<short>`) as a help flag.
    pub fn add_help(&mut self, long: &str, short: Option<char>, action: HelpAction) -> &mut Self {
        let mut arg = Arg::new(long.to_owned())
            .long(long.to_owned())
            .help("Show help for this command");
        if let Some(short) = short {
            arg = arg.short(short);
        }
        arg = match action {
            HelpAction::Exit => arg.action(ArgAction::Help),
            HelpAction::OpenDocs(_) => arg.action(ArgAction::SetTrue),
        };
        self.help_flags.push(HelpFlag {
            long: long.to_owned(),
            short,
            action,
        });
        self.add_argument(arg)
    }

    /// URL of this command's documentation page.
    ///
    /// # Errors
    ///
    /// Fails only if the default base URL cannot be parsed.
    pub fn help_url(&self) -> Result<Url, url::ParseError> {
        let mut url = match &self.help_base {
            Some(base) => base.clone(),
            None => Url::parse(DEFAULT_HELP_BASE)?,
        };
        url.set_fragment(Some(&self.name));
        Ok(url)
    }

    /// Usage line, e.g. `open [OPTIONS] <url>...`.
    #[must_use]
    pub fn usage(&self) -> String {
        let usage = self.command.clone().render_usage().to_string();
        usage
            .strip_prefix("Usage: ")
            .unwrap_or(&usage)
            .trim()
            .to_owned()
    }

    /// Parse `tokens` (without the command name).
    ///
    /// # Errors
    ///
    /// - [`ParseError::Error`] when the tokens do not fit the declared
    ///   arguments
    /// - [`ParseError::Exit`] when a help flag was given
    pub fn parse_args<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ArgMatches, ParseError> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        tracing::debug!(command = %self.name, ?tokens, "parsing arguments");

        if let Some(opener) = self.requested_docs(&tokens) {
            return Err(self.open_docs(opener.as_ref()));
        }

        self.command
            .clone()
            .try_get_matches_from(tokens)
            .map_err(|e| self.translate(&e))
    }

    /// Documentation flags fire as soon as they appear, like an argparse
    /// action, so a help request on an otherwise broken line still works.
    ///
    /// Scanning stops at `--` and at the first token a trailing remainder
    /// argument would take; option values are skipped.
    fn requested_docs(&self, tokens: &[&str]) -> Option<&Arc<dyn TabOpener>> {
        let switches = self.short_switches();
        let leading = self.positionals_before_remainder();
        let mut positionals = 0;

        let mut tokens = tokens.iter();
        while let Some(&token) = tokens.next() {
            if token == "--" {
                break;
            }
            if is_positional_token(token) {
                if leading.is_some_and(|n| positionals >= n) {
                    break;
                }
                positionals += 1;
                continue;
            }
            let opener = self.help_flags.iter().find_map(|flag| match &flag.action {
                HelpAction::OpenDocs(opener) if flag.matches(token, &switches) => Some(opener),
                _ => None,
            });
            if opener.is_some() {
                return opener;
            }
            if self.takes_separate_value(token) {
                tokens.next();
            }
        }
        None
    }

    /// Short names of arguments that take no value.
    fn short_switches(&self) -> Vec<char> {
        self.command
            .get_arguments()
            .filter(|arg| !arg.get_action().takes_values())
            .filter_map(Arg::get_short)
            .collect()
    }

    /// Number of positionals ahead of a trailing remainder, if there is one.
    fn positionals_before_remainder(&self) -> Option<usize> {
        let positionals: Vec<&Arg> = self.command.get_positionals().collect();
        let last = positionals.last()?;
        last.is_trailing_var_arg_set().then_some(positionals.len() - 1)
    }

    /// `--name` or `-x` naming an option whose value is the next token.
    fn takes_separate_value(&self, token: &str) -> bool {
        let named = |arg: &Arg| {
            if let Some(long) = token.strip_prefix("--") {
                arg.get_long() == Some(long)
            } else {
                let mut chars = token.chars().skip(1);
                matches!((chars.next(), chars.next()), (Some(c), None) if arg.get_short() == Some(c))
            }
        };
        self.command
            .get_arguments()
            .any(|arg| !arg.is_positional() && arg.get_action().takes_values() && named(arg))
    }

    fn open_docs(&self, opener: &dyn TabOpener) -> ParseError {
        match self.help_url() {
            Ok(url) => {
                tracing::info!(command = %self.name, %url, "opening help page");
                opener.tabopen(&url);
                ParseError::Exit(ArgumentParserExit::new(0))
            }
            Err(e) => ParseError::Error(ArgumentParserError::new(format!(
                "Invalid help URL: {e}"
            ))),
        }
    }

    fn translate(&self, err: &clap::Error) -> ParseError {
        let rendered = err.render().to_string();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                ParseError::Exit(ArgumentParserExit::with_message(0, rendered))
            }
            kind => {
                let message = match kind {
                    ErrorKind::UnknownArgument => match err.get(ContextKind::InvalidArg) {
                        Some(ContextValue::String(arg)) => {
                            format!("unrecognized arguments: {arg}")
                        }
                        _ => first_line(&rendered),
                    },
                    ErrorKind::MissingRequiredArgument => match err.get(ContextKind::InvalidArg) {
                        Some(ContextValue::Strings(args)) => format!(
                            "the following arguments are required: {}",
                            args.iter()
                                .map(|a| display_arg(a))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                        _ => first_line(&rendered),
                    },
                    _ => first_line(&rendered),
                };
                tracing::debug!(command = %self.name, ?kind, %message, "parse failed");
                ParseError::Error(ArgumentParserError::new(capitalize(&message)))
            }
        }
    }
}

/// Bare words, `-` and negative numbers (parsers here accept those as
/// values).
fn is_positional_token(token: &str) -> bool {
    match token.strip_prefix('-') {
        None | Some("") => true,
        Some(rest) => rest.parse::<f64>().is_ok(),
    }
}

/// `<url>...` → `url`, `--select <select>` → `--select`.
fn display_arg(rendered: &str) -> String {
    let head = rendered.split_whitespace().next().unwrap_or(rendered);
    head.trim_end_matches("...")
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_owned()
}

fn first_line(rendered: &str) -> String {
    let line = rendered
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_owned()
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::TabLog;

    fn parser() -> ArgumentParser {
        ArgumentParser::new("foo")
    }

    #[test]
    fn name() {
        assert_eq!(parser().name(), "foo");
    }

    #[test]
    fn help_action_exits_with_status_zero() {
        let mut p = parser();
        p.add_help("help", None, HelpAction::Exit);
        let err = p.parse_args(&["--help"]).unwrap_err();
        let ParseError::Exit(exit) = err else {
            panic!("expected exit, got {err:?}");
        };
        assert_eq!(exit.status, 0);
        assert!(exit.message.is_some_and(|m| m.contains("--help")));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let err = parser().parse_args(&["--foo"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::Error(ArgumentParserError::new("Unrecognized arguments: --foo"))
        );
    }

    #[test]
    fn extra_positional_is_unrecognized() {
        let err = parser().parse_args(&["bar"]).unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized arguments: bar");
    }

    #[test]
    fn missing_required_argument() {
        let mut p = parser();
        p.add_argument(Arg::new("url").value_name("url").required(true));
        let err = p.parse_args::<&str>(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following arguments are required: url"
        );
    }

    #[test]
    fn open_docs_opens_help_page() {
        let log = Arc::new(TabLog::new());
        let mut p = parser();
        p.add_help("help", None, HelpAction::OpenDocs(log.clone()));

        let err = p.parse_args(&["--help"]).unwrap_err();
        assert!(matches!(err, ParseError::Exit(ArgumentParserExit { status: 0, .. })));
        assert_eq!(
            log.last(),
            Some(Url::parse("qute://help/commands.html#foo").unwrap())
        );
    }

    #[test]
    fn open_docs_fires_before_other_errors() {
        let log = Arc::new(TabLog::new());
        let mut p = parser();
        p.add_help("help", Some('h'), HelpAction::OpenDocs(log.clone()));

        let err = p.parse_args(&["--bogus", "-h"]).unwrap_err();
        assert!(matches!(err, ParseError::Exit(_)));
        assert_eq!(log.opened().len(), 1);
    }

    #[test]
    fn open_docs_ignored_after_double_dash() {
        let log = Arc::new(TabLog::new());
        let mut p = parser();
        p.add_help("help", Some('h'), HelpAction::OpenDocs(log.clone()));
        p.add_argument(Arg::new("rest").num_args(0..).action(ArgAction::Append));

        let matches = p.parse_args(&["--", "--help"]).unwrap();
        let rest: Vec<&String> = matches.get_many::<String>("rest").unwrap().collect();
        assert_eq!(rest, ["--help"]);
        assert!(log.opened().is_empty());
    }

    #[test]
    fn short_help_in_cluster() {
        let flag = HelpFlag {
            long: "help".into(),
            short: Some('h'),
            action: HelpAction::Exit,
        };
        let switches = ['h', 't'];
        assert!(flag.matches("-h", &switches));
        assert!(flag.matches("-th", &switches));
        assert!(flag.matches("--help", &switches));
        assert!(!flag.matches("--helpful", &switches));
        assert!(!flag.matches("-5", &switches));
        assert!(!flag.matches("help", &switches));
        assert!(!flag.matches("-hello", &switches));
    }

    fn docs_parser_with_remainder(log: &Arc<TabLog>) -> ArgumentParser {
        let mut p = ArgumentParser::new("set-cmd-text");
        p.add_help("help", Some('h'), HelpAction::OpenDocs(log.clone()));
        p.add_argument(Arg::new("space").short('s').action(ArgAction::SetTrue));
        p.add_argument(
            Arg::new("text")
                .required(true)
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        );
        p
    }

    #[test]
    fn help_inside_remainder_is_text() {
        let log = Arc::new(TabLog::new());
        let p = docs_parser_with_remainder(&log);

        let matches = p.parse_args(&[":open", "-h"]).unwrap();
        let text: Vec<&String> = matches.get_many::<String>("text").unwrap().collect();
        assert_eq!(text, [":open", "-h"]);

        let matches = p.parse_args(&["-s", ":tab-close", "-th"]).unwrap();
        assert!(matches.get_flag("space"));
        assert!(log.opened().is_empty());
    }

    #[test]
    fn help_before_remainder_still_opens_docs() {
        let log = Arc::new(TabLog::new());
        let p = docs_parser_with_remainder(&log);

        let err = p.parse_args(&["-sh", ":open"]).unwrap_err();
        assert!(matches!(err, ParseError::Exit(_)));
        assert_eq!(log.opened().len(), 1);
    }

    #[test]
    fn cluster_with_unknown_letters_is_not_help() {
        let log = Arc::new(TabLog::new());
        let mut p = parser();
        p.add_help("help", Some('h'), HelpAction::OpenDocs(log.clone()));

        let err = p.parse_args(&["-hello"]).unwrap_err();
        assert!(matches!(err, ParseError::Error(_)));
        assert!(log.opened().is_empty());
    }

    #[test]
    fn option_value_is_not_scanned_for_help() {
        let log = Arc::new(TabLog::new());
        let mut p = parser();
        p.add_help("help", Some('h'), HelpAction::OpenDocs(log.clone()));
        p.add_argument(Arg::new("select").long("select").action(ArgAction::Set));

        let _ = p.parse_args(&["--select", "--help"]);
        assert!(log.opened().is_empty());
    }

    #[test]
    fn custom_help_base() {
        let mut p = ArgumentParser::new("zoom");
        p.help_base(Url::parse("https://docs.example/cmds.html").unwrap());
        assert_eq!(
            p.help_url().unwrap().as_str(),
            "https://docs.example/cmds.html#zoom"
        );
    }

    #[test]
    fn negative_numbers_are_values() {
        let mut p = parser();
        p.add_argument(Arg::new("delta"));
        let matches = p.parse_args(&["-5"]).unwrap();
        assert_eq!(matches.get_one::<String>("delta").map(String::as_str), Some("-5"));
    }

    #[test]
    fn usage_line() {
        let mut p = parser();
        p.add_argument(Arg::new("url").value_name("url").required(true));
        assert_eq!(p.usage(), "foo <url>");
    }

    #[test]
    fn capitalize_first_letter_only() {
        assert_eq!(capitalize("unrecognized arguments: --Foo"), "Unrecognized arguments: --Foo");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn display_arg_strips_decoration() {
        assert_eq!(display_arg("<url>..."), "url");
        assert_eq!(display_arg("--select <select>"), "--select");
    }
}
