//! Splitting a typed command line into commands and running their parsers.

use std::collections::BTreeMap;

use crate::command::{CommandError, Outcome};
use crate::commands::CommandTable;

/// Separator between chained commands, e.g. `tab-close ;; open x`.
pub const CHAIN_SEPARATOR: &str = ";;";

/// One parsed command of a (possibly chained) line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Command name after alias expansion.
    pub command: String,
    pub outcome: Outcome,
}

/// Parses command lines against a [`CommandTable`].
#[derive(Debug)]
pub struct CommandRunner<'a> {
    table: &'a CommandTable,
    aliases: &'a BTreeMap<String, String>,
}

impl<'a> CommandRunner<'a> {
    #[must_use]
    pub const fn new(table: &'a CommandTable, aliases: &'a BTreeMap<String, String>) -> Self {
        Self { table, aliases }
    }

    /// Split `line` into the text of its chained commands.
    ///
    /// One leading `:` is dropped and blank pieces are skipped.
    #[must_use]
    pub fn split_chain(line: &str) -> Vec<&str> {
        let line = line.trim();
        let line = line.strip_prefix(':').unwrap_or(line);
        line.split(CHAIN_SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Replace a leading alias by its expansion. Expansions are not expanded
    /// again.
    #[must_use]
    pub fn expand_alias(&self, text: &str) -> String {
        let (first, rest) = text
            .split_once(char::is_whitespace)
            .map_or((text, ""), |(first, rest)| (first, rest.trim_start()));
        match self.aliases.get(first) {
            Some(expansion) if rest.is_empty() => expansion.clone(),
            Some(expansion) => format!("{expansion} {rest}"),
            None => text.to_owned(),
        }
    }

    /// Parse a single command (no chaining).
    ///
    /// # Errors
    ///
    /// - [`CommandError::EmptyLine`] if there is nothing to parse
    /// - [`CommandError::UnbalancedQuotes`] if quoting is broken
    /// - [`CommandError::NoSuchCommand`] if the name is not registered
    /// - any error of [`crate::command::Command::parse`]
    pub fn parse_one(&self, text: &str) -> Result<Invocation, CommandError> {
        let expanded = self.expand_alias(text.trim());
        let words = shlex::split(&expanded).ok_or(CommandError::UnbalancedQuotes)?;
        let Some((name, tokens)) = words.split_first() else {
            return Err(CommandError::EmptyLine);
        };

        let command = self
            .table
            .get(name)
            .ok_or_else(|| CommandError::NoSuchCommand(name.clone()))?;
        tracing::debug!(command = %name, ?tokens, "dispatching");

        Ok(Invocation {
            command: name.clone(),
            outcome: command.parse(tokens)?,
        })
    }

    /// Parse every command of a chained line, stopping at the first error.
    ///
    /// # Errors
    ///
    /// [`CommandError::EmptyLine`] for a blank line, otherwise the first
    /// error of [`Self::parse_one`].
    pub fn parse_line(&self, line: &str) -> Result<Vec<Invocation>, CommandError> {
        let parts = Self::split_chain(line);
        if parts.is_empty() {
            return Err(CommandError::EmptyLine);
        }
        parts.into_iter().map(|part| self.parse_one(part)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::argparser::{ArgumentParserError, Value};
    use crate::tabs::{TabLog, TabOpener};

    fn table() -> CommandTable {
        let docs: Arc<dyn TabOpener> = Arc::new(TabLog::new());
        CommandTable::builtin(&docs, None)
    }

    fn aliases() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("o".to_owned(), "open".to_owned()),
            ("t".to_owned(), "open -t".to_owned()),
        ])
    }

    fn run_args(invocation: &Invocation) -> &BTreeMap<String, Value> {
        match &invocation.outcome {
            Outcome::Run(parsed) => &parsed.args,
            Outcome::Help(_) => panic!("unexpected help"),
        }
    }

    #[test]
    fn split_chain_strips_colon_and_blanks() {
        assert_eq!(
            CommandRunner::split_chain(":zoom 50 ;; ;; tab-close"),
            ["zoom 50", "tab-close"]
        );
        assert!(CommandRunner::split_chain("  :  ").is_empty());
    }

    #[test]
    fn expand_alias_once() {
        let (table, aliases) = (table(), aliases());
        let runner = CommandRunner::new(&table, &aliases);
        assert_eq!(runner.expand_alias("t example.com"), "open -t example.com");
        assert_eq!(runner.expand_alias("o"), "open");
        assert_eq!(runner.expand_alias("zoom 10"), "zoom 10");
    }

    #[test]
    fn parse_line_chained() {
        let (table, aliases) = (table(), aliases());
        let runner = CommandRunner::new(&table, &aliases);
        let invocations = runner.parse_line(":zoom 150;;t example.com").unwrap();
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].command, "zoom");
        assert_eq!(run_args(&invocations[0])["level"], Value::Int(150));
        assert_eq!(invocations[1].command, "open");
        assert_eq!(run_args(&invocations[1])["tab"], Value::Bool(true));
        assert_eq!(
            run_args(&invocations[1])["url"],
            Value::Str("example.com".into())
        );
    }

    #[test]
    fn quoted_tokens_stay_together() {
        let (table, aliases) = (table(), aliases());
        let runner = CommandRunner::new(&table, &aliases);
        let invocation = runner.parse_one(r#"set-cmd-text -s ":open 'two words'""#).unwrap();
        assert_eq!(
            run_args(&invocation)["text"],
            Value::Str(":open 'two words'".into())
        );
    }

    #[test]
    fn errors() {
        let (table, aliases) = (table(), aliases());
        let runner = CommandRunner::new(&table, &aliases);
        assert_eq!(runner.parse_line(""), Err(CommandError::EmptyLine));
        assert_eq!(
            runner.parse_line("frobnicate"),
            Err(CommandError::NoSuchCommand("frobnicate".into()))
        );
        assert_eq!(
            runner.parse_line("open 'unterminated"),
            Err(CommandError::UnbalancedQuotes)
        );
        assert_eq!(
            runner.parse_line("zoom --foo"),
            Err(CommandError::Parse(ArgumentParserError::new(
                "Unrecognized arguments: --foo"
            )))
        );
    }

    #[test]
    fn help_letters_in_remainder_run_the_command() {
        let log = Arc::new(TabLog::new());
        let docs: Arc<dyn TabOpener> = log.clone();
        let table = CommandTable::builtin(&docs, None);
        let aliases = BTreeMap::new();
        let runner = CommandRunner::new(&table, &aliases);

        let text = runner.parse_one("set-cmd-text :open -h").unwrap();
        assert_eq!(run_args(&text)["text"], Value::Str(":open -h".into()));

        let text = runner.parse_one("set-cmd-text -s :tab-close -th").unwrap();
        assert_eq!(run_args(&text)["space"], Value::Bool(true));
        assert_eq!(run_args(&text)["text"], Value::Str(":tab-close -th".into()));

        let open = runner.parse_one("open -t duckduckgo -hello").unwrap();
        assert_eq!(run_args(&open)["url"], Value::Str("duckduckgo -hello".into()));

        assert!(log.opened().is_empty());
    }

    #[test]
    fn unknown_short_cluster_is_rejected_not_help() {
        let log = Arc::new(TabLog::new());
        let docs: Arc<dyn TabOpener> = log.clone();
        let table = CommandTable::builtin(&docs, None);
        let aliases = BTreeMap::new();
        let runner = CommandRunner::new(&table, &aliases);

        assert!(matches!(
            runner.parse_one("zoom -hello"),
            Err(CommandError::Parse(_))
        ));
        assert!(log.opened().is_empty());

        let help = runner.parse_one("set-cmd-text -sh :open").unwrap();
        assert!(matches!(help.outcome, Outcome::Help(_)));
        assert_eq!(log.opened().len(), 1);
    }

    #[test]
    fn chain_stops_at_first_error() {
        let (table, aliases) = (table(), aliases());
        let runner = CommandRunner::new(&table, &aliases);
        let err = runner.parse_line("zoom x ;; nope").unwrap_err();
        assert_eq!(err.to_string(), "level: Invalid int value x");
    }
}
