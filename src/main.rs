use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use serde::Serialize;

use keycmd::argparser::{ArgType, ParamKind, Value};
use keycmd::cli::{
    Cli, Command, CommandsArgs, CompletionsArgs, ConfigArgs, ConfigCommand, Format, ParseArgs,
};
use keycmd::command::{Command as BrowserCommand, Outcome, ParamSpec};
use keycmd::commands::CommandTable;
use keycmd::config::{ResolvedConfig, init_config, load_config, resolve_config};
use keycmd::error::AppError;
use keycmd::runner::CommandRunner;
use keycmd::tabs::{TabLog, TabOpener};

fn main() {
    let cli = Cli::parse();
    keycmd::logging::init(cli.global.verbose);

    if let Err(e) = run(&cli) {
        e.print_json_stderr();
        #[allow(clippy::cast_possible_truncation)]
        std::process::exit(e.code as i32);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let (config_path, file) = load_config(cli.global.config.as_deref());
    let config = resolve_config(&file, config_path);
    let format = cli.global.output.resolve(&config.output.format);

    match &cli.command {
        Command::Parse(args) => execute_parse(&config, format, args),
        Command::Commands(args) => execute_commands(&config, format, args),
        Command::Config(args) => execute_config(&config, format, args),
        Command::Completions(args) => {
            execute_completions(args);
            Ok(())
        }
    }
}

// =============================================================================
// Output types
// =============================================================================

#[derive(Serialize)]
struct InvocationOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

#[derive(Serialize)]
struct CommandInfo {
    name: String,
    usage: String,
    description: String,
    params: Vec<ParamInfo>,
}

#[derive(Serialize)]
struct ParamInfo {
    name: String,
    kind: ParamKind,
    types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short: Option<char>,
    help: String,
}

#[derive(Serialize)]
struct ConfigPathOutput {
    path: Option<PathBuf>,
}

#[derive(Serialize)]
struct ConfigInitOutput {
    created: PathBuf,
}

// =============================================================================
// Output formatting
// =============================================================================

fn print_output<T: Serialize>(
    value: &T,
    format: Format,
    plain: impl FnOnce(&T) -> String,
) -> Result<(), AppError> {
    let text = match format {
        Format::Json => serde_json::to_string(value),
        Format::Pretty => serde_json::to_string_pretty(value),
        Format::Plain => Ok(plain(value)),
    };
    let text = text.map_err(|e| AppError::serialization(&e))?;
    println!("{text}");
    Ok(())
}

fn plain_invocation(out: &InvocationOutput) -> String {
    let mut line = out.command.clone();
    if let Some(args) = &out.args {
        for (name, value) in args {
            let _ = write!(line, " {name}={value}");
        }
    }
    if let Some(url) = &out.help {
        let _ = write!(line, " help={url}");
    }
    line
}

fn plain_command_table(commands: &[CommandInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {:<14} {:<40} DESCRIPTION", "NAME", "USAGE");
    for cmd in commands {
        let _ = writeln!(
            out,
            "  {:<14} {:<40} {}",
            cmd.name, cmd.usage, cmd.description
        );
    }
    out.trim_end().to_owned()
}

fn plain_command_detail(cmd: &CommandInfo) -> String {
    let mut out = format!("{}\n  {}\n", cmd.usage, cmd.description);
    for param in &cmd.params {
        let _ = write!(out, "\n  {:<12} {}", param.name, param.types.join("|"));
        if let Some(choices) = &param.choices {
            let _ = write!(out, " ({})", choices.join(", "));
        }
        if let Some(default) = &param.default {
            let _ = write!(out, " [default: {default}]");
        }
    }
    out
}

// =============================================================================
// Subcommand handlers
// =============================================================================

fn builtin_table(config: &ResolvedConfig) -> (Arc<TabLog>, CommandTable) {
    let log = Arc::new(TabLog::new());
    let docs: Arc<dyn TabOpener> = log.clone();
    let help_base = config.help.custom_url();
    let table = CommandTable::builtin(&docs, help_base.as_ref());
    (log, table)
}

fn execute_parse(config: &ResolvedConfig, format: Format, args: &ParseArgs) -> Result<(), AppError> {
    let (log, table) = builtin_table(config);
    let runner = CommandRunner::new(&table, &config.aliases);
    let invocations = runner.parse_line(&args.joined())?;

    // Help pages are opened in invocation order.
    let mut opened = log.take().into_iter();
    for invocation in invocations {
        let output = match invocation.outcome {
            Outcome::Run(parsed) => InvocationOutput {
                command: parsed.command,
                args: Some(parsed.args),
                help: None,
            },
            Outcome::Help(_) => InvocationOutput {
                command: invocation.command,
                args: None,
                help: opened.next().map(String::from),
            },
        };
        print_output(&output, format, plain_invocation)?;
    }
    Ok(())
}

fn param_info(spec: &ParamSpec) -> ParamInfo {
    let enum_choices = spec.types.iter().find_map(|t| match t {
        ArgType::Enum(e) => Some(e.choices()),
        _ => None,
    });
    ParamInfo {
        name: spec.param.name.clone(),
        kind: spec.param.kind,
        types: spec.types.iter().map(ToString::to_string).collect(),
        choices: spec.choices.clone().or(enum_choices),
        default: spec.param.default.clone(),
        short: spec.short,
        help: spec.help.clone(),
    }
}

fn command_info(cmd: &BrowserCommand) -> CommandInfo {
    CommandInfo {
        name: cmd.name().to_owned(),
        usage: cmd.usage(),
        description: cmd.description().to_owned(),
        params: cmd.params().iter().map(param_info).collect(),
    }
}

fn execute_commands(
    config: &ResolvedConfig,
    format: Format,
    args: &CommandsArgs,
) -> Result<(), AppError> {
    let (_, table) = builtin_table(config);

    match &args.name {
        Some(name) => {
            let cmd = table
                .get(name)
                .ok_or_else(|| AppError::unknown_command(name))?;
            print_output(&command_info(cmd), format, plain_command_detail)
        }
        None => {
            let infos: Vec<CommandInfo> = table.iter().map(command_info).collect();
            print_output(&infos, format, |infos| plain_command_table(infos))
        }
    }
}

fn execute_config(
    config: &ResolvedConfig,
    format: Format,
    args: &ConfigArgs,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => print_output(config, format, |c| {
            toml::to_string_pretty(c).unwrap_or_else(|e| format!("error: {e}"))
        }),
        ConfigCommand::Init(init) => {
            let created = init_config(init.path.as_deref())?;
            print_output(&ConfigInitOutput { created }, format, |o| {
                o.created.display().to_string()
            })
        }
        ConfigCommand::Path => {
            let output = ConfigPathOutput {
                path: config.config_path.clone(),
            };
            print_output(&output, format, |o| {
                o.path
                    .as_ref()
                    .map_or_else(|| "none".to_owned(), |p| p.display().to_string())
            })
        }
    }
}

fn execute_completions(args: &CompletionsArgs) {
    clap_complete::generate(
        args.shell,
        &mut Cli::command(),
        "keycmd",
        &mut std::io::stdout(),
    );
}
