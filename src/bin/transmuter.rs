//! Command-line interface for transmuter
//! This binary parses aether grammar descriptions with the bundled grammar and prints the result.
//!
//! Usage:
//!   transmuter parse `<path>` [--format `<format>`] [--condition `<name>`]... [--feature `<name>`]...
//!   transmuter tokens `<path>` [--condition `<name>`]...  - List the visible tokens of a file
//!   transmuter grammar [--feature `<name>`]...            - Print the bundled grammar
//!
//! Logging goes to stderr; the level comes from `--log-level` or `TRANSMUTER_LOG`.

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;
use transmuter::transmuter::common::conditions;
use transmuter::transmuter::config::{Loader, OutputFormat, TransmuterConfig};
use transmuter::transmuter::formats::{FormatError, FormatParams, FormatRegistry};
use transmuter::transmuter::grammars::aether;
use transmuter::transmuter::lexing::Lexer;
use transmuter::transmuter::parsing::{Features, Parser};
use transmuter::TransmuterError;

const LOG_ENV: &str = "TRANSMUTER_LOG";

fn main() {
    let matches = Command::new("transmuter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse grammar descriptions with the transmuter engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter, e.g. 'debug' or 'transmuter=trace' (overrides TRANSMUTER_LOG)"),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a file and print its syntax tree")
                .arg(path_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('treeviz' or 'json'); defaults to the configured one"),
                )
                .arg(condition_arg())
                .arg(feature_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file layered over the built-in defaults"),
                )
                .arg(
                    Arg::new("spans")
                        .long("spans")
                        .action(ArgAction::SetTrue)
                        .help("Include source spans in the output"),
                ),
        )
        .subcommand(
            Command::new("tokens")
                .about("List the visible tokens of a file")
                .arg(path_arg())
                .arg(condition_arg()),
        )
        .subcommand(
            Command::new("grammar")
                .about("Print the bundled grammar in rule notation")
                .arg(feature_arg()),
        )
        .get_matches();

    init_logging(matches.get_one::<String>("log-level"));

    let result = match matches.subcommand() {
        Some(("parse", parse_matches)) => handle_parse_command(parse_matches),
        Some(("tokens", tokens_matches)) => handle_tokens_command(tokens_matches),
        Some(("grammar", grammar_matches)) => handle_grammar_command(grammar_matches),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the aether file")
        .required(true)
        .index(1)
}

fn condition_arg() -> Arg {
    Arg::new("condition")
        .long("condition")
        .action(ArgAction::Append)
        .help("Active lexer condition (repeatable), e.g. 'lexical' or 'syntactic'")
}

fn feature_arg() -> Arg {
    Arg::new("feature")
        .long("feature")
        .action(ArgAction::Append)
        .help("Grammar feature to enable (repeatable), e.g. 'precedences'")
}

fn values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn init_logging(level: Option<&String>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn read_source(path: &str) -> Result<String, TransmuterError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Defaults, then the optional `--config` file, then command-line flags.
fn load_config(matches: &ArgMatches) -> Result<TransmuterConfig, TransmuterError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    let mut config = loader.build()?;

    let conditions = values(matches, "condition");
    if !conditions.is_empty() {
        config.grammar.conditions = conditions;
    }
    config.grammar.features.extend(values(matches, "feature"));
    match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => config.output.format = OutputFormat::Json,
        Some("treeviz") => config.output.format = OutputFormat::Treeviz,
        Some(other) => return Err(FormatError::FormatNotFound(other.to_string()).into()),
        None => {}
    }
    if matches.get_flag("spans") {
        config.output.spans = true;
    }
    Ok(config)
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Treeviz => "treeviz",
        OutputFormat::Json => "json",
    }
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches) -> Result<(), TransmuterError> {
    let path = matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or_default();
    let config = load_config(matches)?;
    let source = read_source(path)?;

    let grammar = aether::grammar(&config.grammar.feature_set())?;
    let parser = Parser::new(&grammar).with_config(config.parser);
    let tree = parser.parse_named(path, &source, config.grammar.condition_set())?;
    info!(path, rule = tree.rule(), "parsed");

    let mut params = FormatParams::new();
    params.insert("show-spans".to_string(), config.output.spans.to_string());
    let output = FormatRegistry::with_defaults().serialize(
        &tree,
        format_name(config.output.format),
        &params,
    )?;
    println!("{}", output.trim_end());
    Ok(())
}

/// Handle the tokens command
fn handle_tokens_command(matches: &ArgMatches) -> Result<(), TransmuterError> {
    let path = matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or_default();
    let source = read_source(path)?;
    let mut active = conditions(values(matches, "condition"));
    if active.is_empty() {
        active = Loader::new().build()?.grammar.condition_set();
    }

    let lexicon = aether::lexicon()?;
    let mut lexer = Lexer::new(&lexicon, &source, active).with_filename(path);
    for token in lexer.tokens()? {
        println!(
            "{} {} {:?}",
            token.span,
            lexicon.names(&token.tags).join("|"),
            token.text
        );
    }
    Ok(())
}

/// Handle the grammar command
fn handle_grammar_command(matches: &ArgMatches) -> Result<(), TransmuterError> {
    let features: Features = values(matches, "feature").into_iter().collect();
    let grammar = aether::grammar(&features)?;
    print!("{}", grammar.describe());
    Ok(())
}
