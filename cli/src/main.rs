use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use climb_core::HelpParseResult;
use climb_discovery::config::DiscoverConfig;
use climb_discovery::discover::{Listing, OPTIONS_MARKER, discover, parsed_report};
use climb_discovery::executor::SystemRunner;
use climb_discovery::parse_help_text;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const DEFAULT_PARSE_TITLE: &str = "help";

#[derive(Debug, Parser)]
#[command(name = "climb", version)]
#[command(about = "Infer a command-line program's command tree from its help output")]
struct Cli {
    /// Configuration file (YAML). Defaults to $CLIMB_CONFIG or the per-user file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log probe attempts and routing decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover one level of a program's command tree.
    ///
    /// `climb discover git remote` lists subcommands of `git remote`;
    /// a trailing `--` lists its options instead.
    Discover(DiscoverArgs),
    /// Parse help text from a file without executing commands.
    ParseFile(ParseFileArgs),
    /// Parse help text from stdin without executing commands.
    ParseStdin(ParseStdinArgs),
}

#[derive(Debug, Args)]
struct DiscoverArgs {
    /// Target program followed by the subcommand path.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ParseFileArgs {
    /// Path to file containing help text.
    #[arg(long)]
    input: PathBuf,
    /// Root label for the printed tree.
    #[arg(long)]
    name: Option<String>,
    /// List options instead of subcommands.
    #[arg(long)]
    options: bool,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    /// Root label for the printed tree.
    #[arg(long)]
    name: Option<String>,
    /// List options instead of subcommands.
    #[arg(long)]
    options: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Discover(args) => run_discover(cli.config.as_deref(), args),
        Command::ParseFile(args) => run_parse_file(cli.config.as_deref(), args),
        Command::ParseStdin(args) => run_parse_stdin(cli.config.as_deref(), args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so the report on stdout stays byte-stable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DiscoverConfig, String> {
    DiscoverConfig::resolve(path).map_err(|err| err.to_string())
}

/// Puts back a trailing options marker that clap consumed as its own
/// end-of-flags separator.
fn restore_options_marker(mut args: Vec<String>, raw: &[String]) -> Vec<String> {
    let raw_trailing = raw.last().is_some_and(|last| last == OPTIONS_MARKER);
    let parsed_trailing = args.last().is_some_and(|last| last == OPTIONS_MARKER);
    if raw_trailing && !args.is_empty() && !parsed_trailing {
        args.push(OPTIONS_MARKER.to_string());
    }
    args
}

fn run_discover(config_path: Option<&Path>, args: DiscoverArgs) -> Result<(), String> {
    let config = load_config(config_path)?;
    let raw: Vec<String> = std::env::args().collect();
    let args = restore_options_marker(args.args, &raw);
    debug!(?args, "Starting discovery");

    let report = discover(&SystemRunner::new(), &config, &args).map_err(|err| err.to_string())?;
    print!("{report}");
    Ok(())
}

fn run_parse_file(config_path: Option<&Path>, args: ParseFileArgs) -> Result<(), String> {
    let help_text = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;
    run_parse_help_text(config_path, args.name.as_deref(), &help_text, args.options)
}

fn run_parse_stdin(config_path: Option<&Path>, args: ParseStdinArgs) -> Result<(), String> {
    let mut help_text = String::new();
    std::io::stdin()
        .read_to_string(&mut help_text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    run_parse_help_text(config_path, args.name.as_deref(), &help_text, args.options)
}

fn run_parse_help_text(
    config_path: Option<&Path>,
    name: Option<&str>,
    help_text: &str,
    options: bool,
) -> Result<(), String> {
    let config = load_config(config_path)?;
    let parsed: HelpParseResult = parse_help_text(help_text);
    debug!(
        commands = parsed.commands.len(),
        options = parsed.options.len(),
        "Parsed help text"
    );

    let listing = if options {
        Listing::Options
    } else {
        Listing::Subcommands
    };
    let title = name.unwrap_or(DEFAULT_PARSE_TITLE);
    print!("{}", parsed_report(title, &parsed, listing, &config));
    Ok(())
}
