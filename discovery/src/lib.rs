//! Infer an unknown CLI's command tree from its help output.
//!
//! Given only the ability to run a program, this crate captures what the
//! program prints for `--help`, `-h` or `help`, turns that free text into
//! confidence-scored subcommand and option candidates, and renders one level
//! of the command tree as a deterministic plain-text report.
//!
//! # Main entry points
//!
//! - [`parse_help_text`]: parse pre-captured help text, no processes run.
//! - [`discover::discover`]: route an invocation, probe the target and
//!   render its report.
//! - [`registry::RegistryClient`]: structured listings for the tool
//!   registry CLI.
//!
//! # Example
//!
//! ```
//! use climb_discovery::parse_help_text;
//!
//! let help = "\
//! Usage: mycli [OPTIONS] <COMMAND>
//!
//! Commands:
//!   build  Compile the project
//!   test   Run the tests
//!
//! Options:
//!   -v, --verbose        Enable verbose output
//!   -o, --output <PATH>  Output file
//! ";
//!
//! let result = parse_help_text(help);
//! assert_eq!(result.commands.len(), 2);
//! assert!(result.commands.iter().all(|c| c.confidence >= 0.7));
//! let output = result.find_option("--output").unwrap();
//! assert_eq!(output.argument.as_deref(), Some("<PATH>"));
//! ```
//!
//! Running a live discovery needs a [`executor::ProcessRunner`]:
//!
//! ```no_run
//! use climb_discovery::config::DiscoverConfig;
//! use climb_discovery::discover::discover;
//! use climb_discovery::executor::SystemRunner;
//!
//! let config = DiscoverConfig::default();
//! let args = vec!["git".to_string(), "remote".to_string()];
//! let report = discover(&SystemRunner::new(), &config, &args).unwrap();
//! print!("{report}");
//! ```

pub mod capture;
pub mod config;
pub mod discover;
pub mod error;
pub mod executor;
pub mod parser;
pub mod registry;
pub mod render;

use climb_core::HelpParseResult;

pub use error::{ConfigError, DiscoverError, ProcessError};

/// Parses raw help text (ANSI colors allowed) into command and option
/// candidates.
pub fn parse_help_text(help: &str) -> HelpParseResult {
    parser::parse_help(help)
}
