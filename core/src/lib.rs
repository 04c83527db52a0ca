//! Core value types for CLI command-tree discovery.
//!
//! This crate defines the plain records passed between the discovery layers:
//!
//! - [`CommandPath`]: ordered subcommand tokens identifying a node in a
//!   target program's command tree.
//! - [`ParsedCommand`]: a candidate subcommand inferred from one help line,
//!   with a heuristic confidence score.
//! - [`ParsedOption`]: a flag/option with short and long forms, aliases and
//!   an optional argument placeholder.
//! - [`HelpParseResult`]: everything extracted from one blob of help text.
//! - [`DiscoveryEntry`]: one rendered row of a subcommand listing.
//!
//! The registry records ([`RegistryServer`], [`RegistryTool`],
//! [`RegistryGroup`], [`RegistryPrompt`], [`ToolSchema`]) model the
//! structured listing output of a known tool registry.
//!
//! All types are transient values: they are created and discarded within a
//! single discovery call and carry no identity.
//!
//! # Example
//!
//! ```
//! use climb_core::*;
//!
//! let path = CommandPath::from_segments(["remote", "add"]);
//! assert_eq!(path.to_string(), "remote add");
//! assert!(path.contains("remote"));
//!
//! let option = ParsedOption::long("--output")
//!     .with_short("-o")
//!     .with_argument("<file>");
//! assert_eq!(option.names(), vec!["-o", "--output"]);
//!
//! let command = ParsedCommand::new("push", 0.9).with_description("Push changes");
//! assert!(command.confidence >= 0.7);
//! ```

mod registry;
mod types;

pub use registry::*;
pub use types::*;
