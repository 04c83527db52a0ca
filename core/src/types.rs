//! Value types produced by help-text parsing and consumed by the renderer.
//!
//! Every type here is an immutable-by-convention record. The parser builds
//! them fresh on each call and nothing is cached across discovery runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered sequence of subcommand tokens, e.g. `["remote", "add"]`.
///
/// The empty path denotes the program root.
///
/// # Examples
///
/// ```
/// use climb_core::CommandPath;
///
/// let root = CommandPath::root();
/// assert!(root.is_root());
///
/// let child = root.child("build");
/// assert_eq!(child.segments(), ["build".to_string()]);
/// assert!(root.is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandPath {
    segments: Vec<String>,
}

impl CommandPath {
    /// The program root (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from any sequence of string-like segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if any segment equals `name` exactly.
    pub fn contains(&self, name: &str) -> bool {
        self.segments.iter().any(|segment| segment == name)
    }

    /// Returns a new path with `name` appended. `self` is left untouched.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(" "))
    }
}

/// A candidate subcommand inferred from one line of help text.
///
/// `name` is a single token without whitespace. `confidence` lies in
/// `[0.0, 1.0]` and estimates how likely the line names a real subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub name: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParsedCommand {
    /// Creates a candidate, clamping `confidence` into `[0.0, 1.0]`.
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A flag/option extracted from help text.
///
/// At least one of `short`/`long` is present. `short` holds single-dash
/// forms (`-o`, and single-dash words such as `-chdir`), `long` holds the
/// first `--name`, and every further spelling lands in `aliases`.
/// `argument` is the value placeholder (`<file>`, `PORT`, `[WHEN]`) for
/// value-taking options and `None` for boolean flags.
///
/// # Examples
///
/// ```
/// use climb_core::ParsedOption;
///
/// let flag = ParsedOption::short("-v").with_long("--verbose");
/// assert!(flag.argument.is_none());
/// assert_eq!(flag.primary_name(), "--verbose");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOption {
    pub long: Option<String>,
    pub short: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParsedOption {
    /// Creates an option with only a long form.
    pub fn long(long: impl Into<String>) -> Self {
        Self {
            long: Some(long.into()),
            ..Self::default()
        }
    }

    /// Creates an option with only a short form.
    pub fn short(short: impl Into<String>) -> Self {
        Self {
            short: Some(short.into()),
            ..Self::default()
        }
    }

    pub fn with_long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// All spellings in canonical order: short, long, then aliases.
    pub fn names(&self) -> Vec<&str> {
        self.short
            .iter()
            .chain(self.long.iter())
            .chain(self.aliases.iter())
            .map(String::as_str)
            .collect()
    }

    /// Returns the long form if present, otherwise the short form.
    pub fn primary_name(&self) -> &str {
        self.long
            .as_deref()
            .or(self.short.as_deref())
            .unwrap_or_default()
    }

    /// Returns `true` if `name` is any spelling of this option.
    pub fn matches(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}

/// Everything extracted from one blob of help text.
///
/// Produced fresh per parse call; parsing identical text twice yields equal
/// results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelpParseResult {
    pub commands: Vec<ParsedCommand>,
    pub options: Vec<ParsedOption>,
}

impl HelpParseResult {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.options.is_empty()
    }

    pub fn find_command(&self, name: &str) -> Option<&ParsedCommand> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn find_option(&self, name: &str) -> Option<&ParsedOption> {
        self.options.iter().find(|option| option.matches(name))
    }
}

/// One row of a rendered subcommand listing.
///
/// `has_subcommands` comes from a look-ahead probe of the candidate itself,
/// not from the parse that produced the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryEntry {
    pub name: String,
    pub confidence: f64,
    pub has_subcommands: bool,
}

impl DiscoveryEntry {
    /// Display label, e.g. `push [c=0.90, sub]`.
    pub fn label(&self) -> String {
        if self.has_subcommands {
            format!("{} [c={:.2}, sub]", self.name, self.confidence)
        } else {
            format!("{} [c={:.2}]", self.name, self.confidence)
        }
    }
}
