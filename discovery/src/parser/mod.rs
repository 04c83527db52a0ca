//! Help-text parser.
//!
//! Parsing runs in three stages:
//!
//! 1. [`normalize`] strips terminal escapes and unifies line endings.
//! 2. [`sections`] scopes each line under the header it follows.
//! 3. [`rules`] classifies each scoped line, first matching rule wins.
//!
//! The parser never fails: lines no rule claims are dropped.
//!
//! # Examples
//!
//! ```
//! use climb_discovery::parser::HelpParser;
//!
//! let result = HelpParser::new().parse("Commands:\n  push   Push changes\n  pull   Pull changes\n");
//! let names: Vec<_> = result.commands.iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(names, ["push", "pull"]);
//! assert!(result.options.is_empty());
//! ```

pub mod confidence;
pub mod normalize;
pub mod rules;
pub mod sections;

use std::collections::HashMap;

use climb_core::{HelpParseResult, ParsedCommand, ParsedOption};
use tracing::trace;

use self::rules::{LineMatch, LineRule, RULES};
use self::sections::{ScopedLine, SectionKind};

/// Stateless parser over an ordered rule table.
#[derive(Clone, Copy)]
pub struct HelpParser {
    rules: &'static [&'static dyn LineRule],
}

impl Default for HelpParser {
    fn default() -> Self {
        Self { rules: RULES }
    }
}

impl std::fmt::Debug for HelpParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.rules.iter().map(|rule| rule.name()).collect();
        f.debug_struct("HelpParser").field("rules", &names).finish()
    }
}

impl HelpParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one blob of raw help text.
    pub fn parse(&self, raw: &str) -> HelpParseResult {
        let normalized = normalize::normalize_help_output(raw);
        let mut commands = CommandSet::default();
        let mut options: Vec<ParsedOption> = Vec::new();
        // Indent of the first entry of the current commands block.
        let mut entry_indent: Option<(usize, usize)> = None;

        for line in sections::scope_lines(&normalized) {
            if is_wrapped_continuation(&line, entry_indent) {
                trace!(line = line.number, "Skipping wrapped description");
                continue;
            }
            let Some((rule, matched)) = self.classify(&line) else {
                continue;
            };
            trace!(rule, line = line.number, "Classified help line");
            match matched {
                LineMatch::Command(command) => {
                    if line.section == SectionKind::Commands
                        && entry_indent.is_none_or(|(block, _)| block != line.block)
                    {
                        entry_indent = Some((line.block, line.indent));
                    }
                    commands.insert(command);
                }
                LineMatch::Option(option) => {
                    let duplicate = options.iter().any(|existing| {
                        existing.short == option.short && existing.long == option.long
                    });
                    if !duplicate {
                        options.push(option);
                    }
                }
            }
        }

        HelpParseResult {
            commands: commands.into_vec(),
            options,
        }
    }

    fn classify(&self, line: &ScopedLine<'_>) -> Option<(&'static str, LineMatch)> {
        self.rules
            .iter()
            .filter(|rule| rule.applies_in(line.section))
            .find_map(|rule| rule.classify(line).map(|matched| (rule.name(), matched)))
    }
}

/// Parses help text with the default rule table.
pub fn parse_help(raw: &str) -> HelpParseResult {
    HelpParser::new().parse(raw)
}

/// A line indented deeper than the first entry of its commands block
/// continues the previous entry's description.
fn is_wrapped_continuation(line: &ScopedLine<'_>, entry_indent: Option<(usize, usize)>) -> bool {
    line.section == SectionKind::Commands
        && !line.text.starts_with('-')
        && entry_indent.is_some_and(|(block, indent)| block == line.block && line.indent > indent)
}

/// Commands keyed by name, first-seen order, highest confidence kept.
#[derive(Default)]
struct CommandSet {
    order: Vec<ParsedCommand>,
    index: HashMap<String, usize>,
}

impl CommandSet {
    fn insert(&mut self, command: ParsedCommand) {
        match self.index.get(&command.name) {
            Some(&position) => {
                let existing = &mut self.order[position];
                if command.confidence > existing.confidence {
                    *existing = command;
                }
            }
            None => {
                self.index.insert(command.name.clone(), self.order.len());
                self.order.push(command);
            }
        }
    }

    fn into_vec(self) -> Vec<ParsedCommand> {
        self.order
    }
}
