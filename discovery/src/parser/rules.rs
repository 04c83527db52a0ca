//! Ordered per-line classification rules.
//!
//! Each rule looks at one scoped line and either claims it or passes.
//! [`RULES`] is tried in order and the first claim wins; unclaimed lines are
//! dropped.

use std::sync::LazyLock;

use climb_core::{ParsedCommand, ParsedOption};
use regex::Regex;

use super::confidence::{is_placeholder_token, score_command};
use super::sections::{ScopedLine, SectionKind};

static COLUMN_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+| {2,}").expect("static regex must compile"));
static COMMAND_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("static regex must compile")
});
static FLAG_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--?[A-Za-z0-9?@#][A-Za-z0-9_.?@#-]*$").expect("static regex must compile")
});
static OPTION_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s,|]+").expect("static regex must compile"));

/// Tokens that are never subcommands, compared case-insensitively.
pub const NOISE_TOKENS: &[&str] = &["usage", "options", "flags", "examples", "see", "also"];

/// What a rule extracted from a line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineMatch {
    Command(ParsedCommand),
    Option(ParsedOption),
}

/// One classification rule.
pub trait LineRule: Sync {
    /// Stable rule name for trace logs.
    fn name(&self) -> &'static str;

    /// Whether the rule is consulted at all for lines in `section`.
    fn applies_in(&self, section: SectionKind) -> bool;

    fn classify(&self, line: &ScopedLine<'_>) -> Option<LineMatch>;
}

/// Rules in priority order.
pub const RULES: &[&dyn LineRule] = &[&OptionRow, &CommandRow];

/// Splits `line` at the first column gap (tab or two spaces), falling back
/// to a spaced dash separator (`name - description`).
pub fn split_two_columns(line: &str) -> Option<(&str, &str)> {
    let split = COLUMN_GAP_RE
        .find(line)
        .map(|gap| (&line[..gap.start()], &line[gap.end()..]))
        .or_else(|| line.split_once(" - "))?;
    let left = split.0.trim();
    let right = split.1.trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, right))
}

/// `-x ...`, `--long ...`: a dash followed by a flag character.
pub struct OptionRow;

impl LineRule for OptionRow {
    fn name(&self) -> &'static str {
        "option-row"
    }

    fn applies_in(&self, section: SectionKind) -> bool {
        !matches!(section, SectionKind::Usage | SectionKind::Noise)
    }

    fn classify(&self, line: &ScopedLine<'_>) -> Option<LineMatch> {
        parse_option_row(line.text).map(LineMatch::Option)
    }
}

/// `<token><gap><description>`, or a bare token inside a commands block.
pub struct CommandRow;

impl LineRule for CommandRow {
    fn name(&self) -> &'static str {
        "command-row"
    }

    fn applies_in(&self, section: SectionKind) -> bool {
        matches!(
            section,
            SectionKind::Commands | SectionKind::Preamble | SectionKind::Other | SectionKind::Prose
        )
    }

    fn classify(&self, line: &ScopedLine<'_>) -> Option<LineMatch> {
        if line.text.starts_with('-') {
            return None;
        }
        // Flush-left lines outside a commands block are prose or titles.
        if line.section != SectionKind::Commands && line.indent == 0 {
            return None;
        }
        let (left, description) = match split_two_columns(line.text) {
            Some((left, right)) => (left, Some(right)),
            None => (line.text, None),
        };
        let token = command_token(left)?;
        if NOISE_TOKENS
            .iter()
            .any(|noise| token.eq_ignore_ascii_case(noise))
        {
            return None;
        }

        let confidence = score_command(line.section, description.is_some(), token)?;
        let mut command = ParsedCommand::new(token, confidence);
        if let Some(description) = description {
            command = command.with_description(description);
        }
        Some(LineMatch::Command(command))
    }
}

/// Extracts the command name from the left column of a row.
///
/// Accepts `build`, `build:`, `build, b` (aliases dropped) and
/// `add <name> <url>` (argument placeholders dropped).
fn command_token(left: &str) -> Option<&str> {
    let mut parts = left.split(',');
    let head = parts.next()?.trim();
    // Aliases are single words; anything longer is a sentence.
    if !parts.all(|alias| alias.split_whitespace().count() <= 1) {
        return None;
    }
    let mut words = head.split_whitespace();
    let first = words.next()?;
    if !words.all(|word| is_placeholder_token(word) || word == "...") {
        return None;
    }
    let token = first.strip_suffix(':').unwrap_or(first);
    COMMAND_TOKEN_RE.is_match(token).then_some(token)
}

/// Parses an option row such as `-o, --output <file>  Output path`.
///
/// Returns `None` when the row carries no recognizable flag name.
pub fn parse_option_row(text: &str) -> Option<ParsedOption> {
    let mut chars = text.chars();
    if chars.next() != Some('-') {
        return None;
    }
    if !chars
        .next()
        .is_some_and(|ch| ch == '-' || ch.is_ascii_alphanumeric() || matches!(ch, '?' | '@' | '#'))
    {
        return None;
    }

    let (head, column_description) = match split_two_columns(text) {
        Some((left, right)) if left.starts_with('-') => (left, Some(right)),
        _ => (text, None),
    };

    let mut names: Vec<String> = Vec::new();
    let mut argument: Option<String> = None;
    let mut inline_description: Option<&str> = None;
    let mut after_name = false;

    let tokens: Vec<_> = OPTION_TOKEN_RE.find_iter(head).collect();
    for (position, token) in tokens.iter().enumerate() {
        let raw = token.as_str();
        if raw.starts_with('-') {
            if let Some(flag) = split_flag_token(raw) {
                names.extend(flag.names);
                if argument.is_none() {
                    argument = flag.argument;
                }
                after_name = true;
                continue;
            }
        }
        // Typed flags (`--port int   Port to bind`) put a bare type word
        // between the name and the description column.
        let is_value_type = column_description.is_some()
            && position + 1 == tokens.len()
            && raw.chars().all(|ch| ch.is_ascii_alphanumeric());
        if after_name && (is_placeholder_token(raw) || raw == "..." || is_value_type) {
            if argument.is_none() && raw != "..." {
                argument = Some(raw.to_string());
            }
            continue;
        }
        inline_description = Some(head[token.start()..].trim());
        break;
    }

    if names.is_empty() {
        return None;
    }

    let mut option = ParsedOption::default();
    for name in names {
        if !name.starts_with("--") && option.short.is_none() {
            option.short = Some(name);
        } else if name.starts_with("--") && option.long.is_none() {
            option.long = Some(name);
        } else if !option.aliases.contains(&name)
            && option.short.as_ref() != Some(&name)
            && option.long.as_ref() != Some(&name)
        {
            option.aliases.push(name);
        }
    }
    option.argument = argument;
    option.description = match (inline_description, column_description) {
        (Some(inline), Some(column)) => Some(format!("{inline} {column}")),
        (Some(inline), None) => Some(inline.to_string()),
        (None, Some(column)) => Some(column.to_string()),
        (None, None) => None,
    };
    Some(option)
}

struct FlagToken {
    names: Vec<String>,
    argument: Option<String>,
}

/// Splits one flag token into its spellings and an attached argument.
///
/// `--[no-]color` → `--color`, `--no-color`; `--out=FILE` → `--out` + `FILE`;
/// `--color[=WHEN]` → `--color` + `[WHEN]`; `-o<file>` → `-o` + `<file>`.
fn split_flag_token(raw: &str) -> Option<FlagToken> {
    let raw = raw.trim_end_matches([':', ';', '.']);

    if let Some(rest) = raw.strip_prefix("--[no-]") {
        let positive = format!("--{rest}");
        if !FLAG_NAME_RE.is_match(&positive) {
            return None;
        }
        return Some(FlagToken {
            names: vec![positive, format!("--no-{rest}")],
            argument: None,
        });
    }

    let (name, argument) = if let Some(index) = raw.find("[=") {
        let value = raw[index + 2..].trim_end_matches(']');
        (&raw[..index], Some(format!("[{value}]")))
    } else if let Some((name, value)) = raw.split_once('=') {
        (name, (!value.is_empty()).then(|| value.to_string()))
    } else if let Some(index) = raw.find(['<', '[']) {
        (&raw[..index], Some(raw[index..].to_string()))
    } else {
        (raw, None)
    };

    FLAG_NAME_RE.is_match(name).then(|| FlagToken {
        names: vec![name.to_string()],
        argument,
    })
}
