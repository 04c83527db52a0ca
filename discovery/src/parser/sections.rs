//! Section-header state machine.
//!
//! Splits normalized help text into lines tagged with the section they
//! belong to. Header lines themselves are consumed and never reach the
//! line rules.

use std::sync::LazyLock;

use regex::Regex;

static COLUMN_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t| {2,}").expect("static regex must compile"));

const MAX_HEADER_LEN: usize = 80;
/// Unknown headers with more words than this read as prose.
const MAX_TERSE_HEADER_WORDS: usize = 4;

const COMMAND_HEADER_WORDS: &[&str] = &["command", "subcommand", "action", "task"];
const COMMAND_HEADER_NEGATIVES: &[&str] = &["variable", "option", "flag", "argument", "example"];
const NOISE_HEADER_WORDS: &[&str] = &[
    "example",
    "see also",
    "environment",
    "learn more",
    "exit status",
    "argument",
    "positional",
];

/// Which part of a help page a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Before any header, or after a usage block ends.
    Preamble,
    Usage,
    Commands,
    Options,
    /// Examples, environment, "see also" and similar.
    Noise,
    /// A short header that is not recognized.
    Other,
    /// A sentence-like header (git's "grow, mark and tweak your history").
    Prose,
}

/// A non-blank, non-header line with its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopedLine<'a> {
    /// Zero-based line number in the normalized text.
    pub number: usize,
    /// The line without leading indentation.
    pub text: &'a str,
    /// Leading whitespace width (a tab counts as one).
    pub indent: usize,
    pub section: SectionKind,
    /// Increments at every header, so lines under the same header share it.
    pub block: usize,
}

/// Classifies `trimmed` (a line without surrounding whitespace) as a section
/// header. `indent` is the width of the line's leading whitespace.
pub fn detect_header(trimmed: &str, indent: usize) -> Option<SectionKind> {
    if trimmed.is_empty()
        || trimmed.starts_with('-')
        || trimmed.len() > MAX_HEADER_LEN
        || COLUMN_GAP_RE.is_match(trimmed)
    {
        return None;
    }

    let title = if let Some(title) = trimmed.strip_suffix(':') {
        title
    } else if indent == 0 && is_shouted(trimmed) {
        trimmed
    } else {
        return None;
    };
    let lower = title.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }

    if lower.starts_with("usage") || lower == "synopsis" {
        return Some(SectionKind::Usage);
    }
    if COMMAND_HEADER_WORDS.iter().any(|word| lower.contains(word))
        && !COMMAND_HEADER_NEGATIVES.iter().any(|word| lower.contains(word))
    {
        return Some(SectionKind::Commands);
    }
    if lower.contains("option") || lower.contains("flag") {
        return Some(SectionKind::Options);
    }
    if NOISE_HEADER_WORDS.iter().any(|word| lower.contains(word)) {
        return Some(SectionKind::Noise);
    }
    if lower.split_whitespace().count() > MAX_TERSE_HEADER_WORDS {
        return Some(SectionKind::Prose);
    }
    Some(SectionKind::Other)
}

/// Man-page style header: upper-case words with no trailing colon.
fn is_shouted(trimmed: &str) -> bool {
    trimmed.split_whitespace().count() <= MAX_TERSE_HEADER_WORDS
        && trimmed.chars().filter(|ch| ch.is_ascii_alphabetic()).count() >= 3
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch == ' ' || ch == '-')
}

/// Inline usage line such as `Usage: prog <command> [flags]`.
fn is_inline_usage(trimmed: &str) -> bool {
    trimmed
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("usage:"))
        && trimmed.len() > 6
}

/// Tags every content line of `normalized` with its section.
pub fn scope_lines(normalized: &str) -> Vec<ScopedLine<'_>> {
    let mut scoped = Vec::new();
    let mut section = SectionKind::Preamble;
    let mut block = 0;

    for (number, line) in normalized.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            // A usage block is a paragraph; the next blank line closes it.
            if section == SectionKind::Usage {
                section = SectionKind::Preamble;
                block += 1;
            }
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if is_inline_usage(trimmed) {
            section = SectionKind::Usage;
            block += 1;
            continue;
        }
        // Continuation lines of a usage synopsis are never headers.
        if section != SectionKind::Usage {
            if let Some(kind) = detect_header(trimmed, indent) {
                section = kind;
                block += 1;
                continue;
            }
        }

        scoped.push(ScopedLine {
            number,
            text: trimmed,
            indent,
            section,
            block,
        });
    }
    scoped
}
