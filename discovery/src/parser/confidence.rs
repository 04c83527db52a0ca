//! Closed-form confidence scoring for command candidates.
//!
//! A score depends only on the section a line sits in, whether the token
//! carries a description, and whether the token looks like a placeholder.

use super::sections::SectionKind;

/// Base score inside an explicit commands section.
pub const COMMANDS_BASE: f64 = 0.75;
/// Base score before any header (or after a usage block).
pub const PREAMBLE_BASE: f64 = 0.40;
/// Base score under a short unrecognized header.
pub const OTHER_BASE: f64 = 0.35;
/// Base score under a sentence-like header.
pub const PROSE_BASE: f64 = 0.25;

/// Bonus for a described entry inside a commands section.
pub const SECTION_DESCRIPTION_BONUS: f64 = 0.15;
/// Bonus for a described entry anywhere else.
pub const LOOSE_DESCRIPTION_BONUS: f64 = 0.05;
/// Penalty for tokens like `FILE` or `NAME`.
pub const PLACEHOLDER_PENALTY: f64 = 0.30;

/// Score before bonuses for `section`, or `None` where commands never occur.
pub fn section_base(section: SectionKind) -> Option<f64> {
    match section {
        SectionKind::Commands => Some(COMMANDS_BASE),
        SectionKind::Preamble => Some(PREAMBLE_BASE),
        SectionKind::Other => Some(OTHER_BASE),
        SectionKind::Prose => Some(PROSE_BASE),
        SectionKind::Usage | SectionKind::Options | SectionKind::Noise => None,
    }
}

/// Scores a command candidate. Returns `None` when the line cannot name a
/// command at all (wrong section, or undescribed outside a commands block).
pub fn score_command(section: SectionKind, has_description: bool, token: &str) -> Option<f64> {
    let mut score = section_base(section)?;
    let in_commands = section == SectionKind::Commands;

    if has_description {
        score += if in_commands {
            SECTION_DESCRIPTION_BONUS
        } else {
            LOOSE_DESCRIPTION_BONUS
        };
    } else if !in_commands {
        return None;
    }

    if is_placeholder_token(token) {
        score -= PLACEHOLDER_PENALTY;
    }

    Some(score.clamp(0.0, 1.0))
}

/// `true` for all-caps tokens (`FILE`, `PATH_SPEC`) and bracketed ones.
pub fn is_placeholder_token(token: &str) -> bool {
    if token.starts_with('<') || token.starts_with('[') || token.starts_with('{') {
        return true;
    }
    let mut letters = token.chars().filter(|ch| ch.is_ascii_alphabetic()).peekable();
    letters.peek().is_some()
        && letters.all(|ch| ch.is_ascii_uppercase())
        && token
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}
