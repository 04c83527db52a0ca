//! Help-text normalization.

use std::sync::LazyLock;

use regex::Regex;

// Compile-time constant patterns; a panic here is a programmer error.
static CSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("static regex must compile")
});
static OSC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").expect("static regex must compile")
});
static LONE_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b[@-Z\\-_]?").expect("static regex must compile"));
static OVERSTRIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".\x08").expect("static regex must compile"));

/// Removes terminal escape sequences (CSI colors and cursor movement, OSC
/// hyperlinks/titles) and man-style overstrike.
pub fn strip_ansi(raw: &str) -> String {
    let without_osc = OSC_RE.replace_all(raw, "");
    let without_csi = CSI_RE.replace_all(&without_osc, "");
    let mut cleaned = LONE_ESCAPE_RE.replace_all(&without_csi, "").into_owned();
    while OVERSTRIKE_RE.is_match(&cleaned) {
        cleaned = OVERSTRIKE_RE.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}

/// Strips escapes, unifies line endings and trims trailing whitespace.
///
/// Leading indentation is preserved; section scoping depends on it.
pub fn normalize_help_output(raw: &str) -> String {
    let cleaned = strip_ansi(raw);
    cleaned
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
