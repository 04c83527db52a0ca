//! Deterministic plain-text tree rendering.
//!
//! Output never depends on terminal width, locale or color support, so the
//! same inputs always render to the same bytes.

use std::fmt;

/// Maximum items drawn under one node before the rest are summarized.
pub const TREE_ITEM_CAP: usize = 30;

const BRANCH: &str = "├─ ";
const LAST_BRANCH: &str = "└─ ";
const LIST_INDENT: &str = "   ";

/// A rendered report: an ordered list of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report with `root` as its first line.
    pub fn titled(root: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.push_line(root);
        report
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Draws `items` as branches indented by `2 * (level - 1)` spaces.
    ///
    /// At most [`TREE_ITEM_CAP`] items are drawn, the last one closing the
    /// branch; any remainder becomes a single `└─ … N more` line.
    pub fn tree<S: AsRef<str>>(&mut self, items: &[S], level: usize) {
        let indent = " ".repeat(2 * level.saturating_sub(1));
        let shown = items.len().min(TREE_ITEM_CAP);
        for (position, item) in items.iter().take(shown).enumerate() {
            let connector = if position + 1 == shown {
                LAST_BRANCH
            } else {
                BRANCH
            };
            self.push_line(format!("{indent}{connector}{}", item.as_ref()));
        }
        if items.len() > shown {
            self.push_line(format!("{indent}{LAST_BRANCH}… {} more", items.len() - shown));
        }
    }

    /// Draws `label [n=N]` as the only branch, with `items` nested below it.
    pub fn list<S: AsRef<str>>(&mut self, label: &str, items: &[S]) {
        self.push_line(format!("{LAST_BRANCH}{label} [n={}]", items.len()));
        let shown = items.len().min(TREE_ITEM_CAP);
        let truncated = items.len() > TREE_ITEM_CAP;
        for (position, item) in items.iter().take(shown).enumerate() {
            let connector = if position + 1 == shown && !truncated {
                LAST_BRANCH
            } else {
                BRANCH
            };
            self.push_line(format!("{LIST_INDENT}{connector}{}", item.as_ref()));
        }
        if truncated {
            self.push_line(format!(
                "{LIST_INDENT}{LAST_BRANCH}… {} more",
                items.len() - TREE_ITEM_CAP
            ));
        }
    }
}

impl fmt::Display for Report {
    /// Every line, newline-terminated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("item{index:02}")).collect()
    }

    #[test]
    fn test_small_tree() {
        let mut report = Report::titled("git");
        report.tree(&["add [c=0.90]", "commit [c=0.90, sub]"], 1);
        assert_eq!(report.to_string(), "git\n├─ add [c=0.90]\n└─ commit [c=0.90, sub]\n");
    }

    #[test]
    fn test_tree_caps_at_thirty_with_summary() {
        let mut report = Report::new();
        report.tree(&items(45), 1);
        assert_eq!(report.lines().len(), 31);
        assert_eq!(report.lines()[29], "└─ item29");
        assert_eq!(report.lines()[30], "└─ … 15 more");
    }

    #[test]
    fn test_tree_exactly_at_cap_has_no_summary() {
        let mut report = Report::new();
        report.tree(&items(30), 1);
        assert_eq!(report.lines().len(), 30);
        assert!(!report.to_string().contains("more"));
    }

    #[test]
    fn test_tree_indents_nested_levels() {
        let mut report = Report::new();
        report.tree(&["x"], 3);
        assert_eq!(report.lines(), ["    └─ x"]);
    }

    #[test]
    fn test_empty_tree_draws_nothing() {
        let mut report = Report::titled("root");
        report.tree::<&str>(&[], 1);
        assert_eq!(report.to_string(), "root\n");
    }

    #[test]
    fn test_list_layout() {
        let mut report = Report::titled("mcpjungle");
        report.list("servers", &["a [on]", "b [off]"]);
        assert_eq!(
            report.to_string(),
            "mcpjungle\n└─ servers [n=2]\n   ├─ a [on]\n   └─ b [off]\n"
        );
    }

    #[test]
    fn test_truncated_list_keeps_branch_open() {
        let mut report = Report::new();
        report.list("tools", &items(32));
        let lines = report.lines();
        assert_eq!(lines[0], "└─ tools [n=32]");
        assert_eq!(lines[30], "   ├─ item29");
        assert_eq!(lines[31], "   └─ … 2 more");
    }

    #[test]
    fn test_rendering_is_byte_stable() {
        let render = || {
            let mut report = Report::titled("t");
            report.tree(&items(40), 1);
            report.to_string()
        };
        assert_eq!(render(), render());
    }
}
