use std::fs;
use std::path::PathBuf;

use climb_core::CommandPath;
use climb_discovery::discover::{option_lines, select_candidates};
use climb_discovery::parse_help_text;

const MIN_CONFIDENCE: f64 = 0.35;
const MAX_SUBCOMMANDS: usize = 15;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(path).expect("fixture file must be readable")
}

fn command_names(help: &str) -> Vec<String> {
    parse_help_text(help)
        .commands
        .into_iter()
        .map(|command| command.name)
        .collect()
}

#[test]
fn test_parse_git_fixture_extracts_grouped_commands() {
    let result = parse_help_text(&fixture("git-help.txt"));

    assert_eq!(result.commands.len(), 22);
    assert!(result.find_command("clone").is_some());
    assert!(result.find_command("push").is_some());
    assert!(result.find_command("grow").is_none());
    assert!(result.find_command("start").is_none());
    assert!(
        result
            .commands
            .iter()
            .all(|command| (command.confidence - 0.90).abs() < 1e-9)
    );
    // Flags named in the usage synopsis are not options.
    assert!(result.options.is_empty());
}

#[test]
fn test_git_fixture_selection_is_sorted_and_capped() {
    let result = parse_help_text(&fixture("git-help.txt"));
    let selected = select_candidates(
        &result.commands,
        &CommandPath::root(),
        MIN_CONFIDENCE,
        MAX_SUBCOMMANDS,
    );
    let names: Vec<_> = selected.iter().map(|command| command.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "add", "bisect", "branch", "clone", "commit", "diff", "fetch", "grep", "init", "log",
            "merge", "mv", "pull", "push", "rebase",
        ]
    );
}

#[test]
fn test_selection_drops_segments_already_in_path() {
    let result = parse_help_text(&fixture("git-help.txt"));
    let path = CommandPath::from_segments(["add"]);
    let selected = select_candidates(&result.commands, &path, MIN_CONFIDENCE, MAX_SUBCOMMANDS);
    assert!(selected.iter().all(|command| command.name != "add"));
    assert_eq!(selected.len(), MAX_SUBCOMMANDS);
}

#[test]
fn test_parse_gnu_ls_fixture_has_options_only() {
    let result = parse_help_text(&fixture("gnu-ls-help.txt"));
    assert!(result.commands.is_empty(), "{:?}", result.commands);

    let all = result.find_option("-a").expect("missing -a");
    assert_eq!(all.long.as_deref(), Some("--all"));

    let block_size = result.find_option("--block-size").expect("missing --block-size");
    assert_eq!(block_size.argument.as_deref(), Some("SIZE"));

    let color = result.find_option("--color").expect("missing --color");
    assert_eq!(color.argument.as_deref(), Some("[WHEN]"));

    let width = result.find_option("--width").expect("missing --width");
    assert_eq!(width.short.as_deref(), Some("-w"));
    assert_eq!(width.argument.as_deref(), Some("COLS"));

    assert!(result.find_option("-1").is_some());
    assert!(result.find_option("--version").is_some());
}

#[test]
fn test_gnu_ls_option_lines() {
    let result = parse_help_text(&fixture("gnu-ls-help.txt"));
    let lines = option_lines(&result.options, 50);
    assert!(lines.contains(&"-a,--all".to_string()));
    assert!(lines.contains(&"--block-size SIZE".to_string()));
    assert!(lines.contains(&"--color [WHEN]".to_string()));

    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);

    assert_eq!(option_lines(&result.options, 3).len(), 3);
}

#[test]
fn test_parse_clap_fixture() {
    let result = parse_help_text(&fixture("clap-help.txt"));
    assert_eq!(
        command_names(&fixture("clap-help.txt")),
        ["build", "check", "clean", "run", "help"]
    );
    assert!(result.commands.iter().all(|command| command.confidence >= 0.7));
    assert_eq!(
        result.find_command("build").unwrap().description.as_deref(),
        Some("Compile the current package")
    );

    let verbose = result.find_option("--verbose").expect("missing --verbose");
    assert_eq!(verbose.short.as_deref(), Some("-v"));
    assert!(verbose.argument.is_none());

    let color = result.find_option("--color").expect("missing --color");
    assert_eq!(color.argument.as_deref(), Some("<WHEN>"));

    let directory = result.find_option("-C").expect("missing -C");
    assert!(directory.long.is_none());
    assert_eq!(directory.argument.as_deref(), Some("<DIRECTORY>"));
}

#[test]
fn test_parse_cobra_fixture() {
    let result = parse_help_text(&fixture("cobra-help.txt"));
    assert_eq!(
        command_names(&fixture("cobra-help.txt")),
        ["apply", "completion", "delete", "get", "help"]
    );
    assert!(result.commands.iter().all(|command| command.confidence >= 0.7));

    let namespace = result.find_option("-n").expect("missing -n");
    assert_eq!(namespace.long.as_deref(), Some("--namespace"));
    assert_eq!(namespace.argument.as_deref(), Some("string"));
    // Global flags are options too.
    assert!(result.find_option("--context").is_some());
    // The usage synopsis lines never become commands.
    assert!(result.find_command("deployctl").is_none());
}

#[test]
fn test_wrapped_descriptions_are_not_commands() {
    let result = parse_help_text(&fixture("wrapped-help.txt"));
    assert_eq!(
        command_names(&fixture("wrapped-help.txt")),
        ["sync", "status", "prune"]
    );
    assert!(result.find_command("entries").is_none());
    assert!(result.find_command("anything").is_none());
    assert!(result.find_option("--quiet").is_some());
}

#[test]
fn test_colored_help_parses_like_plain_help() {
    let plain = fixture("clap-help.txt");
    let colored = plain
        .replace("Commands:", "\x1b[1;4mCommands:\x1b[0m")
        .replace("Options:", "\x1b[1;4mOptions:\x1b[0m")
        .replace("  build", "  \x1b[1mbuild\x1b[0m")
        .replace("--verbose", "\x1b[1m--verbose\x1b[0m");
    assert_ne!(plain, colored);
    assert_eq!(parse_help_text(&plain), parse_help_text(&colored));
}

#[test]
fn test_parsing_is_deterministic() {
    for name in [
        "git-help.txt",
        "gnu-ls-help.txt",
        "clap-help.txt",
        "cobra-help.txt",
        "wrapped-help.txt",
    ] {
        let help = fixture(name);
        assert_eq!(parse_help_text(&help), parse_help_text(&help), "{name}");
    }
}
