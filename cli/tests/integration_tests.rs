use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const GIT_LIKE_HELP: &str = "\
usage: vcs [--version] [-C <path>] <command> [<args>]

start a working area
   clone     Clone a repository into a new directory
   init      Create an empty repository

work on the current change
   add       Add file contents to the index
   mv        Move or rename a file

Options:
  -C <path>          Run as if started in <path>
  -p, --paginate     Pipe all output into a pager
      --version      Print the version
";

/// An isolated environment: an empty config file and no overrides.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("config.yaml"), "").expect("failed to write config");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_climb"));
        command
            .env("CLIMB_CONFIG", self.path("config.yaml"))
            .env_remove("CLIMB_TARGET")
            .env_remove("CLIMB_REGISTRY_URL")
            .env_remove("RUST_LOG");
        command
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("failed to run climb")
    }

    fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn climb");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(stdin.as_bytes())
            .expect("failed to write stdin");
        child.wait_with_output().expect("failed to wait for climb")
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("failed to write file");
        path
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

// ---------------------------------------------------------------------------
// Offline parsing
// ---------------------------------------------------------------------------

#[test]
fn parse_file_prints_subcommand_tree() {
    let sandbox = Sandbox::new();
    let input = sandbox.write("vcs.txt", GIT_LIKE_HELP);

    let output = sandbox.run(&["parse-file", "--input", path_arg(&input), "--name", "vcs"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "vcs\n\
         ├─ add [c=0.45]\n\
         ├─ clone [c=0.45]\n\
         ├─ init [c=0.45]\n\
         └─ mv [c=0.45]\n"
    );
}

#[test]
fn parse_file_lists_options() {
    let sandbox = Sandbox::new();
    let input = sandbox.write("vcs.txt", GIT_LIKE_HELP);

    let output = sandbox.run(&["parse-file", "--input", path_arg(&input), "--options"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "help options\n\
         ├─ --version\n\
         ├─ -C <path>\n\
         └─ -p,--paginate\n"
    );
}

#[test]
fn parse_stdin_matches_parse_file() {
    let sandbox = Sandbox::new();
    let input = sandbox.write("vcs.txt", GIT_LIKE_HELP);

    let from_file = sandbox.run(&["parse-file", "--input", path_arg(&input)]);
    let from_stdin = sandbox.run_with_stdin(&["parse-stdin"], GIT_LIKE_HELP);
    assert!(from_stdin.status.success(), "stderr: {}", stderr(&from_stdin));
    assert_eq!(stdout(&from_file), stdout(&from_stdin));
}

#[test]
fn parse_stdin_empty_input_reports_nothing_detected() {
    let sandbox = Sandbox::new();

    let output = sandbox.run_with_stdin(&["parse-stdin"], "");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "help\n└─ (no further subcommands detected)\n");

    let output = sandbox.run_with_stdin(&["parse-stdin", "--options"], "");
    assert_eq!(stdout(&output), "help options\n└─ (no options detected)\n");
}

#[test]
fn parse_file_respects_configured_threshold() {
    let sandbox = Sandbox::new();
    let input = sandbox.write("vcs.txt", GIT_LIKE_HELP);
    let config = sandbox.write("strict.yaml", "min_confidence: 0.5\n");

    let output = sandbox.run(&[
        "--config",
        path_arg(&config),
        "parse-file",
        "--input",
        path_arg(&input),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "help\n└─ (no further subcommands detected)\n");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn parse_file_missing_input_fails() {
    let sandbox = Sandbox::new();
    let missing = sandbox.path("missing.txt");

    let output = sandbox.run(&["parse-file", "--input", path_arg(&missing)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("error: Failed to read"));
}

#[test]
fn invalid_config_fails_before_running() {
    let sandbox = Sandbox::new();
    let config = sandbox.write("bad.yaml", "min_confidence: 2.0\n");

    let output = sandbox.run_with_stdin(
        &["--config", path_arg(&config), "parse-stdin"],
        GIT_LIKE_HELP,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("min_confidence"));
}

#[test]
fn discover_without_target_fails() {
    let sandbox = Sandbox::new();
    let config = sandbox.write("blank.yaml", "target_program: \"\"\n");

    let output = sandbox.run(&["--config", path_arg(&config), "discover", "servers"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("error: "));
}

// ---------------------------------------------------------------------------
// Live discovery against a scripted program
// ---------------------------------------------------------------------------

#[cfg(unix)]
const FAKE_CLI: &str = r#"case "$1" in
  --help|-h)
    printf 'Usage: fake <command>\n\nCommands:\n  remote   Manage remotes\n  status   Show status\n\nOptions:\n  -v, --verbose   Be loud\n' ;;
  remote)
    printf 'Usage: fake remote <command>\n\nCommands:\n  add      Add a remote\n  remove   Remove a remote\n' ;;
  *)
    exit 1 ;;
esac
"#;

#[cfg(unix)]
#[test]
fn discover_lists_subcommands_with_look_ahead() {
    let sandbox = Sandbox::new();
    let script = sandbox.write("fake.sh", FAKE_CLI);
    let script = path_arg(&script);

    let output = sandbox.run(&["discover", "sh", script]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        format!("sh {script}\n├─ remote [c=0.90, sub]\n└─ status [c=0.90]\n")
    );
}

#[cfg(unix)]
#[test]
fn discover_trailing_marker_lists_options() {
    let sandbox = Sandbox::new();
    let script = sandbox.write("fake.sh", FAKE_CLI);
    let script = path_arg(&script);

    let output = sandbox.run(&["discover", "sh", script, "--"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        format!("sh {script} options\n└─ -v,--verbose\n")
    );
}
