//! Help capture protocol.

use std::time::Duration;

use climb_core::CommandPath;
use tracing::debug;

use crate::executor::{ExecOptions, ProcessRunner};

/// The three help-eliciting invocations for `path`, in the order tried:
/// `path --help`, `path -h`, `help path`.
pub fn help_invocations(path: &CommandPath) -> [Vec<String>; 3] {
    let segments = path.segments();
    let with_flag = |flag: &str| {
        let mut args = segments.to_vec();
        args.push(flag.to_string());
        args
    };
    let mut help_first = Vec::with_capacity(segments.len() + 1);
    help_first.push("help".to_string());
    help_first.extend(segments.iter().cloned());

    [with_flag("--help"), with_flag("-h"), help_first]
}

/// Returns the first non-blank help text `program` prints for `path`.
///
/// Failures of individual probes are logged and skipped. When every probe
/// fails or prints only whitespace the result is an empty string.
pub fn capture_help(
    runner: &dyn ProcessRunner,
    program: &str,
    path: &CommandPath,
    timeout: Duration,
) -> String {
    let options = ExecOptions::accepting(timeout);
    for args in help_invocations(path) {
        match runner.execute(program, &args, &options) {
            Ok(output) => {
                let text = output.text();
                if !text.trim().is_empty() {
                    debug!(program, ?args, len = text.len(), "Captured help text");
                    return text.to_string();
                }
                debug!(program, ?args, "Probe printed nothing");
            }
            Err(err) => debug!(program, ?args, error = %err, "Help probe failed"),
        }
    }
    debug!(program, path = %path, "No help text available");
    String::new()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ProcessError;
    use crate::executor::ExecOutput;

    /// Answers probes from a fixed list of responses, recording every call.
    struct Scripted {
        responses: Mutex<Vec<Result<ExecOutput, ProcessError>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<ExecOutput, ProcessError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProcessRunner for Scripted {
        fn execute(
            &self,
            _program: &str,
            args: &[String],
            options: &ExecOptions,
        ) -> Result<ExecOutput, ProcessError> {
            assert!(options.accept_output_on_error);
            self.calls.lock().unwrap().push(args.to_vec());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn stdout(text: &str) -> Result<ExecOutput, ProcessError> {
        Ok(ExecOutput {
            stdout: text.to_string(),
            ..ExecOutput::default()
        })
    }

    fn timeout() -> Result<ExecOutput, ProcessError> {
        Err(ProcessError::Timeout {
            program: "p".to_string(),
            timeout: Duration::from_secs(8),
        })
    }

    #[test]
    fn test_invocation_order() {
        let path = CommandPath::from_segments(["remote", "add"]);
        let [first, second, third] = help_invocations(&path);
        assert_eq!(first, ["remote", "add", "--help"]);
        assert_eq!(second, ["remote", "add", "-h"]);
        assert_eq!(third, ["help", "remote", "add"]);
    }

    #[test]
    fn test_first_non_blank_output_wins() {
        let runner = Scripted::new(vec![stdout("  \n"), stdout("Usage: p"), stdout("unused")]);
        let text = capture_help(&runner, "p", &CommandPath::root(), Duration::from_secs(8));
        assert_eq!(text, "Usage: p");
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failures_fall_through_to_help_subcommand() {
        let runner = Scripted::new(vec![timeout(), timeout(), stdout("commands:")]);
        let text = capture_help(
            &runner,
            "p",
            &CommandPath::from_segments(["build"]),
            Duration::from_secs(8),
        );
        assert_eq!(text, "commands:");
        assert_eq!(runner.calls.lock().unwrap()[2], ["help", "build"]);
    }

    #[test]
    fn test_all_probes_failing_yields_empty_text() {
        let runner = Scripted::new(vec![timeout(), timeout(), timeout()]);
        let text = capture_help(&runner, "p", &CommandPath::root(), Duration::from_secs(8));
        assert!(text.is_empty());
    }
}
