//! Process capability: run `<program> <args...>` with a deadline.
//!
//! Everything above this module talks to a [`ProcessRunner`], so probes can
//! be scripted in tests without spawning anything.

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::ProcessError;

/// Per-call execution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    pub timeout: Duration,
    /// Return captured output instead of failing on non-zero exit or
    /// timeout. Many CLIs print help and then exit non-zero.
    pub accept_output_on_error: bool,
}

impl ExecOptions {
    /// Strict options: any failure is an error.
    pub fn strict(timeout: Duration) -> Self {
        Self {
            timeout,
            accept_output_on_error: false,
        }
    }

    /// Lenient options used for help probes.
    pub fn accepting(timeout: Duration) -> Self {
        Self {
            timeout,
            accept_output_on_error: true,
        }
    }
}

/// Captured result of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was killed by a signal or by the deadline.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub timed_out: bool,
}

impl ExecOutput {
    /// Standard output, or standard error when standard output is blank.
    pub fn text(&self) -> &str {
        if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// The capability the discovery engine consumes.
pub trait ProcessRunner: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecOutput, ProcessError>;
}

/// Environment applied to every spawned probe.
fn probe_env() -> [(&'static str, &'static str); 10] {
    [
        // No graphical helpers.
        ("DISPLAY", ""),
        ("WAYLAND_DISPLAY", ""),
        ("BROWSER", "true"),
        ("DEBIAN_FRONTEND", "noninteractive"),
        ("TERM", "dumb"),
        ("NO_COLOR", "1"),
        // Help routed through a pager must not block on a tty.
        ("PAGER", "cat"),
        ("MANPAGER", "cat"),
        ("SYSTEMD_PAGER", "cat"),
        ("GIT_PAGER", "cat"),
    ]
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

/// How long a killed child's pipes may stay open before their readers are
/// abandoned. A grandchild that inherited them can hold them indefinitely.
const READER_GRACE: Duration = Duration::from_millis(200);

/// A background pipe reader. Bytes land in `buf` as they arrive, so output
/// read before a deadline survives a reader that never reaches EOF.
struct PipeReader {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<std::io::Result<()>>,
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<PipeReader> {
    let mut pipe = pipe?;
    let buf = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done) = mpsc::channel();
    let sink = Arc::clone(&buf);
    std::thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        let result = loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(read) => sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..read]),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => break Err(err),
            }
        };
        // The receiver is gone once the caller stopped waiting.
        let _ = done_tx.send(result);
    });
    Some(PipeReader { buf, done })
}

/// Waits for EOF until `deadline`, then takes whatever was read. A reader
/// still blocked at the deadline is detached.
fn collect(program: &str, reader: Option<PipeReader>, stream: &str, deadline: Instant) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    match reader
        .done
        .recv_timeout(deadline.saturating_duration_since(Instant::now()))
    {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(program, stream, error = %err, "Failed to read child output"),
        Err(RecvTimeoutError::Timeout) => {
            debug!(program, stream, "Output pipe still held open, detaching reader");
        }
        Err(RecvTimeoutError::Disconnected) => {
            debug!(program, stream, "Output reader thread panicked");
        }
    }
    let buf = reader.buf.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&buf).into_owned()
}

fn kill_and_reap(child: &mut Child, program: &str) {
    if let Err(err) = child.kill() {
        debug!(program, error = %err, "Failed to kill timed-out child");
    }
    if let Err(err) = child.wait() {
        debug!(program, error = %err, "Failed to reap timed-out child");
    }
}

impl ProcessRunner for SystemRunner {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<ExecOutput, ProcessError> {
        let started = Instant::now();
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(probe_env());

        let mut child = command.spawn().map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ProcessError::NotFound {
                    program: program.to_string(),
                }
            } else {
                ProcessError::Spawn {
                    program: program.to_string(),
                    source,
                }
            }
        })?;

        // Pipes are drained concurrently so a chatty child cannot fill its
        // buffer and stall before the deadline.
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let status = match child.wait_timeout(options.timeout) {
            Ok(status) => status,
            Err(source) => {
                kill_and_reap(&mut child, program);
                return Err(ProcessError::Io {
                    program: program.to_string(),
                    source,
                });
            }
        };
        let timed_out = status.is_none();
        if timed_out {
            kill_and_reap(&mut child, program);
        }
        // Pipes inherited by a grandchild outlive the child; the whole call
        // stays within the timeout plus a short grace.
        let now = Instant::now();
        let deadline = if timed_out {
            now + READER_GRACE
        } else {
            (started + options.timeout).max(now + READER_GRACE)
        };

        let output = ExecOutput {
            stdout: collect(program, stdout_reader, "stdout", deadline),
            stderr: collect(program, stderr_reader, "stderr", deadline),
            exit_code: status.and_then(|status| status.code()),
            duration: started.elapsed(),
            timed_out,
        };
        debug!(
            program,
            ?args,
            exit_code = ?output.exit_code,
            timed_out,
            elapsed_ms = output.duration.as_millis() as u64,
            stdout_len = output.stdout.len(),
            "Process finished"
        );

        if timed_out {
            let captured = !output.text().trim().is_empty();
            return if options.accept_output_on_error && captured {
                Ok(output)
            } else {
                Err(ProcessError::Timeout {
                    program: program.to_string(),
                    timeout: options.timeout,
                })
            };
        }
        if output.exit_code != Some(0) && !options.accept_output_on_error {
            return Err(ProcessError::NonZeroExit {
                program: program.to_string(),
                code: output.exit_code,
                stdout: output.stdout,
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_text_falls_back_to_stderr() {
        let output = ExecOutput {
            stdout: " \n".to_string(),
            stderr: "usage: x".to_string(),
            ..ExecOutput::default()
        };
        assert_eq!(output.text(), "usage: x");

        let output = ExecOutput {
            stdout: "help".to_string(),
            stderr: "warning".to_string(),
            ..ExecOutput::default()
        };
        assert_eq!(output.text(), "help");
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = SystemRunner::new()
            .execute(
                "climb-definitely-not-a-real-binary",
                &[],
                &ExecOptions::accepting(Duration::from_secs(1)),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_captures_stdout() {
        let output = SystemRunner::new()
            .execute(
                "sh",
                &sh("echo hello"),
                &ExecOptions::strict(Duration::from_secs(5)),
            )
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_respects_accept_flag() {
        let runner = SystemRunner::new();
        let args = sh("echo 'Usage: thing'; exit 2");

        let err = runner
            .execute("sh", &args, &ExecOptions::strict(Duration::from_secs(5)))
            .unwrap_err();
        assert!(matches!(err, ProcessError::NonZeroExit { code: Some(2), .. }));

        let output = runner
            .execute("sh", &args, &ExecOptions::accepting(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(output.exit_code, Some(2));
        assert!(output.stdout.contains("Usage: thing"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_without_output_is_error() {
        let err = SystemRunner::new()
            .execute(
                "sh",
                &sh("exec sleep 5"),
                &ExecOptions::accepting(Duration::from_millis(200)),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_keeps_partial_output_when_accepting() {
        let runner = SystemRunner::new();
        let args = sh("echo 'Usage: slow'; exec sleep 5");

        let output = runner
            .execute("sh", &args, &ExecOptions::accepting(Duration::from_millis(300)))
            .unwrap();
        assert!(output.timed_out);
        assert_eq!(output.exit_code, None);
        assert_eq!(output.stdout.trim(), "Usage: slow");

        let err = runner
            .execute("sh", &args, &ExecOptions::strict(Duration::from_millis(300)))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_is_bounded_when_grandchild_holds_pipes() {
        let runner = SystemRunner::new();
        let args = sh("echo partial; sleep 6 & sleep 6");

        let started = Instant::now();
        let output = runner
            .execute("sh", &args, &ExecOptions::accepting(Duration::from_millis(500)))
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
        assert!(output.timed_out);
        assert_eq!(output.stdout.trim(), "partial");

        let started = Instant::now();
        let err = runner
            .execute("sh", &args, &ExecOptions::strict(Duration::from_millis(500)))
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
        assert!(matches!(err, ProcessError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_child_with_background_job_returns_by_deadline() {
        let started = Instant::now();
        let output = SystemRunner::new()
            .execute(
                "sh",
                &sh("echo done; sleep 6 &"),
                &ExecOptions::strict(Duration::from_millis(500)),
            )
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
        assert!(!output.timed_out);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_env_disables_pager_and_color() {
        let output = SystemRunner::new()
            .execute(
                "sh",
                &sh("echo \"$PAGER $NO_COLOR $TERM\""),
                &ExecOptions::strict(Duration::from_secs(5)),
            )
            .unwrap();
        assert_eq!(output.stdout.trim(), "cat 1 dumb");
    }
}
