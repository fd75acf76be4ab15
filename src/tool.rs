use crate::{Error, Result};
use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An external program that reads its input from stdin and writes its result to stdout.
///
/// ```no_run
/// # use lossless_cst::ToolCommand;
/// # use std::time::Duration;
/// let python = ToolCommand::new("python3")
///     .arg("tools/py2xml.py")
///     .timeout(Duration::from_secs(5));
/// let xml = python.run("print('hi')\n")?;
/// # Ok::<(), lossless_cst::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// A command running `program` without arguments and with the default timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), timeout: Self::DEFAULT_TIMEOUT }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// How long [`ToolCommand::run`] waits before killing the program.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs the program with `input` on stdin and returns what it printed to stdout.
    ///
    /// Blocks until the program exits. If it is still running when the timeout elapses,
    /// it is killed and [`Error::ToolTimeout`] is returned; nothing it printed is kept.
    /// A non-zero exit status yields [`Error::ToolFailed`] with the program’s stderr.
    pub fn run(&self, input: &str) -> Result<String> {
        debug!(program = %self.program, args = ?self.args, "spawning tool");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| stdio_error("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| stdio_error("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| stdio_error("stderr"))?;

        let input = input.to_owned();
        let stdin_handle = thread::spawn(move || {
            let mut stdin = stdin;
            match stdin.write_all(input.as_bytes()) {
                // the program is free to exit without reading all of its input
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                result => result,
            }
        });
        let stdout_handle = spawn_reader(stdout);
        let stderr_handle = spawn_reader(stderr);

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                self.kill(&mut child);
                return Err(Error::ToolTimeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };
        debug!(program = %self.program, %status, elapsed = ?start.elapsed(), "tool exited");

        join(stdin_handle)??;
        let stdout = join(stdout_handle)??;
        let stderr = join(stderr_handle)??;

        if !status.success() {
            return Err(Error::ToolFailed {
                program: self.program.clone(),
                status,
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }

        trace!(bytes = stdout.len(), "tool output");
        String::from_utf8(stdout).map_err(|err| Error::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    fn kill(&self, child: &mut Child) {
        warn!(program = %self.program, timeout = ?self.timeout, "killing tool after timeout");
        if let Err(err) = child.kill() {
            debug!(%err, "failed to kill tool");
        }
        // reap it, the stdio threads are left to finish on their own
        if let Err(err) = child.wait() {
            debug!(%err, "failed to wait for killed tool");
        }
    }
}

fn spawn_reader(mut source: impl Read + Send + 'static) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join<T>(handle: JoinHandle<T>) -> io::Result<T> {
    handle.join().map_err(|_| io::Error::other("tool I/O thread panicked"))
}

fn stdio_error(stream: &str) -> io::Error {
    io::Error::other(format!("failed to capture {stream} of tool"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn pipes_stdin_to_stdout() {
        let output = ToolCommand::new("cat").run("class K {}\n").unwrap();
        assert_eq!(output, "class K {}\n");
    }

    #[test]
    fn large_input() {
        let input = "x".repeat(1 << 20);
        let output = ToolCommand::new("cat").run(&input).unwrap();
        assert_eq!(output.len(), input.len());
    }

    #[test]
    fn passes_arguments() {
        let output = ToolCommand::new("sh").args(["-c", "printf '%s-%s' \"$0\" \"$1\"", "a"]).arg("b").run("").unwrap();
        assert_eq!(output, "a-b");
    }

    #[test]
    fn non_zero_exit() {
        let error = ToolCommand::new("sh").args(["-c", "echo oops >&2; exit 3"]).run("").unwrap_err();
        match error {
            Error::ToolFailed { program, status, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn ignores_unread_input() {
        let output = ToolCommand::new("true").run(&"x".repeat(1 << 20)).unwrap();
        assert_eq!(output, "");
    }

    #[test]
    fn timeout_kills_tool() {
        let start = Instant::now();
        let error = ToolCommand::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(100))
            .run("")
            .unwrap_err();

        assert!(matches!(error, Error::ToolTimeout { timeout, .. } if timeout == Duration::from_millis(100)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_program() {
        let error = ToolCommand::new("surely-not-an-installed-program").run("").unwrap_err();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn default_timeout() {
        let command = ToolCommand::new("cat");
        assert_eq!(command.timeout, ToolCommand::DEFAULT_TIMEOUT);
        assert_eq!(command.program(), "cat");
    }
}
