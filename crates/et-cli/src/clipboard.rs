//! Clipboard access through a platform command such as `pbpaste`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use et_core::{ClipboardError, ClipboardSource};

/// Longest a clipboard command may run before it is killed.
pub const CLIPBOARD_TIMEOUT: Duration = Duration::from_millis(300);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Reads the clipboard by running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemClipboard {
    Command {
        program: String,
        args: Vec<String>,
        timeout: Duration,
    },
    Disabled,
}

impl SystemClipboard {
    /// Builds a reader from a configured argv. An empty argv disables reads.
    pub fn from_command(argv: &[String]) -> Self {
        match argv.split_first() {
            Some((program, args)) if !program.trim().is_empty() => Self::Command {
                program: program.clone(),
                args: args.to_vec(),
                timeout: CLIPBOARD_TIMEOUT,
            },
            _ => Self::Disabled,
        }
    }

    #[must_use]
    pub fn with_timeout(self, limit: Duration) -> Self {
        match self {
            Self::Command { program, args, .. } => Self::Command {
                program,
                args,
                timeout: limit,
            },
            Self::Disabled => Self::Disabled,
        }
    }
}

impl ClipboardSource for SystemClipboard {
    /// Runs the command on the calling thread, bounded by its timeout so a
    /// hung clipboard tool cannot stall event handling.
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let Self::Command {
            program,
            args,
            timeout,
        } = self
        else {
            return Err(ClipboardError::Unavailable);
        };

        let mut child = Command::new(program.as_str())
            .args(args.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Drain stdout while waiting so large clipboards cannot fill the pipe.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipboardError::Reader("stdout not captured".to_string()))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + *timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ClipboardError::Reader(format!(
                    "{program} did not finish within {timeout:?}"
                )));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = reader
            .join()
            .map_err(|_| ClipboardError::Reader("stdout reader panicked".to_string()))??;
        if !status.success() {
            return Err(ClipboardError::Reader(format!(
                "{program} exited with {status}"
            )));
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
