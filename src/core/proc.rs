//! External process execution for fe.
//!
//! Runs a formatted keybind command as a single child process and captures what it printed.
//! The program and its arguments come already split from the formatter and are handed to the OS
//! directly, there is no shell in between. Standard input is closed since the terminal belongs to
//! the TUI while the child runs.

use std::fmt;
use std::io;
use std::process::{Command, ExitStatus, Stdio};

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct CommandOutput {
    program: String,
    status: ExitStatus,
    output: String,
}

impl CommandOutput {
    #[inline]
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Standard output followed by standard error.
    #[inline]
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.program, self.status)
    }
}

/// Runs `program` with `args`, waits for it, and captures stdout and stderr.
///
/// A spawn failure is returned as an error naming the program. A non-zero exit is not an
/// error here, check [CommandOutput::success].
pub fn run_command(program: &str, args: &[&str]) -> io::Result<CommandOutput> {
    let out = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                io::Error::new(e.kind(), format!("{program}: command not found"))
            } else {
                io::Error::new(e.kind(), format!("{program}: {e}"))
            }
        })?;

    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&out.stderr));

    Ok(CommandOutput {
        program: program.to_string(),
        status: out.status,
        output,
    })
}
