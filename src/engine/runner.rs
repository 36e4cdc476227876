// Blocking execution of the external ffmpeg/ffprobe tools

use serde::{Deserialize, Serialize};
use std::io;
use std::process::{Command, Stdio};

/// Program names/paths for the external tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tools {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Captured result of one finished tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Short, human readable failure description: exit code plus the stderr tail
    pub fn failure_reason(&self) -> String {
        let code = self
            .exit_code
            .map(|c| format!("exit code {}", c))
            .unwrap_or_else(|| "terminated by signal".to_string());
        let tail = stderr_tail(&self.stderr, STDERR_TAIL_LINES);
        if tail.is_empty() {
            code
        } else {
            format!("{}: {}", code, tail)
        }
    }
}

/// Lines of stderr kept in error messages (the end is the relevant part)
pub const STDERR_TAIL_LINES: usize = 10;

/// Last `max_lines` non-empty lines of `stderr`, joined with newlines
pub fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

/// Seam between the pipeline and process execution.
///
/// Every call blocks until the child exits. Implementations must not return
/// before exit status and output are both available.
pub trait ToolRunner {
    fn run(&self, cmd: Command) -> io::Result<ToolOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, mut cmd: Command) -> io::Result<ToolOutput> {
        tracing::debug!(command = %format_command(&cmd), "running external tool");

        cmd.stdin(Stdio::null());
        let output = cmd.output()?;

        let result = ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success {
            tracing::debug!(status = %output.status, "external tool failed");
        }

        Ok(result)
    }
}

/// Render a command as a shell-quoted line for logs and dry runs
pub fn format_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(command_args(cmd));

    parts
        .iter()
        .map(|p| {
            shlex::try_quote(p)
                .map(|q| q.into_owned())
                .unwrap_or_else(|_| p.clone())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Arguments of a command as plain strings
pub fn command_args(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}
