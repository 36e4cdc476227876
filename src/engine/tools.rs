use anyhow::{Context, Result};
use std::process::Command;

use super::runner::Tools;

/// First line of `<program> -version`
fn tool_version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .with_context(|| format!("Failed to execute {}. Is it installed and in PATH?", program))?;

    if !output.status.success() {
        anyhow::bail!("{} command failed with status: {}", program, output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version
pub fn ffmpeg_version(tools: &Tools) -> Result<String> {
    tool_version(&tools.ffmpeg)
}

/// Check if ffprobe is available and return its version
pub fn ffprobe_version(tools: &Tools) -> Result<String> {
    tool_version(&tools.ffprobe)
}

/// Check if ffmpeg was built with `encoder` (e.g. "libx264")
pub fn encoder_available(tools: &Tools, encoder: &str) -> bool {
    let output = Command::new(&tools.ffmpeg)
        .arg("-hide_banner")
        .arg("-encoders")
        .output();

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(encoder)),
        _ => false,
    }
}
