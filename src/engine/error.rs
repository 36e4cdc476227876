use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::validate::ValidationError;

/// Failures of a combine run. Each variant names the file or stage at fault.
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("no files selected")]
    NoFilesSelected,

    #[error("invalid encode settings: {}", format_validation(.0))]
    InvalidProfile(Vec<ValidationError>),

    #[error("output {} is also one of the inputs", .0.display())]
    OutputIsInput(PathBuf),

    #[error("ffprobe failed for {}: {reason}", .path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("re-encoding input #{} ({}) failed: {reason}", .index + 1, .path.display())]
    Encode {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("could not write concat list {}: {reason}", .path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("concatenation into {} failed: {reason}", .output.display())]
    Concat { output: PathBuf, reason: String },
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A temp file that could not be removed. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not remove temporary file {}: {}",
            self.path.display(),
            self.reason
        )
    }
}
