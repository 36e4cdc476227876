use std::fs;
use std::io;
use std::path::Path;

use super::error::CleanupWarning;
use super::workspace::TempArtifact;

/// Best-effort removal of one file. Already gone is fine.
pub fn remove_temp_file(path: &Path) -> Option<CleanupWarning> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed temporary file");
            None
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
            Some(CleanupWarning {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

/// Remove the concat list and every normalized artifact of a run.
/// Failures are returned as warnings and never stop the sweep.
pub fn cleanup(manifest: Option<&Path>, artifacts: &[TempArtifact]) -> Vec<CleanupWarning> {
    manifest
        .into_iter()
        .chain(artifacts.iter().map(|a| a.path.as_path()))
        .filter_map(remove_temp_file)
        .collect()
}
