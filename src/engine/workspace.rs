use std::path::{Path, PathBuf};
use uuid::Uuid;

const DEFAULT_EXTENSION: &str = "mp4";

/// Temp-file namespace of one combine run.
///
/// Every name carries the run id, so two runs sharing a temp directory never
/// touch each other's files.
#[derive(Debug, Clone)]
pub struct RunWorkspace {
    pub run_id: Uuid,
    pub dir: PathBuf,
    pub extension: String,
}

/// Normalized copy of one input, owned by the run that created it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempArtifact {
    pub index: usize,
    pub source: PathBuf,
    pub path: PathBuf,
}

impl RunWorkspace {
    /// Fresh workspace in `dir`; temp files reuse the output's container
    pub fn new(dir: &Path, output: &Path) -> Self {
        Self::with_id(Uuid::new_v4(), dir, output)
    }

    pub fn with_id(run_id: Uuid, dir: &Path, output: &Path) -> Self {
        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION)
            .to_string();

        Self {
            run_id,
            dir: dir.to_path_buf(),
            extension,
        }
    }

    /// Normalized output for input `index`
    pub fn artifact_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("clipjoin-{}-{}.{}", self.run_id, index, self.extension))
    }

    /// Concat demuxer list for this run
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(format!("clipjoin-{}-concat.txt", self.run_id))
    }
}
