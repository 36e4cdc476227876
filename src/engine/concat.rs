// Stream-copy join of already compatible files via the concat demuxer

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::error::CombineError;
use super::runner::{ToolRunner, Tools};

/// One `file '<path>'` directive. Single quotes inside the path are closed,
/// escaped and reopened (`'\''`), the way the concat demuxer expects.
pub fn manifest_line(path: &Path) -> Result<String, String> {
    let text = path
        .to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {}", path.display()))?;
    Ok(format!("file '{}'", text.replace('\'', r"'\''")))
}

/// Manifest text for `paths`, in order, newline terminated
pub fn render_manifest(paths: &[PathBuf]) -> Result<String, String> {
    let mut contents = String::new();
    for path in paths {
        // The demuxer resolves relative entries against the list's directory
        let absolute = std::path::absolute(path)
            .map_err(|e| format!("cannot resolve {}: {}", path.display(), e))?;
        contents.push_str(&manifest_line(&absolute)?);
        contents.push('\n');
    }
    Ok(contents)
}

/// Write the concat list for `paths` to `manifest_path`
pub fn write_manifest(manifest_path: &Path, paths: &[PathBuf]) -> Result<(), CombineError> {
    let fail = |reason: String| CombineError::Manifest {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let contents = render_manifest(paths).map_err(fail)?;
    let mut file = fs::File::create(manifest_path).map_err(|e| fail(e.to_string()))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| fail(e.to_string()))?;

    tracing::debug!(manifest = %manifest_path.display(), entries = paths.len(), "wrote concat list");
    Ok(())
}

/// Build the ffmpeg call that joins the files listed in `manifest`
pub fn build_concat_cmd(tools: &Tools, manifest: &Path, output: &Path) -> Command {
    let mut cmd = Command::new(&tools.ffmpeg);

    cmd.arg("-hide_banner").arg("-nostdin").arg("-v").arg("error");

    // Concat demuxer; entries are local paths we wrote ourselves
    cmd.arg("-f").arg("concat").arg("-safe").arg("0");
    cmd.arg("-i").arg(manifest);

    // No re-encoding at this stage
    cmd.arg("-c").arg("copy");

    cmd.arg("-y");
    cmd.arg(output);

    cmd
}

/// Join `paths` into `output`. The manifest is left on disk; removing it is
/// the caller's cleanup step and happens whatever the outcome.
pub fn concat<R: ToolRunner + ?Sized>(
    runner: &R,
    tools: &Tools,
    paths: &[PathBuf],
    manifest_path: &Path,
    output: &Path,
) -> Result<(), CombineError> {
    write_manifest(manifest_path, paths)?;

    let fail = |reason: String| CombineError::Concat {
        output: output.to_path_buf(),
        reason,
    };

    tracing::info!(output = %output.display(), inputs = paths.len(), "joining with stream copy");
    let result = runner
        .run(build_concat_cmd(tools, manifest_path, output))
        .map_err(|e| fail(format!("could not run ffmpeg: {}", e)))?;

    if !result.success {
        return Err(fail(result.failure_reason()));
    }

    Ok(())
}
