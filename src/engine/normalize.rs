// Re-encoding of mismatched inputs onto a common profile

use std::path::{Path, PathBuf};
use std::process::Command;

use super::cleanup::{cleanup, remove_temp_file};
use super::error::{CleanupWarning, CombineError};
use super::probe::FrameRate;
use super::profile::{EncodeProfile, Resolution, VideoCodec};
use super::runner::{ToolRunner, Tools};
use super::workspace::{RunWorkspace, TempArtifact};

/// Video filter chain for a normalized file. Scaling happens before the
/// frame rate conversion.
pub fn build_filter(resolution: Resolution, fps: FrameRate) -> String {
    match resolution {
        Resolution::Original => format!("fps={}", fps),
        Resolution::Scale { width, height } => format!("scale={}:{},fps={}", width, height, fps),
    }
}

/// Build the ffmpeg call that re-encodes `input` into `output`
pub fn build_encode_cmd(
    tools: &Tools,
    input: &Path,
    output: &Path,
    profile: &EncodeProfile,
    fps: FrameRate,
) -> Command {
    let mut cmd = Command::new(&tools.ffmpeg);

    cmd.arg("-hide_banner").arg("-nostdin").arg("-v").arg("error");

    // Input file
    cmd.arg("-i").arg(input);

    // Video filters (scale and fps)
    cmd.arg("-vf").arg(build_filter(profile.resolution, fps));

    // Video codec and speed
    cmd.arg("-c:v").arg(profile.video_codec.encoder());
    match profile.video_codec {
        VideoCodec::Vp9 => {
            cmd.arg("-cpu-used")
                .arg(profile.preset.vp9_cpu_used().to_string());
        }
        VideoCodec::Libx264 | VideoCodec::Libx265 => {
            cmd.arg("-preset").arg(profile.preset.as_str());
        }
    }

    // Rate control
    cmd.arg("-crf").arg(profile.crf.to_string());
    if profile.video_codec == VideoCodec::Vp9 {
        // libvpx only honours CRF as constant quality with a zero bitrate target
        cmd.arg("-b:v").arg("0");
    }

    // Audio
    cmd.arg("-c:a").arg(profile.audio_codec.ffmpeg_name());

    // Overwrite
    cmd.arg("-y");

    // Output
    cmd.arg(output);

    cmd
}

/// Re-encode every input, in order, one at a time.
///
/// All or nothing: when input `k` fails, the artifacts for `0..k` and any
/// partial output for `k` are removed before the error is returned, and
/// removal problems are appended to `warnings`.
pub fn normalize<R: ToolRunner + ?Sized>(
    runner: &R,
    tools: &Tools,
    inputs: &[PathBuf],
    reference_fps: FrameRate,
    profile: &EncodeProfile,
    workspace: &RunWorkspace,
    warnings: &mut Vec<CleanupWarning>,
) -> Result<Vec<TempArtifact>, CombineError> {
    let mut artifacts = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        let output = workspace.artifact_path(index);
        tracing::info!(
            input = %input.display(),
            "re-encoding {}/{}",
            index + 1,
            inputs.len()
        );

        match encode_one(runner, tools, input, &output, profile, reference_fps) {
            Ok(()) => artifacts.push(TempArtifact {
                index,
                source: input.clone(),
                path: output,
            }),
            Err(reason) => {
                tracing::warn!(
                    input = %input.display(),
                    produced = artifacts.len(),
                    "re-encode failed, discarding normalized files"
                );
                warnings.extend(remove_temp_file(&output));
                warnings.extend(cleanup(None, &artifacts));
                return Err(CombineError::Encode {
                    index,
                    path: input.clone(),
                    reason,
                });
            }
        }
    }

    Ok(artifacts)
}

/// One encode invocation; retrying it with the same arguments is safe
fn encode_one<R: ToolRunner + ?Sized>(
    runner: &R,
    tools: &Tools,
    input: &Path,
    output: &Path,
    profile: &EncodeProfile,
    fps: FrameRate,
) -> Result<(), String> {
    let cmd = build_encode_cmd(tools, input, output, profile, fps);
    let result = runner
        .run(cmd)
        .map_err(|e| format!("could not run ffmpeg: {}", e))?;

    if !result.success {
        return Err(result.failure_reason());
    }
    if !output.exists() {
        return Err("ffmpeg reported success but no output file was created".to_string());
    }

    Ok(())
}
