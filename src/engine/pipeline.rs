//! One combine run: inspect, check, optionally normalize, concatenate, clean up.
//!
//! ```text
//! Idle -> Inspecting -> Uniform ----------------------------------> Concatenating
//!                    -> Mismatched -> AwaitingConfirmation -> Cancelled
//!                                                          -> Normalizing -> Concatenating
//! Concatenating -> Cleanup -> Done | Failed
//! ```
//!
//! The request is a snapshot: the ordered file list and the encode profile
//! are owned by the run and cannot change while it executes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::check::{Compatibility, Mismatch, check};
use super::cleanup::{cleanup, remove_temp_file};
use super::concat::{build_concat_cmd, concat};
use super::error::{CleanupWarning, CombineError};
use super::normalize::{build_encode_cmd, normalize};
use super::probe::{StreamProfile, inspect};
use super::profile::EncodeProfile;
use super::runner::{ToolRunner, Tools};
use super::validate::validate_profile;
use super::workspace::{RunWorkspace, TempArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Inspecting,
    Uniform,
    Mismatched,
    AwaitingConfirmation,
    Cancelled,
    Normalizing,
    Concatenating,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Inspecting => "inspecting",
            Stage::Uniform => "uniform",
            Stage::Mismatched => "mismatched",
            Stage::AwaitingConfirmation => "awaiting confirmation",
            Stage::Cancelled => "cancelled",
            Stage::Normalizing => "normalizing",
            Stage::Concatenating => "concatenating",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Frozen inputs of one run
#[derive(Debug, Clone)]
pub struct CombineRequest {
    pub files: Vec<PathBuf>,
    pub output: PathBuf,
    pub profile: EncodeProfile,
    /// Existing directory for normalized files and the concat list
    pub temp_dir: PathBuf,
}

impl CombineRequest {
    pub fn new(files: Vec<PathBuf>, output: PathBuf, profile: EncodeProfile) -> Self {
        Self {
            files,
            output,
            profile,
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Asked once per run when inputs differ
pub trait Prompt {
    /// Return true to re-encode every input, false to cancel the run
    fn confirm_reencode(
        &mut self,
        files: &[PathBuf],
        profiles: &[StreamProfile],
        mismatch: &Mismatch,
    ) -> bool;
}

/// Prompt with a fixed answer (`--yes`, tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn confirm_reencode(&mut self, _: &[PathBuf], _: &[StreamProfile], _: &Mismatch) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done { output: PathBuf, reencoded: bool },
    Cancelled,
}

/// Result of a run plus any cleanup problems, which never replace the result
#[derive(Debug)]
pub struct CombineReport {
    pub outcome: Result<Outcome, CombineError>,
    pub warnings: Vec<CleanupWarning>,
}

/// What a run would do, without running any encoder
#[derive(Debug)]
pub struct Plan {
    pub profiles: Vec<StreamProfile>,
    pub compatibility: Compatibility,
    pub commands: Vec<Command>,
}

pub struct Combiner<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    tools: &'a Tools,
}

impl<'a, R: ToolRunner + ?Sized> Combiner<'a, R> {
    pub fn new(runner: &'a R, tools: &'a Tools) -> Self {
        Self { runner, tools }
    }

    /// Probe every file in order; the first failure aborts
    pub fn inspect_all(&self, files: &[PathBuf]) -> Result<Vec<StreamProfile>, CombineError> {
        files
            .iter()
            .map(|file| inspect(self.runner, self.tools, file))
            .collect()
    }

    /// Run the whole pipeline. `on_stage` sees every state transition,
    /// starting with Idle and ending with exactly one of Done, Cancelled or Failed.
    pub fn combine<P, F>(&self, request: &CombineRequest, prompt: &mut P, mut on_stage: F) -> CombineReport
    where
        P: Prompt + ?Sized,
        F: FnMut(Stage),
    {
        let mut warnings = Vec::new();
        let mut enter = |stage: Stage| {
            tracing::debug!(%stage, "combine stage");
            on_stage(stage);
        };

        enter(Stage::Idle);
        let outcome = self.run(request, prompt, &mut enter, &mut warnings);

        match &outcome {
            Ok(Outcome::Done { output, reencoded }) => {
                tracing::info!(output = %output.display(), reencoded, "combine finished");
                enter(Stage::Done);
            }
            Ok(Outcome::Cancelled) => {
                tracing::info!("combine cancelled");
                enter(Stage::Cancelled);
            }
            Err(e) => {
                tracing::error!(error = %e, "combine failed");
                enter(Stage::Failed);
            }
        }

        CombineReport { outcome, warnings }
    }

    /// Inspect and check, then list the commands a run would execute
    pub fn plan(&self, request: &CombineRequest) -> Result<Plan, CombineError> {
        preflight(request)?;
        let profiles = self.inspect_all(&request.files)?;
        let compatibility = check(&profiles);
        let workspace = RunWorkspace::new(&request.temp_dir, &request.output);

        let mut commands = Vec::new();
        if !compatibility.is_uniform() {
            let fps = profiles[0].frame_rate;
            for (index, file) in request.files.iter().enumerate() {
                commands.push(build_encode_cmd(
                    self.tools,
                    file,
                    &workspace.artifact_path(index),
                    &request.profile,
                    fps,
                ));
            }
        }
        commands.push(build_concat_cmd(
            self.tools,
            &workspace.manifest_path(),
            &request.output,
        ));

        Ok(Plan {
            profiles,
            compatibility,
            commands,
        })
    }

    fn run<P: Prompt + ?Sized>(
        &self,
        request: &CombineRequest,
        prompt: &mut P,
        enter: &mut dyn FnMut(Stage),
        warnings: &mut Vec<CleanupWarning>,
    ) -> Result<Outcome, CombineError> {
        enter(Stage::Inspecting);
        preflight(request)?;
        let profiles = self.inspect_all(&request.files)?;
        let workspace = RunWorkspace::new(&request.temp_dir, &request.output);

        match check(&profiles) {
            Compatibility::Uniform => {
                enter(Stage::Uniform);
                tracing::info!(files = request.files.len(), "inputs are uniform");
                self.join(request, &workspace, &request.files, &[], enter, warnings)?;
                Ok(Outcome::Done {
                    output: request.output.clone(),
                    reencoded: false,
                })
            }
            Compatibility::Mismatched(mismatch) => {
                enter(Stage::Mismatched);
                tracing::info!(
                    index = mismatch.index,
                    file = %request.files[mismatch.index].display(),
                    "inputs differ from the first file"
                );

                enter(Stage::AwaitingConfirmation);
                if !prompt.confirm_reencode(&request.files, &profiles, &mismatch) {
                    return Ok(Outcome::Cancelled);
                }

                enter(Stage::Normalizing);
                let artifacts = match normalize(
                    self.runner,
                    self.tools,
                    &request.files,
                    profiles[0].frame_rate,
                    &request.profile,
                    &workspace,
                    warnings,
                ) {
                    Ok(artifacts) => artifacts,
                    Err(e) => {
                        // normalize has already removed its partial output
                        enter(Stage::Cleanup);
                        return Err(e);
                    }
                };

                let paths: Vec<PathBuf> = artifacts.iter().map(|a| a.path.clone()).collect();
                self.join(request, &workspace, &paths, &artifacts, enter, warnings)?;
                Ok(Outcome::Done {
                    output: request.output.clone(),
                    reencoded: true,
                })
            }
        }
    }

    /// Concatenate, then clean up whatever the outcome
    fn join(
        &self,
        request: &CombineRequest,
        workspace: &RunWorkspace,
        paths: &[PathBuf],
        artifacts: &[TempArtifact],
        enter: &mut dyn FnMut(Stage),
        warnings: &mut Vec<CleanupWarning>,
    ) -> Result<(), CombineError> {
        enter(Stage::Concatenating);
        let manifest = workspace.manifest_path();
        let output_existed = request.output.exists();

        let result = concat(self.runner, self.tools, paths, &manifest, &request.output);

        enter(Stage::Cleanup);
        warnings.extend(cleanup(Some(&manifest), artifacts));
        if result.is_err() && !output_existed {
            // Partial output from a failed join; an older file we overwrote stays
            warnings.extend(remove_temp_file(&request.output));
        }

        result
    }
}

/// Checks that need no external tool and leave no trace on disk
fn preflight(request: &CombineRequest) -> Result<(), CombineError> {
    if request.files.is_empty() {
        return Err(CombineError::NoFilesSelected);
    }

    validate_profile(&request.profile).map_err(CombineError::InvalidProfile)?;

    if request.files.iter().any(|f| same_file(f, &request.output)) {
        return Err(CombineError::OutputIsInput(request.output.clone()));
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => match (std::path::absolute(a), std::path::absolute(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        },
    }
}
