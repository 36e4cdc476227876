// Full combine runs against a scripted ffprobe/ffmpeg stand-in
//
// Every scenario checks which tools ran, what the concat list contained and
// that nothing was left behind in the temp directory.

use clipjoin::engine::{
    CombineError, Combiner, EncodeProfile, FixedAnswer, Outcome, Resolution, Stage, Tools,
};
use clipjoin::playlist::{Move, Playlist};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::common::fake_runner::*;
use crate::common::helpers::*;

fn manifest_for(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display()))
        .collect()
}

fn scaled_720p() -> EncodeProfile {
    EncodeProfile {
        resolution: Resolution::Scale {
            width: 1280,
            height: 720,
        },
        ..EncodeProfile::default()
    }
}

// ============================================================================
// Uniform inputs: stream copy only
// ============================================================================

#[test]
fn uniform_inputs_are_joined_without_reencoding() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4"), fx.input("c.mp4")];
    let runner = files.iter().fold(FakeRunner::new(), |r, f| {
        r.with_file(f, FakeMedia::h264(1920, 1080))
    });
    let tools = Tools::default();
    let mut stages = Vec::new();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |s| stages.push(s),
    );

    assert_eq!(
        report.outcome.unwrap(),
        Outcome::Done {
            output: fx.output(),
            reencoded: false
        }
    );
    assert!(report.warnings.is_empty());
    assert_eq!(
        stages,
        vec![
            Stage::Idle,
            Stage::Inspecting,
            Stage::Uniform,
            Stage::Concatenating,
            Stage::Cleanup,
            Stage::Done
        ]
    );

    // Two probes per file, one concat, no encode
    assert_eq!(runner.calls_of(CallKind::Probe).len(), 6);
    assert_eq!(runner.calls_of(CallKind::Encode).len(), 0);
    assert_eq!(runner.calls_of(CallKind::Concat).len(), 1);

    assert_eq!(runner.manifests(), vec![manifest_for(&files)]);
    assert!(fx.output().exists());
    assert!(fx.leftovers().is_empty(), "left behind: {:?}", fx.leftovers());
}

#[test]
fn single_file_is_copied_through_concat() {
    let fx = Fixture::new();
    let files = vec![fx.input("only.mp4")];
    let runner = FakeRunner::new().with_file(&files[0], FakeMedia::h264(640, 480));
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |_| {},
    );

    assert!(matches!(
        report.outcome,
        Ok(Outcome::Done {
            reencoded: false,
            ..
        })
    ));
    assert_eq!(runner.calls_of(CallKind::Encode).len(), 0);
    assert_eq!(runner.manifests(), vec![manifest_for(&files)]);
}

// ============================================================================
// Mismatched inputs: confirm, normalize, join
// ============================================================================

#[test]
fn confirmed_mismatch_reencodes_every_input() {
    let fx = Fixture::new();
    let files = vec![fx.input("wide.mp4"), fx.input("narrow.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720));
    let tools = Tools::default();
    let mut stages = Vec::new();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, scaled_720p()),
        &mut FixedAnswer(true),
        |s| stages.push(s),
    );

    assert_eq!(
        report.outcome.unwrap(),
        Outcome::Done {
            output: fx.output(),
            reencoded: true
        }
    );
    assert_eq!(
        stages,
        vec![
            Stage::Idle,
            Stage::Inspecting,
            Stage::Mismatched,
            Stage::AwaitingConfirmation,
            Stage::Normalizing,
            Stage::Concatenating,
            Stage::Cleanup,
            Stage::Done
        ]
    );

    let encodes = runner.calls_of(CallKind::Encode);
    assert_eq!(encodes.len(), 2);
    for (call, file) in encodes.iter().zip(&files) {
        assert_eq!(call.arg_after("-i"), file.to_str());
        assert_eq!(call.arg_after("-vf"), Some("scale=1280:720,fps=30/1"));
        assert_eq!(call.arg_after("-c:v"), Some("libx264"));
        assert_eq!(call.arg_after("-crf"), Some("18"));
        assert_eq!(call.arg_after("-c:a"), Some("aac"));
    }

    // The join consumes the normalized copies, in input order
    let artifacts: Vec<PathBuf> = encodes.iter().map(|c| PathBuf::from(c.last_arg())).collect();
    assert!(artifacts.iter().all(|a| a.starts_with(&fx.scratch)));
    assert_eq!(runner.manifests(), vec![manifest_for(&artifacts)]);

    assert!(fx.output().exists());
    assert!(fx.leftovers().is_empty(), "left behind: {:?}", fx.leftovers());
}

#[test]
fn declined_mismatch_runs_no_ffmpeg() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720));
    let tools = Tools::default();
    let mut stages = Vec::new();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |s| stages.push(s),
    );

    assert_eq!(report.outcome.unwrap(), Outcome::Cancelled);
    assert_eq!(stages.last(), Some(&Stage::Cancelled));
    assert!(!stages.contains(&Stage::Normalizing));
    assert_eq!(runner.calls_of(CallKind::Encode).len(), 0);
    assert_eq!(runner.calls_of(CallKind::Concat).len(), 0);
    assert!(!fx.output().exists());
    assert!(fx.leftovers().is_empty());
}

#[test]
fn audio_presence_counts_as_a_mismatch() {
    let fx = Fixture::new();
    let files = vec![fx.input("with_audio.mp4"), fx.input("silent.mp4")];
    let silent = FakeMedia {
        audio: None,
        ..FakeMedia::h264(1920, 1080)
    };
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], silent);
    let tools = Tools::default();
    let mut stages = Vec::new();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |s| stages.push(s),
    );

    assert_eq!(report.outcome.unwrap(), Outcome::Cancelled);
    assert!(stages.contains(&Stage::Mismatched));
}

#[test]
fn reference_frame_rate_comes_from_the_first_file() {
    let fx = Fixture::new();
    let files = vec![fx.input("ntsc.mp4"), fx.input("pal.mp4")];
    let ntsc = FakeMedia {
        r_frame_rate: "30000/1001",
        ..FakeMedia::h264(1920, 1080)
    };
    let pal = FakeMedia {
        r_frame_rate: "25/1",
        ..FakeMedia::h264(1920, 1080)
    };
    let runner = FakeRunner::new()
        .with_file(&files[0], ntsc)
        .with_file(&files[1], pal);
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(true),
        |_| {},
    );

    assert!(report.outcome.is_ok());
    let filters: Vec<_> = runner
        .calls_of(CallKind::Encode)
        .iter()
        .map(|c| c.arg_after("-vf").map(str::to_string))
        .collect();
    assert_eq!(
        filters,
        vec![Some("fps=30000/1001".to_string()), Some("fps=30000/1001".to_string())]
    );
}

#[test]
fn equivalent_frame_rate_spellings_are_uniform() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let doubled = FakeMedia {
        r_frame_rate: "60/2",
        ..FakeMedia::h264(1920, 1080)
    };
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], doubled);
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |_| {},
    );

    assert!(matches!(
        report.outcome,
        Ok(Outcome::Done {
            reencoded: false,
            ..
        })
    ));
}

// ============================================================================
// Failures: nothing of ours survives
// ============================================================================

#[test]
fn failed_encode_aborts_and_removes_partial_files() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4"), fx.input("c.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720))
        .with_file(&files[2], FakeMedia::h264(1920, 1080))
        .failing_encode_at(1);
    let tools = Tools::default();
    let mut stages = Vec::new();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(true),
        |s| stages.push(s),
    );

    match report.outcome {
        Err(CombineError::Encode { index, path, reason }) => {
            assert_eq!(index, 1);
            assert_eq!(path, files[1]);
            assert!(reason.contains("Invalid argument"), "reason: {}", reason);
        }
        other => panic!("expected encode failure, got {:?}", other),
    }

    // Input #2 is never attempted
    assert_eq!(runner.calls_of(CallKind::Encode).len(), 2);
    assert_eq!(runner.calls_of(CallKind::Concat).len(), 0);
    assert_eq!(
        &stages[stages.len() - 3..],
        &[Stage::Normalizing, Stage::Cleanup, Stage::Failed]
    );
    assert!(!fx.output().exists());
    assert!(fx.leftovers().is_empty(), "left behind: {:?}", fx.leftovers());
}

#[test]
fn failed_concat_removes_temp_files_and_partial_output() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720))
        .failing_concat();
    let tools = Tools::default();
    let mut stages = Vec::new();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(true),
        |s| stages.push(s),
    );

    match report.outcome {
        Err(CombineError::Concat { output, reason }) => {
            assert_eq!(output, fx.output());
            assert!(reason.contains("exit code 1"), "reason: {}", reason);
        }
        other => panic!("expected concat failure, got {:?}", other),
    }
    assert!(report.warnings.is_empty());
    assert_eq!(
        &stages[stages.len() - 3..],
        &[Stage::Concatenating, Stage::Cleanup, Stage::Failed]
    );
    assert!(!fx.output().exists());
    assert!(fx.leftovers().is_empty(), "left behind: {:?}", fx.leftovers());
}

#[test]
fn failed_concat_keeps_a_preexisting_output() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    fs::write(fx.output(), b"yesterday's render").unwrap();
    let runner = files
        .iter()
        .fold(FakeRunner::new(), |r, f| r.with_file(f, FakeMedia::h264(1920, 1080)))
        .failing_concat();
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(true),
        |_| {},
    );

    assert!(matches!(report.outcome, Err(CombineError::Concat { .. })));
    assert!(fx.output().exists());
    assert!(fx.leftovers().is_empty());
}

#[test]
fn encode_without_output_is_a_failure() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720))
        .silent_encode_at(1);
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(true),
        |_| {},
    );

    match report.outcome {
        Err(CombineError::Encode { index, reason, .. }) => {
            assert_eq!(index, 1);
            assert!(reason.contains("no output file"), "reason: {}", reason);
        }
        other => panic!("expected encode failure, got {:?}", other),
    }
    assert_eq!(runner.calls_of(CallKind::Concat).len(), 0);
    assert!(!fx.output().exists());
    assert!(fx.leftovers().is_empty(), "left behind: {:?}", fx.leftovers());
}

#[test]
fn cleanup_warning_accompanies_a_successful_join() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = files
        .iter()
        .fold(FakeRunner::new(), |r, f| r.with_file(f, FakeMedia::h264(1920, 1080)))
        .pinning_manifest();
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |_| {},
    );

    assert_eq!(
        report.outcome.unwrap(),
        Outcome::Done {
            output: fx.output(),
            reencoded: false
        }
    );
    let manifest = PathBuf::from(runner.calls_of(CallKind::Concat)[0].arg_after("-i").unwrap());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, manifest);
    assert!(fx.output().exists());
}

#[test]
fn cleanup_warning_does_not_replace_a_concat_failure() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = files
        .iter()
        .fold(FakeRunner::new(), |r, f| r.with_file(f, FakeMedia::h264(1920, 1080)))
        .pinning_manifest()
        .failing_concat();
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&files, EncodeProfile::default()),
        &mut FixedAnswer(false),
        |_| {},
    );

    assert!(matches!(report.outcome, Err(CombineError::Concat { .. })));
    let manifest = PathBuf::from(runner.calls_of(CallKind::Concat)[0].arg_after("-i").unwrap());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, manifest);
    // The partial output is still removed
    assert!(!fx.output().exists());
}

#[test]
fn unreadable_input_names_the_file() {
    let fx = Fixture::new();
    let good = fx.input("good.mp4");
    let bad = fx.input("corrupt.mp4");
    // `bad` is not registered, so the fake ffprobe fails on it
    let runner = FakeRunner::new().with_file(&good, FakeMedia::h264(1920, 1080));
    let tools = Tools::default();

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&[good, bad.clone()], EncodeProfile::default()),
        &mut FixedAnswer(true),
        |_| {},
    );

    match report.outcome {
        Err(err @ CombineError::Probe { .. }) => {
            assert!(err.to_string().contains("corrupt.mp4"), "message: {}", err);
        }
        other => panic!("expected probe failure, got {:?}", other),
    }
    assert_eq!(runner.calls_of(CallKind::Encode).len(), 0);
    assert_eq!(runner.calls_of(CallKind::Concat).len(), 0);
    assert!(fx.leftovers().is_empty());
}

// ============================================================================
// Workspace and ordering
// ============================================================================

#[test]
fn runs_never_share_temp_names() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720));
    let tools = Tools::default();
    let combiner = Combiner::new(&runner, &tools);
    let request = fx.request(&files, EncodeProfile::default());

    for _ in 0..2 {
        let report = combiner.combine(&request, &mut FixedAnswer(true), |_| {});
        assert!(report.outcome.is_ok());
    }

    let temp_names: HashSet<String> = runner
        .calls_of(CallKind::Encode)
        .iter()
        .map(|c| c.last_arg().to_string())
        .collect();
    assert_eq!(temp_names.len(), 4);

    let lists: HashSet<String> = runner
        .calls_of(CallKind::Concat)
        .iter()
        .filter_map(|c| c.arg_after("-i").map(str::to_string))
        .collect();
    assert_eq!(lists.len(), 2);
}

#[test]
fn playlist_reorder_changes_join_order() {
    let fx = Fixture::new();
    let a = fx.input("a.mp4");
    let b = fx.input("b.mp4");
    let c = fx.input("c.mp4");
    let runner = [&a, &b, &c].iter().fold(FakeRunner::new(), |r, f| {
        r.with_file(f, FakeMedia::h264(1280, 720))
    });
    let tools = Tools::default();

    let mut playlist = Playlist::new(vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(playlist.apply(Move::Up(2)), Some(1));
    assert_eq!(playlist.apply(Move::Down(0)), Some(1));

    let report = Combiner::new(&runner, &tools).combine(
        &fx.request(&playlist.snapshot(), EncodeProfile::default()),
        &mut FixedAnswer(false),
        |_| {},
    );

    assert!(report.outcome.is_ok());
    assert_eq!(runner.manifests(), vec![manifest_for(&[c, a, b])]);
}

#[test]
fn plan_lists_commands_without_running_ffmpeg() {
    let fx = Fixture::new();
    let files = vec![fx.input("a.mp4"), fx.input("b.mp4")];
    let runner = FakeRunner::new()
        .with_file(&files[0], FakeMedia::h264(1920, 1080))
        .with_file(&files[1], FakeMedia::h264(1280, 720));
    let tools = Tools::default();

    let plan = Combiner::new(&runner, &tools)
        .plan(&fx.request(&files, scaled_720p()))
        .unwrap();

    assert!(!plan.compatibility.is_uniform());
    assert_eq!(plan.profiles.len(), 2);
    // Two encodes plus the join
    assert_eq!(plan.commands.len(), 3);
    assert_eq!(runner.calls_of(CallKind::Encode).len(), 0);
    assert_eq!(runner.calls_of(CallKind::Concat).len(), 0);
    assert!(fx.leftovers().is_empty());
}
