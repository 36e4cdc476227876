use crate::cli::{Cli, Commands, InputArgs, ProfileOverrides};
use anyhow::{Context, Result};
use clipjoin::config::Config;
use clipjoin::engine::{
    self, CombineRequest, Combiner, Compatibility, FixedAnswer, Mismatch, Outcome, Prompt,
    StreamProfile, SystemRunner, format_command,
};
use clipjoin::playlist::Playlist;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

pub fn run(cli: Cli) {
    let result = match cli.command {
        Commands::Combine {
            inputs,
            output,
            yes,
            overrides,
        } => handle_combine(inputs, output, yes, overrides),
        Commands::Check { inputs } => handle_check(inputs),
        Commands::Probe { file, json } => handle_probe(file, json),
        Commands::DryRun {
            inputs,
            output,
            overrides,
        } => handle_dry_run(inputs, output, overrides),
        Commands::Settings { overrides } => handle_settings(overrides),
        Commands::CheckFfmpeg => handle_check_ffmpeg(),
        Commands::InitConfig => handle_init_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {:#}", e);
        Config::default()
    })
}

/// Expand, sort and reorder the input list, then print the final order
fn build_playlist(inputs: &InputArgs) -> Result<Playlist> {
    let mut playlist = Playlist::new(engine::expand_inputs(&inputs.files)?);
    if inputs.sort {
        playlist.sort();
    }
    for mv in &inputs.moves {
        if playlist.apply(*mv).is_none() {
            eprintln!("Warning: ignoring move {:?} (out of range)", mv);
        }
    }

    if !playlist.is_empty() {
        println!("Playback order:\n{}", playlist.render());
    }
    Ok(playlist)
}

/// Mirror the implicit ".mp4" of the save dialog
fn with_default_extension(output: PathBuf) -> PathBuf {
    if output.extension().is_some() {
        output
    } else {
        output.with_extension("mp4")
    }
}

fn build_request(
    playlist: &Playlist,
    output: PathBuf,
    config: &Config,
    overrides: &ProfileOverrides,
) -> Result<CombineRequest> {
    Ok(CombineRequest {
        files: playlist.snapshot(),
        output: with_default_extension(output),
        profile: overrides.apply(&config.encode),
        temp_dir: config.workspace.resolve_temp_dir()?,
    })
}

/// Asks on the terminal before re-encoding
struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm_reencode(
        &mut self,
        files: &[PathBuf],
        profiles: &[StreamProfile],
        mismatch: &Mismatch,
    ) -> bool {
        eprintln!("{}", describe_mismatch(files, profiles, mismatch));
        eprintln!("Re-encode all files so they can be joined? (slower, but works) [y/N] ");
        io::stderr().flush().ok();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn describe_mismatch(files: &[PathBuf], profiles: &[StreamProfile], mismatch: &Mismatch) -> String {
    let reference = &profiles[0];
    let other = &profiles[mismatch.index];
    let mut text = format!(
        "Mismatch detected: {} differs from {}",
        files[mismatch.index].display(),
        files[0].display()
    );
    for field in &mismatch.fields {
        text.push_str(&format!(
            "\n  {}: {} vs {}",
            field,
            reference.field_value(*field),
            other.field_value(*field)
        ));
    }
    text
}

fn handle_combine(
    inputs: InputArgs,
    output: PathBuf,
    yes: bool,
    overrides: ProfileOverrides,
) -> Result<()> {
    let config = load_config();
    let playlist = build_playlist(&inputs)?;
    let request = build_request(&playlist, output, &config, &overrides)?;

    let runner = SystemRunner;
    let combiner = Combiner::new(&runner, &config.tools);
    let on_stage = |stage: engine::Stage| tracing::info!("{}", stage);

    let report = if yes {
        combiner.combine(&request, &mut FixedAnswer(true), on_stage)
    } else {
        combiner.combine(&request, &mut TerminalPrompt, on_stage)
    };

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }

    match report.outcome? {
        Outcome::Done { output, reencoded } => {
            let how = if reencoded { "re-encoded and joined" } else { "joined" };
            println!("Video saved to {} ({})", output.display(), how);
        }
        Outcome::Cancelled => println!("Cancelled; nothing was written."),
    }
    Ok(())
}

fn handle_check(inputs: InputArgs) -> Result<()> {
    let config = load_config();
    let playlist = build_playlist(&inputs)?;
    let files = playlist.snapshot();
    if files.is_empty() {
        anyhow::bail!(engine::CombineError::NoFilesSelected);
    }

    let runner = SystemRunner;
    let combiner = Combiner::new(&runner, &config.tools);
    let profiles = combiner.inspect_all(&files)?;

    for (file, profile) in files.iter().zip(&profiles) {
        println!("{}: {}", file.display(), summarize(profile));
    }

    match engine::check(&profiles) {
        Compatibility::Uniform => println!("All files match: they will be joined without re-encoding."),
        Compatibility::Mismatched(mismatch) => {
            println!("{}", describe_mismatch(&files, &profiles, &mismatch));
            println!("Combining these files requires re-encoding.");
        }
    }
    Ok(())
}

fn summarize(profile: &StreamProfile) -> String {
    format!(
        "{} {}x{} @ {} fps ({:.3}), audio: {}",
        profile.video_codec,
        profile.width,
        profile.height,
        profile.frame_rate,
        profile.frame_rate.as_f64(),
        profile.audio
    )
}

fn handle_probe(file: PathBuf, json: bool) -> Result<()> {
    let config = load_config();
    let profile = engine::inspect(&SystemRunner, &config.tools, &file)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&profile).context("Failed to serialize profile")?
        );
    } else {
        println!("{}", summarize(&profile));
    }
    Ok(())
}

fn handle_dry_run(inputs: InputArgs, output: PathBuf, overrides: ProfileOverrides) -> Result<()> {
    let config = load_config();
    let playlist = build_playlist(&inputs)?;
    let request = build_request(&playlist, output, &config, &overrides)?;

    let runner = SystemRunner;
    let plan = Combiner::new(&runner, &config.tools).plan(&request)?;

    match &plan.compatibility {
        Compatibility::Uniform => println!("Inputs match; stream copy only."),
        Compatibility::Mismatched(mismatch) => {
            println!("{}", describe_mismatch(&request.files, &plan.profiles, mismatch));
            println!("Re-encode settings: {}", request.profile);
        }
    }
    for cmd in &plan.commands {
        println!("{}", format_command(cmd));
    }
    Ok(())
}

fn handle_settings(overrides: ProfileOverrides) -> Result<()> {
    let mut config = load_config();

    if !overrides.is_empty() {
        let updated = overrides.apply(&config.encode);
        if let Err(errors) = engine::validate_profile(&updated) {
            anyhow::bail!(engine::CombineError::InvalidProfile(errors));
        }
        config.encode = updated;
        config.save().context("Failed to save settings")?;
        println!("Settings saved.");
    }

    let profile = &config.encode;
    println!("video codec: {}", profile.video_codec);
    println!("audio codec: {}", profile.audio_codec);
    println!("crf:         {}", profile.crf);
    println!("preset:      {}", profile.preset);
    println!("resolution:  {}", profile.resolution);
    Ok(())
}

fn handle_check_ffmpeg() -> Result<()> {
    let config = load_config();
    let version = engine::ffmpeg_version(&config.tools)?;
    println!("ffmpeg found: {}", version);
    let probe_version = engine::ffprobe_version(&config.tools)?;
    println!("ffprobe found: {}", probe_version);
    Ok(())
}

fn handle_init_config() -> Result<()> {
    match Config::config_path() {
        Ok(path) if path.exists() => match Config::load_from(&path) {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
                Ok(())
            }
            Err(e) => {
                println!("Config invalid: {:#}", e);
                recreate_default(&path)
            }
        },
        Ok(path) => {
            println!("Config missing, creating default...");
            recreate_default(&path)
        }
        Err(e) => Err(e),
    }
}

fn recreate_default(path: &Path) -> Result<()> {
    Config::default()
        .save_to(path)
        .context("Failed to save default config")?;
    println!("Default config saved to {}", path.display());
    Ok(())
}
