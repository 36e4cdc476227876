use clap::{Args, Parser, Subcommand};
use clipjoin::engine::{AudioCodec, EncodeProfile, Preset, Resolution, VideoCodec};
use clipjoin::playlist::Move;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipjoin")]
#[command(about = "Join video files with ffmpeg, re-encoding only when they differ", long_about = None)]
pub struct Cli {
    /// Log debug output (external commands, stage transitions)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Concatenate files (or directories of files) into one output
    Combine {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output file (".mp4" is appended when it has no extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Re-encode without asking when inputs differ
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Probe files and report whether they can be joined without re-encoding
    Check {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Show the stream parameters of a single file
    Probe {
        /// Path to the video file
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the ffmpeg commands a combine would run, without running them
    DryRun {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Show the re-encode settings, or change and save them
    Settings {
        #[command(flatten)]
        overrides: ProfileOverrides,
    },

    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

/// Input selection shared by the commands that take a file list
#[derive(Args)]
pub struct InputArgs {
    /// Video files or directories, in playback order
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Sort the expanded list alphabetically before applying moves
    #[arg(long)]
    pub sort: bool,

    /// Reorder before running: up:<index> or down:<index> (0-based, repeatable)
    #[arg(long = "move", value_name = "MOVE")]
    pub moves: Vec<Move>,
}

/// Per-field overrides of the configured encode profile
#[derive(Args, Default)]
pub struct ProfileOverrides {
    #[arg(long, value_enum)]
    pub video_codec: Option<VideoCodec>,

    #[arg(long, value_enum)]
    pub audio_codec: Option<AudioCodec>,

    /// Constant rate factor (0 = lossless, 18 = good, 23 = x264 default)
    #[arg(long)]
    pub crf: Option<u8>,

    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// "original" or WIDTHxHEIGHT (e.g. 1280x720)
    #[arg(long)]
    pub resolution: Option<Resolution>,
}

impl ProfileOverrides {
    pub fn is_empty(&self) -> bool {
        self.video_codec.is_none()
            && self.audio_codec.is_none()
            && self.crf.is_none()
            && self.preset.is_none()
            && self.resolution.is_none()
    }

    /// Copy of `base` with every given override applied
    pub fn apply(&self, base: &EncodeProfile) -> EncodeProfile {
        EncodeProfile {
            video_codec: self.video_codec.unwrap_or(base.video_codec),
            audio_codec: self.audio_codec.unwrap_or(base.audio_codec),
            crf: self.crf.unwrap_or(base.crf),
            preset: self.preset.unwrap_or(base.preset),
            resolution: self.resolution.unwrap_or(base.resolution),
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
