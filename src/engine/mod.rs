// Combine engine - independent of the CLI

pub mod check;
pub mod cleanup;
pub mod concat;
mod error;
pub mod normalize;
pub mod pipeline;
pub mod probe;
pub mod profile;
pub mod runner;
pub mod scan;
pub mod tools;
pub mod validate;
pub mod workspace;

pub use check::{Compatibility, Mismatch, ProfileField, check};
pub use cleanup::cleanup;
pub use concat::{build_concat_cmd, concat, write_manifest};
pub use error::{CleanupWarning, CombineError};
pub use normalize::{build_encode_cmd, build_filter, normalize};
pub use pipeline::{
    CombineReport, CombineRequest, Combiner, FixedAnswer, Outcome, Plan, Prompt, Stage,
};
pub use probe::{AudioTrack, FrameRate, StreamProfile, inspect};
pub use profile::{AudioCodec, EncodeProfile, Preset, Resolution, VideoCodec};
pub use runner::{SystemRunner, ToolOutput, ToolRunner, Tools, format_command};
pub use scan::{expand_inputs, is_video_file};
pub use tools::{ffmpeg_version, ffprobe_version};
pub use validate::{ValidationError, validate_profile};
pub use workspace::{RunWorkspace, TempArtifact};
