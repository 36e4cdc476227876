// Input probing using ffprobe

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use thiserror::Error;

use super::error::CombineError;
use super::runner::{ToolRunner, Tools};

/// Rational frame rate as reported by ffprobe (`r_frame_rate`).
/// Serialized as its `num/den` text; deserializing goes through the parser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid frame rate {0:?}: expected <numerator>/<denominator>")]
pub struct FrameRateError(pub String);

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Option<Self> {
        (num > 0 && den > 0).then_some(Self { num, den })
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/// Exact rational comparison; 30000/1001 and 2997/100 are different rates
impl PartialEq for FrameRate {
    fn eq(&self, other: &Self) -> bool {
        self.num as u64 * other.den as u64 == other.num as u64 * self.den as u64
    }
}

impl Eq for FrameRate {}

/// Parses "30000/1001" or a bare integer like "25". Nothing is evaluated:
/// the text is split on '/' and both halves must be plain unsigned integers.
impl FromStr for FrameRate {
    type Err = FrameRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FrameRateError(s.to_string());
        let trimmed = s.trim();
        let (num, den) = match trimmed.split_once('/') {
            Some((n, d)) => (n, d),
            None => (trimmed, "1"),
        };

        let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(num) || !is_digits(den) {
            return Err(err());
        }

        let num: u32 = num.parse().map_err(|_| err())?;
        let den: u32 = den.parse().map_err(|_| err())?;
        FrameRate::new(num, den).ok_or_else(err)
    }
}

impl TryFrom<String> for FrameRate {
    type Error = FrameRateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FrameRate> for String {
    fn from(value: FrameRate) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Audio side of a stream profile. `Absent` is a real value and takes part in
/// equality: a silent clip never matches a clip with sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioTrack {
    Absent,
    Codec(String),
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioTrack::Absent => write!(f, "no audio"),
            AudioTrack::Codec(c) => write!(f, "{}", c),
        }
    }
}

/// Stream parameters of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProfile {
    pub video_codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub audio: AudioTrack,
}

/// Video fields of a stream profile, as read from the `v:0` probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStream {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

const VIDEO_ENTRIES: &str = "stream=codec_name,width,height,r_frame_rate";
const AUDIO_ENTRIES: &str = "stream=codec_name";

/// Build an ffprobe call that reports `entries` of stream `selector` as JSON
pub fn build_probe_cmd(tools: &Tools, selector: &str, entries: &str, path: &Path) -> Command {
    let mut cmd = Command::new(&tools.ffprobe);
    cmd.arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg(selector)
        .arg("-show_entries")
        .arg(entries)
        .arg("-of")
        .arg("json")
        .arg("-i")
        .arg(path);
    cmd
}

/// Parse the JSON of a `v:0` probe
pub fn parse_video_stream(json: &str) -> Result<VideoStream, String> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("unparseable ffprobe output: {}", e))?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or("no video stream found")?;

    let codec = stream.codec_name.ok_or("video stream has no codec_name")?;
    let width = stream.width.ok_or("video stream has no width")?;
    let height = stream.height.ok_or("video stream has no height")?;
    let rate = stream
        .r_frame_rate
        .ok_or("video stream has no r_frame_rate")?;
    let frame_rate = rate.parse::<FrameRate>().map_err(|e| e.to_string())?;

    Ok(VideoStream {
        codec,
        width,
        height,
        frame_rate,
    })
}

/// Parse the JSON of an `a:0` probe. No stream means no audio, not an error.
pub fn parse_audio_track(json: &str) -> Result<AudioTrack, String> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("unparseable ffprobe output: {}", e))?;

    match probe.streams.into_iter().next() {
        None => Ok(AudioTrack::Absent),
        Some(stream) => stream
            .codec_name
            .map(AudioTrack::Codec)
            .ok_or_else(|| "audio stream has no codec_name".to_string()),
    }
}

fn run_probe<R: ToolRunner + ?Sized>(runner: &R, cmd: Command) -> Result<String, String> {
    let output = runner
        .run(cmd)
        .map_err(|e| format!("could not run ffprobe: {}", e))?;

    if !output.success {
        return Err(output.failure_reason());
    }

    Ok(output.stdout)
}

/// Probe one file: first video stream, then first audio stream
pub fn inspect<R: ToolRunner + ?Sized>(
    runner: &R,
    tools: &Tools,
    path: &Path,
) -> Result<StreamProfile, CombineError> {
    let fail = |reason: String| CombineError::Probe {
        path: path.to_path_buf(),
        reason,
    };

    let video_json = run_probe(runner, build_probe_cmd(tools, "v:0", VIDEO_ENTRIES, path))
        .map_err(fail)?;
    let video = parse_video_stream(&video_json).map_err(fail)?;

    let audio_json = run_probe(runner, build_probe_cmd(tools, "a:0", AUDIO_ENTRIES, path))
        .map_err(fail)?;
    let audio = parse_audio_track(&audio_json).map_err(fail)?;

    let profile = StreamProfile {
        video_codec: video.codec,
        width: video.width,
        height: video.height,
        frame_rate: video.frame_rate,
        audio,
    };

    tracing::debug!(
        file = %path.display(),
        codec = %profile.video_codec,
        width = profile.width,
        height = profile.height,
        fps = %profile.frame_rate,
        audio = %profile.audio,
        "probed input"
    );

    Ok(profile)
}
