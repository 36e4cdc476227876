// Re-encode settings applied when inputs have to be normalized

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

fn default_crf() -> u8 {
    18
}

/// Target video encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    #[default]
    Libx264,
    Libx265,
    Vp9,
}

impl VideoCodec {
    /// Encoder name passed to `-c:v`
    pub fn encoder(&self) -> &'static str {
        match self {
            VideoCodec::Libx264 => "libx264",
            VideoCodec::Libx265 => "libx265",
            VideoCodec::Vp9 => "libvpx-vp9",
        }
    }

    /// Highest CRF the encoder accepts
    pub fn max_crf(&self) -> u8 {
        match self {
            VideoCodec::Libx264 | VideoCodec::Libx265 => 51,
            VideoCodec::Vp9 => 63,
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoCodec::Libx264 => "libx264",
            VideoCodec::Libx265 => "libx265",
            VideoCodec::Vp9 => "vp9",
        };
        f.write_str(name)
    }
}

/// Target audio codec; `Copy` passes the source audio through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    #[default]
    Aac,
    Mp3,
    Copy,
}

impl AudioCodec {
    /// Value passed to `-c:a`
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Copy => "copy",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

/// x264-style speed/efficiency preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    #[default]
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }

    /// libvpx has no -preset; map onto -cpu-used (8 = fastest, 0 = slowest)
    pub fn vp9_cpu_used(&self) -> u8 {
        match self {
            Preset::Ultrafast => 8,
            Preset::Superfast => 7,
            Preset::Veryfast => 6,
            Preset::Faster => 5,
            Preset::Fast => 4,
            Preset::Medium => 3,
            Preset::Slow => 2,
            Preset::Slower => 1,
            Preset::Veryslow => 0,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resolution {0:?}: expected \"original\" or WIDTHxHEIGHT")]
pub struct ResolutionError(pub String);

/// Output resolution of normalized files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    #[default]
    Original,
    Scale {
        width: u32,
        height: u32,
    },
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    /// Accepts "original", "1280x720" and the ffmpeg-style "1280:720"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ResolutionError(s.to_string());
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("original") {
            return Ok(Resolution::Original);
        }

        let (w, h) = trimmed
            .split_once(['x', 'X', ':'])
            .ok_or_else(err)?;
        let width: u32 = w.trim().parse().map_err(|_| err())?;
        let height: u32 = h.trim().parse().map_err(|_| err())?;
        Ok(Resolution::Scale { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = ResolutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Original => f.write_str("original"),
            Resolution::Scale { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

/// Settings used for every input when a re-encode is needed.
/// Read once at the start of a run and never mutated while it executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeProfile {
    #[serde(default)]
    pub video_codec: VideoCodec,

    #[serde(default)]
    pub audio_codec: AudioCodec,

    /// Constant rate factor (lower = better quality, bigger files)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default)]
    pub preset: Preset,

    #[serde(default)]
    pub resolution: Resolution,
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            video_codec: VideoCodec::default(),
            audio_codec: AudioCodec::default(),
            crf: default_crf(),
            preset: Preset::default(),
            resolution: Resolution::default(),
        }
    }
}

impl fmt::Display for EncodeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "video={} audio={} crf={} preset={} resolution={}",
            self.video_codec, self.audio_codec, self.crf, self.preset, self.resolution
        )
    }
}
