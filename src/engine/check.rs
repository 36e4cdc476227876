//! Stream compatibility across an ordered list of inputs.
//!
//! The policy is strict equality against the first input: a frame rate of
//! 30000/1001 does not match 2997/100, and 1920x1080 does not match 1920x1088.
//! Any difference means the inputs cannot be joined with a stream copy.

use std::fmt;

use super::probe::StreamProfile;

/// A single field of a [`StreamProfile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    VideoCodec,
    Width,
    Height,
    FrameRate,
    AudioCodec,
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileField::VideoCodec => "video codec",
            ProfileField::Width => "width",
            ProfileField::Height => "height",
            ProfileField::FrameRate => "frame rate",
            ProfileField::AudioCodec => "audio codec",
        };
        f.write_str(name)
    }
}

/// First input that differs from the reference (input 0)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub fields: Vec<ProfileField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Uniform,
    Mismatched(Mismatch),
}

impl Compatibility {
    pub fn is_uniform(&self) -> bool {
        matches!(self, Compatibility::Uniform)
    }
}

impl StreamProfile {
    /// Fields in which `other` differs from `self`
    pub fn differences(&self, other: &StreamProfile) -> Vec<ProfileField> {
        let mut fields = Vec::new();
        if self.video_codec != other.video_codec {
            fields.push(ProfileField::VideoCodec);
        }
        if self.width != other.width {
            fields.push(ProfileField::Width);
        }
        if self.height != other.height {
            fields.push(ProfileField::Height);
        }
        if self.frame_rate != other.frame_rate {
            fields.push(ProfileField::FrameRate);
        }
        if self.audio != other.audio {
            fields.push(ProfileField::AudioCodec);
        }
        fields
    }

    /// Display value of one field, for mismatch reports
    pub fn field_value(&self, field: ProfileField) -> String {
        match field {
            ProfileField::VideoCodec => self.video_codec.clone(),
            ProfileField::Width => self.width.to_string(),
            ProfileField::Height => self.height.to_string(),
            ProfileField::FrameRate => self.frame_rate.to_string(),
            ProfileField::AudioCodec => self.audio.to_string(),
        }
    }
}

/// Compare every profile against the first; stop at the first difference.
/// An empty slice is vacuously uniform (empty input is rejected earlier).
pub fn check(profiles: &[StreamProfile]) -> Compatibility {
    let Some((reference, rest)) = profiles.split_first() else {
        return Compatibility::Uniform;
    };

    for (offset, profile) in rest.iter().enumerate() {
        if profile != reference {
            return Compatibility::Mismatched(Mismatch {
                index: offset + 1,
                fields: reference.differences(profile),
            });
        }
    }

    Compatibility::Uniform
}
