//! Encoder-specific validation of an encode profile before any command is built.

use serde::Serialize;

use super::profile::{EncodeProfile, Resolution, VideoCodec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub encoder: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str, encoder: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            encoder: encoder.to_string(),
        }
    }
}

/// Validate a profile against encoder-specific rules.
pub fn validate_profile(profile: &EncodeProfile) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let encoder = profile.video_codec.encoder();

    // CRF range differs between x26x and libvpx
    if profile.crf > profile.video_codec.max_crf() {
        errors.push(ValidationError::new(
            "crf",
            &format!(
                "CRF {} out of range (0-{})",
                profile.crf,
                profile.video_codec.max_crf()
            ),
            encoder,
        ));
    }

    if let Resolution::Scale { width, height } = profile.resolution {
        if width == 0 || height == 0 {
            errors.push(ValidationError::new(
                "resolution",
                "width and height must be non-zero",
                encoder,
            ));
        } else if profile.video_codec != VideoCodec::Vp9 && (width % 2 != 0 || height % 2 != 0)
        {
            // 4:2:0 chroma subsampling in x264/x265 needs even dimensions
            errors.push(ValidationError::new(
                "resolution",
                &format!("{}x{} must have even dimensions", width, height),
                encoder,
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
