//! Settings persistence
//!
//! Settings are saved as base64 of a versioned JSON envelope:
//! `{"version": 1, "settings": {...}}`. Unknown versions are rejected
//! instead of being misread.

use super::state::RecorderSettings;
use crate::utils::error::{RecorderError, RecorderResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// Current envelope version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: u32,
    settings: &'a RecorderSettings,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: u32,
    settings: serde_json::Value,
}

/// Encode settings into a transport-safe string
pub fn encode_settings(settings: &RecorderSettings) -> RecorderResult<String> {
    let json = serde_json::to_vec(&EnvelopeOut {
        version: SETTINGS_FORMAT_VERSION,
        settings,
    })?;
    Ok(STANDARD.encode(json))
}

/// Decode settings produced by [`encode_settings`]
pub fn decode_settings(blob: &str) -> RecorderResult<RecorderSettings> {
    let compact: String = blob.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RecorderError::Persistence(format!("not base64: {}", e)))?;

    let envelope: EnvelopeIn = serde_json::from_slice(&bytes)
        .map_err(|e| RecorderError::Persistence(format!("not a settings envelope: {}", e)))?;

    if envelope.version != SETTINGS_FORMAT_VERSION {
        return Err(RecorderError::Persistence(format!(
            "unsupported settings version {}",
            envelope.version
        )));
    }

    let mut settings: RecorderSettings = serde_json::from_value(envelope.settings)
        .map_err(|e| RecorderError::Persistence(format!("invalid settings: {}", e)))?;
    settings.normalize();
    Ok(settings)
}
