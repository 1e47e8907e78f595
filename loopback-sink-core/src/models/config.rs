use serde::{Deserialize, Deserializer, Serialize};

use super::format::SAMPLE_RATE;

/// Adapter name of the virtual sink installed by the Steam streaming client.
pub const DEFAULT_VIRTUAL_ADAPTER_NAME: &str = "Steam Streaming Speakers";

/// Audio configuration for sink negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Device id of a virtual sink configured by the user. Takes precedence
    /// over adapter-name detection.
    #[serde(deserialize_with = "empty_as_none")]
    pub virtual_sink: Option<String>,

    /// Adapter name that identifies the virtual streaming sink during
    /// enumeration (exact match).
    pub virtual_adapter_name: String,
}

impl AudioConfig {
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("failed to parse audio config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.virtual_adapter_name.is_empty() {
            return Err("virtual adapter name must not be empty".into());
        }
        if self.virtual_sink.as_deref() == Some("") {
            return Err("virtual sink must not be empty".into());
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            virtual_sink: None,
            virtual_adapter_name: DEFAULT_VIRTUAL_ADAPTER_NAME.into(),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Parameters for opening a loopback capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicrophoneRequest {
    /// Speaker mapping of the encoder. Accepted for parity with other
    /// backends; the catalog mask decides the stream layout.
    pub mapping: Vec<u8>,

    pub channels: u16,

    /// Requested rate. Streams always run at 48 kHz with automatic
    /// conversion.
    pub sample_rate: u32,

    /// Samples per channel in one produced window.
    pub frame_size: u32,
}

impl MicrophoneRequest {
    pub fn new(channels: u16, frame_size: u32) -> Self {
        Self {
            mapping: (0..channels).map(|c| u8::try_from(c).unwrap_or(u8::MAX)).collect(),
            channels,
            sample_rate: SAMPLE_RATE,
            frame_size,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.channels == 0 {
            return Err("channel count must be positive".into());
        }
        if self.frame_size == 0 {
            return Err("frame size must be positive".into());
        }
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        Ok(())
    }

    /// Samples in one produced window (all channels).
    pub fn window_len(&self) -> usize {
        self.frame_size as usize * self.channels as usize
    }
}
