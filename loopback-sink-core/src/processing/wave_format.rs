//! Wave-format records exchanged with the platform layer.
//!
//! Mirrors the WAVEFORMATEX / WAVEFORMATEXTENSIBLE layout field for field
//! without depending on OS types, so format negotiation can be tested on
//! any host.
use crate::models::error::NegotiationError;
use crate::models::format::{FormatDescriptor, BITS_PER_SAMPLE, SAMPLE_RATE};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the extensible tail that follows the base record.
pub const EXTENSIBLE_EXTRA_BYTES: u16 = 22;

/// Sample encoding GUID of an extensible record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubFormat {
    Pcm,
    IeeeFloat,
    Other(u128),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensibleFormat {
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: SubFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extensible: Option<ExtensibleFormat>,
}

impl WaveFormat {
    /// Loopback capture format for a catalog entry: 16-bit PCM at 48 kHz,
    /// always extensible so the channel mask is explicit.
    pub fn for_capture(format: &FormatDescriptor) -> Self {
        let mut wave = Self {
            format_tag: WAVE_FORMAT_EXTENSIBLE,
            channels: format.channels,
            samples_per_sec: SAMPLE_RATE,
            avg_bytes_per_sec: 0,
            block_align: 0,
            bits_per_sample: BITS_PER_SAMPLE,
            extensible: Some(ExtensibleFormat {
                valid_bits_per_sample: BITS_PER_SAMPLE,
                channel_mask: format.channel_mask,
                sub_format: SubFormat::Pcm,
            }),
        };
        wave.update_derived();
        wave
    }

    /// Overlay a catalog layout onto a device mix format.
    ///
    /// Sample rate and width are always forced to 48 kHz / 16-bit. Plain PCM
    /// and float records only change their channel count; extensible records
    /// also take the mask and switch to PCM.
    pub fn overlay(&mut self, format: &FormatDescriptor) -> Result<(), NegotiationError> {
        self.samples_per_sec = SAMPLE_RATE;
        self.bits_per_sample = BITS_PER_SAMPLE;

        match self.format_tag {
            WAVE_FORMAT_PCM | WAVE_FORMAT_IEEE_FLOAT => {}
            WAVE_FORMAT_EXTENSIBLE => {
                self.extensible = Some(ExtensibleFormat {
                    valid_bits_per_sample: BITS_PER_SAMPLE,
                    channel_mask: format.channel_mask,
                    sub_format: SubFormat::Pcm,
                });
            }
            other => {
                log::warn!("Unsupported Wave Format: [0x{:04X}]", other);
                return Err(NegotiationError::UnsupportedWaveFormat(other));
            }
        }

        self.channels = format.channels;
        self.update_derived();
        Ok(())
    }

    /// Extra bytes after the base record (`cbSize`).
    pub fn extra_size(&self) -> u16 {
        if self.extensible.is_some() {
            EXTENSIBLE_EXTRA_BYTES
        } else {
            0
        }
    }

    pub fn channel_mask(&self) -> Option<u32> {
        self.extensible.map(|ext| ext.channel_mask)
    }

    fn update_derived(&mut self) {
        self.block_align = self.channels * self.bits_per_sample / 8;
        self.avg_bytes_per_sec = self.samples_per_sec * self.block_align as u32;
    }
}
