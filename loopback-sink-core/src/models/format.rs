//! Channel layouts the capture and negotiation paths understand.
//!
//! The catalog order is significant: capture open takes the first entry
//! that matches, and the names are part of the encoded sink identifier.

use serde::{Deserialize, Serialize};

pub const SPEAKER_FRONT_LEFT: u32 = 0x1;
pub const SPEAKER_FRONT_RIGHT: u32 = 0x2;
pub const SPEAKER_FRONT_CENTER: u32 = 0x4;
pub const SPEAKER_LOW_FREQUENCY: u32 = 0x8;
pub const SPEAKER_BACK_LEFT: u32 = 0x10;
pub const SPEAKER_BACK_RIGHT: u32 = 0x20;
pub const SPEAKER_SIDE_LEFT: u32 = 0x200;
pub const SPEAKER_SIDE_RIGHT: u32 = 0x400;

/// Fixed rate every stream is opened or reconfigured at.
pub const SAMPLE_RATE: u32 = 48_000;

/// Fixed sample width, in bits.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Channel layout requested for a sink or a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Stereo,
    Surr51,
    Surr71,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub tag: FormatTag,
    pub name: &'static str,
    pub channels: u16,
    pub channel_mask: u32,
}

const STEREO: FormatDescriptor = FormatDescriptor {
    tag: FormatTag::Stereo,
    name: "Stereo",
    channels: 2,
    channel_mask: SPEAKER_FRONT_LEFT | SPEAKER_FRONT_RIGHT,
};

const SURROUND_51: FormatDescriptor = FormatDescriptor {
    tag: FormatTag::Surr51,
    name: "Surround 5.1",
    channels: 6,
    channel_mask: SPEAKER_FRONT_LEFT
        | SPEAKER_FRONT_RIGHT
        | SPEAKER_FRONT_CENTER
        | SPEAKER_LOW_FREQUENCY
        | SPEAKER_BACK_LEFT
        | SPEAKER_BACK_RIGHT,
};

const SURROUND_71: FormatDescriptor = FormatDescriptor {
    tag: FormatTag::Surr71,
    name: "Surround 7.1",
    channels: 8,
    channel_mask: SPEAKER_FRONT_LEFT
        | SPEAKER_FRONT_RIGHT
        | SPEAKER_FRONT_CENTER
        | SPEAKER_LOW_FREQUENCY
        | SPEAKER_BACK_LEFT
        | SPEAKER_BACK_RIGHT
        | SPEAKER_SIDE_LEFT
        | SPEAKER_SIDE_RIGHT,
};

/// 5.1 with side speakers in place of the back pair. Some drivers only
/// expose this topology; it is never part of the primary catalog.
const SURROUND_51_SIDE_SPEAKERS: FormatDescriptor = FormatDescriptor {
    tag: FormatTag::Surr51,
    name: "Surround 5.1",
    channels: 6,
    channel_mask: SPEAKER_FRONT_LEFT
        | SPEAKER_FRONT_RIGHT
        | SPEAKER_FRONT_CENTER
        | SPEAKER_LOW_FREQUENCY
        | SPEAKER_SIDE_LEFT
        | SPEAKER_SIDE_RIGHT,
};

static FORMATS: [FormatDescriptor; 3] = [STEREO, SURROUND_51, SURROUND_71];

/// The primary catalog: stereo, 5.1, 7.1.
pub fn all() -> &'static [FormatDescriptor] {
    &FORMATS
}

pub fn side_speaker_variant() -> &'static FormatDescriptor {
    &SURROUND_51_SIDE_SPEAKERS
}

impl FormatTag {
    pub fn descriptor(self) -> &'static FormatDescriptor {
        match self {
            Self::Stereo => &FORMATS[0],
            Self::Surr51 => &FORMATS[1],
            Self::Surr71 => &FORMATS[2],
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}
