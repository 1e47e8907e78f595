//! Sink identifier strings.
//!
//! Wire format, shared with whatever stores the configured sink:
//! ```text
//! ["virtual-" <format name>] <device id>
//! ```
//! A sink without the prefix is a plain device id and carries no format
//! request.
use crate::models::format::{self, FormatTag};

pub const VIRTUAL_PREFIX: &str = "virtual-";

/// A decoded sink identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkId {
    pub format: Option<FormatTag>,
    pub device_id: String,
}

pub fn encode(format: Option<FormatTag>, device_id: &str) -> String {
    match format {
        None => device_id.to_string(),
        Some(tag) => format!("{}{}{}", VIRTUAL_PREFIX, tag.name(), device_id),
    }
}

/// Decode a sink string.
///
/// A `virtual-` prefix that is not followed by a catalog name is not an
/// error: the whole input is then treated as an opaque device id.
pub fn decode(sink: &str) -> SinkId {
    if let Some(rest) = sink.strip_prefix(VIRTUAL_PREFIX) {
        for entry in format::all() {
            if let Some(device_id) = rest.strip_prefix(entry.name) {
                return SinkId {
                    format: Some(entry.tag),
                    device_id: device_id.to_string(),
                };
            }
        }
    }

    SinkId {
        format: None,
        device_id: sink.to_string(),
    }
}
