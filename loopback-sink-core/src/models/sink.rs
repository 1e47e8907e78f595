use serde::{Deserialize, Serialize};

/// Placeholder for a device property the platform did not report.
pub const UNKNOWN_PROPERTY: &str = "Unknown";

/// Default-device assignment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Console,
    Multimedia,
    Communications,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 3] = [Self::Console, Self::Multimedia, Self::Communications];

    /// Platform ordinal of the role.
    pub fn index(self) -> i32 {
        match self {
            Self::Console => 0,
            Self::Multimedia => 1,
            Self::Communications => 2,
        }
    }
}

/// Raw, optional properties as read from a device's property store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    pub friendly_name: Option<String>,
    pub adapter_name: Option<String>,
    pub description: Option<String>,
}

/// An active render device that validated during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub friendly_name: String,
    pub adapter_name: String,
    pub description: String,
}

impl DeviceDescriptor {
    pub fn from_properties(id: String, properties: DeviceProperties) -> Self {
        let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN_PROPERTY.to_string());
        Self {
            id,
            friendly_name: or_unknown(properties.friendly_name),
            adapter_name: or_unknown(properties.adapter_name),
            description: or_unknown(properties.description),
        }
    }
}

/// Encoded sink strings for each layout of the virtual sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullSinks {
    pub stereo: String,
    pub surround51: String,
    pub surround71: String,
}

/// Result of a sink query: the current default device and, when a virtual
/// streaming sink is known, its per-layout identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkDescriptor {
    pub host: String,
    pub null_sinks: Option<NullSinks>,
}
