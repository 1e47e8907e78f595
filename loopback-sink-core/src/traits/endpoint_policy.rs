use crate::models::error::PlatformError;
use crate::models::sink::DeviceRole;
use crate::processing::wave_format::WaveFormat;

/// System-wide endpoint configuration.
///
/// Opened once per control object and reused for its lifetime.
pub trait EndpointPolicy {
    /// Current shared-mode mix format of a device.
    fn mix_format(&self, device_id: &str) -> Result<WaveFormat, PlatformError>;

    /// Replace the device's shared-mode format.
    fn set_device_format(&self, device_id: &str, format: &WaveFormat) -> Result<(), PlatformError>;

    /// Make `device_id` the default endpoint for `role`.
    fn set_default_endpoint(&self, device_id: &str, role: DeviceRole) -> Result<(), PlatformError>;
}
