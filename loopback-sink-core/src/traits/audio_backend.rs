use crate::models::error::PlatformError;
use crate::models::sink::DeviceProperties;
use crate::processing::wave_format::WaveFormat;
use crate::traits::loopback_stream::LoopbackStream;

/// Device enumeration and stream activation offered by the platform.
///
/// Implemented by:
/// - `WasapiBackend` (Windows)
pub trait AudioBackend {
    /// Id of the current default render endpoint (console role).
    fn default_render_device(&self) -> Result<String, PlatformError>;

    /// Ids of all active render endpoints, in platform order.
    fn render_devices(&self) -> Result<Vec<String>, PlatformError>;

    /// Property-store values of a device. Missing values are `None`.
    fn device_properties(&self, device_id: &str) -> DeviceProperties;

    /// Activate a shared-mode loopback stream on `device_id` with `format`,
    /// resampling to the format's rate.
    ///
    /// The returned stream is not started. Dropping it releases every
    /// handle it holds.
    fn activate_loopback(
        &self,
        device_id: &str,
        format: &WaveFormat,
    ) -> Result<Box<dyn LoopbackStream>, PlatformError>;
}
