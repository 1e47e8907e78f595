use std::fmt;

use thiserror::Error;

/// `AUDCLNT_E_DEVICE_INVALIDATED`: the endpoint was removed, disabled or
/// replaced as the default device while a stream was open on it.
pub const AUDCLNT_E_DEVICE_INVALIDATED: i32 = 0x8889_0004_u32 as i32;

/// `AUDCLNT_E_UNSUPPORTED_FORMAT`: the requested format matches no supported
/// topology of the endpoint.
pub const AUDCLNT_E_UNSUPPORTED_FORMAT: i32 = 0x8889_0008_u32 as i32;

/// Raw status reported by the platform audio layer.
///
/// This is the only place a platform status code exists inside the core.
/// Operations convert it into one of the typed errors below before
/// returning to their caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub code: i32,
    pub context: String,
}

impl PlatformError {
    pub fn new(code: i32, context: impl Into<String>) -> Self {
        Self {
            code,
            context: context.into(),
        }
    }

    pub fn is_device_invalidated(&self) -> bool {
        self.code == AUDCLNT_E_DEVICE_INVALIDATED
    }

    pub fn is_unsupported_format(&self) -> bool {
        self.code == AUDCLNT_E_UNSUPPORTED_FORMAT
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [0x{:08X}]", self.context, self.code as u32)
    }
}

impl std::error::Error for PlatformError {}

/// Outcome of a `CaptureSession::produce` call that did not fill the window.
///
/// `Timeout` and `Reinit` are the recoverable outcomes. What to do about
/// them (retry, back off, reopen) is left to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No data became ready within one device period.
    #[error("timed out waiting for audio data")]
    Timeout,

    /// The device was invalidated; the session must be closed and reopened.
    #[error("audio device invalidated, session must be reopened")]
    Reinit,

    /// The requested window can never fit in the session's sample buffer.
    #[error("window of {requested} samples exceeds buffer capacity of {capacity}")]
    WindowTooLarge { requested: usize, capacity: usize },

    /// Non-recoverable for this session.
    #[error("audio capture failed: {0}")]
    Failed(PlatformError),
}

impl CaptureError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Reinit)
    }
}

/// Errors from opening a capture session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureOpenError {
    #[error("invalid capture request: {0}")]
    InvalidRequest(String),

    #[error("default render device not available: {0}")]
    DeviceNotAvailable(PlatformError),

    #[error("no supported audio format with {channels} channels")]
    NoSupportedFormat { channels: u16 },

    #[error("{0}")]
    Platform(PlatformError),
}

/// Errors from sink enumeration and default-device switching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("default render device not available: {0}")]
    DeviceNotAvailable(PlatformError),

    #[error("device enumeration failed: {0}")]
    Enumeration(PlatformError),

    #[error("couldn't acquire mix format: {0}")]
    MixFormat(PlatformError),

    #[error("unsupported wave format tag [0x{0:04X}]")]
    UnsupportedWaveFormat(u16),

    #[error("couldn't set device format: {0}")]
    SetFormat(PlatformError),
}
