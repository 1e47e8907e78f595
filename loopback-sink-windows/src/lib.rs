//! # loopback-sink-windows
//!
//! Windows WASAPI backend for loopback-sink.
//!
//! Provides:
//! - `WasapiBackend`: render endpoint enumeration, device properties and
//!   loopback activation via the MMDevice API
//! - `WasapiLoopbackStream`: event-driven loopback capture on a render endpoint
//! - `PolicyConfig`: device format and default-endpoint control through the
//!   undocumented `IPolicyConfig` interface
//!
//! ## Platform Requirements
//! - Windows 10 1703+ (build 15063) for event-driven loopback
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use loopback_sink_core::{AudioConfig, MicrophoneRequest};
//!
//! let control = loopback_sink_windows::audio_control(AudioConfig::default())?;
//! let sink = control.sink_info()?;
//! if let Some(null_sinks) = sink.null_sinks {
//!     control.set_sink(&null_sinks.surround51)?;
//! }
//!
//! let mut mic = control.microphone(&MicrophoneRequest::new(2, 480))?;
//! let mut window = vec![0i16; 960];
//! mic.produce(&mut window)?;
//! ```

use thiserror::Error;

use loopback_sink_core::PlatformError;

#[cfg(target_os = "windows")]
mod com;
#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod policy_config;
#[cfg(target_os = "windows")]
pub mod wasapi_loopback;
#[cfg(target_os = "windows")]
mod wave_format;

#[cfg(target_os = "windows")]
pub use device_enumerator::WasapiBackend;
#[cfg(target_os = "windows")]
pub use policy_config::PolicyConfig;
#[cfg(target_os = "windows")]
pub use wasapi_loopback::WasapiLoopbackStream;

/// Failure to bring up the platform collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendInitError {
    #[error("invalid audio configuration: {0}")]
    InvalidConfig(String),

    #[error("couldn't create device enumerator: {0}")]
    Enumerator(PlatformError),

    #[error("couldn't create audio policy config: {0}")]
    Policy(PlatformError),
}

/// Build the control object for the calling thread.
///
/// COM objects are apartment bound: use the control object, and any
/// capture session it opens, on the thread that created it.
#[cfg(target_os = "windows")]
pub fn audio_control(
    config: loopback_sink_core::AudioConfig,
) -> Result<loopback_sink_core::AudioControl<WasapiBackend, PolicyConfig>, BackendInitError> {
    config.validate().map_err(BackendInitError::InvalidConfig)?;

    let backend = WasapiBackend::new().map_err(|e| {
        log::error!("Couldn't create Device Enumerator {}", e);
        BackendInitError::Enumerator(e)
    })?;

    let policy = PolicyConfig::new().map_err(|e| {
        log::error!("Couldn't create audio policy config {}", e);
        BackendInitError::Policy(e)
    })?;

    Ok(loopback_sink_core::AudioControl::new(backend, policy, config))
}
