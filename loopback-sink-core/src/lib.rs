//! # loopback-sink-core
//!
//! Platform-agnostic core of the streaming audio sink.
//!
//! Provides the channel-layout catalog, sink identifier encoding, format
//! negotiation, default-device switching and the loopback capture engine.
//! Platform backends (Windows WASAPI) implement the `AudioBackend`,
//! `LoopbackStream` and `EndpointPolicy` traits and plug into the generic
//! `AudioControl`.
//!
//! ## Architecture
//!
//! ```text
//! loopback-sink-core (this crate)
//! ├── traits/       ← AudioBackend, LoopbackStream, EndpointPolicy
//! ├── models/       ← errors, format catalog, sink descriptors, AudioConfig
//! ├── processing/   ← RingBuffer, WaveFormat, sink id codec
//! └── session/      ← CaptureSession, negotiator, AudioControl
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod mock;

// Re-export key types at crate root for convenience.
pub use models::config::{AudioConfig, MicrophoneRequest};
pub use models::error::{CaptureError, CaptureOpenError, NegotiationError, PlatformError};
pub use models::format::{FormatDescriptor, FormatTag};
pub use models::sink::{DeviceRole, NullSinks, SinkDescriptor};
pub use processing::ring_buffer::RingBuffer;
pub use processing::wave_format::WaveFormat;
pub use session::capture::CaptureSession;
pub use session::control::{sink_status_code, AudioControl};
pub use traits::audio_backend::AudioBackend;
pub use traits::endpoint_policy::EndpointPolicy;
pub use traits::loopback_stream::{LoopbackStream, Packet, WaitOutcome};
