use parking_lot::Mutex;

use crate::models::config::{AudioConfig, MicrophoneRequest};
use crate::models::error::{CaptureOpenError, NegotiationError};
use crate::models::sink::SinkDescriptor;
use crate::session::capture::CaptureSession;
use crate::session::negotiator;
use crate::traits::audio_backend::AudioBackend;
use crate::traits::endpoint_policy::EndpointPolicy;

/// Entry point for the streaming pipeline: sink queries, sink switching and
/// capture sessions.
///
/// The policy object is opened once by the platform layer and reused for
/// the lifetime of the control object. Configuration calls are serialized
/// through it.
pub struct AudioControl<B: AudioBackend, P: EndpointPolicy> {
    backend: B,
    policy: Mutex<P>,
    config: AudioConfig,
}

impl<B: AudioBackend, P: EndpointPolicy> AudioControl<B, P> {
    pub fn new(backend: B, policy: P, config: AudioConfig) -> Self {
        Self {
            backend,
            policy: Mutex::new(policy),
            config,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn sink_info(&self) -> Result<SinkDescriptor, NegotiationError> {
        negotiator::current_sink(&self.backend, &self.config)
    }

    /// Switch the system default output to `sink`.
    ///
    /// `Ok(0)` is full success, `Ok(n)` means `n` roles kept their previous
    /// default device.
    pub fn set_sink(&self, sink: &str) -> Result<usize, NegotiationError> {
        let policy = self.policy.lock();
        negotiator::set_active_sink(&*policy, sink)
    }

    pub fn microphone(&self, request: &MicrophoneRequest) -> Result<CaptureSession, CaptureOpenError> {
        CaptureSession::open(&self.backend, request)
    }
}

/// Integer form of a `set_sink` result: 0 on success, the number of roles
/// that failed to switch, or -1 on a hard failure.
pub fn sink_status_code(result: &Result<usize, NegotiationError>) -> i32 {
    match result {
        Ok(failures) => (*failures).min(i32::MAX as usize) as i32,
        Err(_) => -1,
    }
}
