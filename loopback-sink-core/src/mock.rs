//! Scripted platform collaborators for unit tests.
//!
//! Devices declare which channel masks they accept for loopback; streams
//! replay a script of wake-ups and packets; the policy records every call.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::{PlatformError, AUDCLNT_E_UNSUPPORTED_FORMAT};
use crate::models::sink::{DeviceProperties, DeviceRole};
use crate::processing::wave_format::{WaveFormat, WAVE_FORMAT_EXTENSIBLE};
use crate::traits::audio_backend::AudioBackend;
use crate::traits::endpoint_policy::EndpointPolicy;
use crate::traits::loopback_stream::{LoopbackStream, Packet, WaitOutcome};

const E_NOTFOUND: i32 = 0x8007_0490_u32 as i32;

#[derive(Debug, Clone)]
pub enum ScriptedPacket {
    Data { frames: u32, samples: Vec<i16> },
    Silent { frames: u32 },
    /// `GetNextPacketSize` fails.
    SizeError(i32),
    /// `GetBuffer` fails.
    BufferError(i32),
}

impl ScriptedPacket {
    pub fn data(channels: u16, samples: Vec<i16>) -> Self {
        Self::Data {
            frames: (samples.len() / channels as usize) as u32,
            samples,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Wake {
    Ready(Vec<ScriptedPacket>),
    TimedOut,
    Failed(i32),
}

#[derive(Debug, Default)]
pub struct StreamState {
    pub wakes: VecDeque<Wake>,
    pending: VecDeque<ScriptedPacket>,
    pub device_period: i64,
    pub buffer_frames: u32,
    pub start_error: Option<i32>,
    pub stop_error: Option<i32>,
    pub started: usize,
    pub stopped: usize,
    pub dropped: usize,
    pub released_frames: Vec<u32>,
    pub wait_timeouts: Vec<u32>,
}

pub struct MockStream {
    state: Arc<Mutex<StreamState>>,
}

impl LoopbackStream for MockStream {
    fn device_period(&self) -> Result<i64, PlatformError> {
        Ok(self.state.lock().device_period)
    }

    fn buffer_frame_count(&self) -> Result<u32, PlatformError> {
        Ok(self.state.lock().buffer_frames)
    }

    fn start(&mut self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if let Some(code) = state.start_error {
            return Err(PlatformError::new(code, "Start"));
        }
        state.started += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.stopped += 1;
        match state.stop_error {
            Some(code) => Err(PlatformError::new(code, "Stop")),
            None => Ok(()),
        }
    }

    fn wait_ready(&mut self, timeout_ms: u32) -> Result<WaitOutcome, PlatformError> {
        let mut state = self.state.lock();
        state.wait_timeouts.push(timeout_ms);
        match state.wakes.pop_front() {
            Some(Wake::Ready(packets)) => {
                state.pending.extend(packets);
                Ok(WaitOutcome::Ready)
            }
            Some(Wake::Failed(code)) => Err(PlatformError::new(code, "WaitForSingleObjectEx")),
            Some(Wake::TimedOut) | None => Ok(WaitOutcome::TimedOut),
        }
    }

    fn next_packet_frames(&mut self) -> Result<u32, PlatformError> {
        let mut state = self.state.lock();
        match state.pending.front() {
            None => Ok(0),
            Some(ScriptedPacket::SizeError(code)) => {
                let code = *code;
                state.pending.pop_front();
                Err(PlatformError::new(code, "GetNextPacketSize"))
            }
            Some(ScriptedPacket::Data { frames, .. }) | Some(ScriptedPacket::Silent { frames }) => Ok(*frames),
            Some(ScriptedPacket::BufferError(_)) => Ok(1),
        }
    }

    fn with_next_packet(&mut self, visit: &mut dyn FnMut(&Packet<'_>)) -> Result<(), PlatformError> {
        let packet = self.state.lock().pending.pop_front();
        let frames = match packet {
            Some(ScriptedPacket::Data { frames, samples }) => {
                visit(&Packet {
                    frames,
                    silent: false,
                    samples: &samples,
                });
                frames
            }
            Some(ScriptedPacket::Silent { frames }) => {
                visit(&Packet {
                    frames,
                    silent: true,
                    samples: &[],
                });
                frames
            }
            Some(ScriptedPacket::BufferError(code)) | Some(ScriptedPacket::SizeError(code)) => {
                return Err(PlatformError::new(code, "GetBuffer"));
            }
            None => return Err(PlatformError::new(-1, "GetBuffer")),
        };
        self.state.lock().released_frames.push(frames);
        Ok(())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.state.lock().dropped += 1;
    }
}

#[derive(Debug, Clone)]
pub struct MockDevice {
    pub id: String,
    pub properties: DeviceProperties,
    /// Channel masks accepted for loopback activation.
    pub supported_masks: Vec<u32>,
}

impl MockDevice {
    pub fn new(id: &str, adapter_name: &str, supported_masks: Vec<u32>) -> Self {
        Self {
            id: id.into(),
            properties: DeviceProperties {
                friendly_name: Some(format!("Speakers ({})", adapter_name)),
                adapter_name: Some(adapter_name.into()),
                description: Some("Speakers".into()),
            },
            supported_masks,
        }
    }
}

pub struct MockBackend {
    pub default_device: Option<String>,
    pub devices: Vec<MockDevice>,
    pub enumeration_error: Option<i32>,
    pub stream: Arc<Mutex<StreamState>>,
    /// Every activation attempt: (device id, channel count, mask).
    pub activations: Mutex<Vec<(String, u16, u32)>>,
}

impl MockBackend {
    pub fn new(default_device: &str, devices: Vec<MockDevice>) -> Self {
        Self {
            default_device: Some(default_device.into()),
            devices,
            enumeration_error: None,
            stream: Arc::new(Mutex::new(StreamState {
                device_period: 100_000,
                buffer_frames: 480,
                ..StreamState::default()
            })),
            activations: Mutex::new(Vec::new()),
        }
    }

    pub fn script(&self, wakes: Vec<Wake>) {
        self.stream.lock().wakes.extend(wakes);
    }
}

impl AudioBackend for MockBackend {
    fn default_render_device(&self) -> Result<String, PlatformError> {
        self.default_device
            .clone()
            .ok_or_else(|| PlatformError::new(E_NOTFOUND, "GetDefaultAudioEndpoint"))
    }

    fn render_devices(&self) -> Result<Vec<String>, PlatformError> {
        if let Some(code) = self.enumeration_error {
            return Err(PlatformError::new(code, "EnumAudioEndpoints"));
        }
        Ok(self.devices.iter().map(|d| d.id.clone()).collect())
    }

    fn device_properties(&self, device_id: &str) -> DeviceProperties {
        self.devices
            .iter()
            .find(|d| d.id == device_id)
            .map(|d| d.properties.clone())
            .unwrap_or_default()
    }

    fn activate_loopback(
        &self,
        device_id: &str,
        format: &WaveFormat,
    ) -> Result<Box<dyn LoopbackStream>, PlatformError> {
        let mask = format.channel_mask().unwrap_or(0);
        self.activations
            .lock()
            .push((device_id.to_string(), format.channels, mask));

        let device = self
            .devices
            .iter()
            .find(|d| d.id == device_id)
            .ok_or_else(|| PlatformError::new(E_NOTFOUND, "Activate"))?;

        if !device.supported_masks.contains(&mask) {
            return Err(PlatformError::new(AUDCLNT_E_UNSUPPORTED_FORMAT, "Initialize"));
        }

        Ok(Box::new(MockStream {
            state: Arc::clone(&self.stream),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyCall {
    MixFormat(String),
    SetDeviceFormat(String, WaveFormat),
    SetDefaultEndpoint(String, DeviceRole),
}

#[derive(Default)]
pub struct MockPolicy {
    pub mix_formats: HashMap<String, WaveFormat>,
    /// Channel masks the device refuses, with the status returned.
    pub rejected_masks: Vec<(u32, i32)>,
    pub failing_roles: Vec<DeviceRole>,
    pub calls: Mutex<Vec<PolicyCall>>,
}

impl MockPolicy {
    pub fn with_mix_format(device_id: &str, format: WaveFormat) -> Self {
        let mut policy = Self::default();
        policy.mix_formats.insert(device_id.into(), format);
        policy
    }

    pub fn calls(&self) -> Vec<PolicyCall> {
        self.calls.lock().clone()
    }
}

impl EndpointPolicy for MockPolicy {
    fn mix_format(&self, device_id: &str) -> Result<WaveFormat, PlatformError> {
        self.calls.lock().push(PolicyCall::MixFormat(device_id.into()));
        self.mix_formats
            .get(device_id)
            .copied()
            .ok_or_else(|| PlatformError::new(E_NOTFOUND, "GetMixFormat"))
    }

    fn set_device_format(&self, device_id: &str, format: &WaveFormat) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .push(PolicyCall::SetDeviceFormat(device_id.into(), *format));
        let mask = format.channel_mask().unwrap_or(0);
        match self.rejected_masks.iter().find(|(m, _)| *m == mask) {
            Some((_, code)) => Err(PlatformError::new(*code, "SetDeviceFormat")),
            None => Ok(()),
        }
    }

    fn set_default_endpoint(&self, device_id: &str, role: DeviceRole) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .push(PolicyCall::SetDefaultEndpoint(device_id.into(), role));
        if self.failing_roles.contains(&role) {
            return Err(PlatformError::new(-1, "SetDefaultEndpoint"));
        }
        Ok(())
    }
}

/// A 48 kHz float stereo mix format as shared-mode devices typically report.
pub fn float_stereo_mix_format() -> WaveFormat {
    use crate::processing::wave_format::{ExtensibleFormat, SubFormat};

    WaveFormat {
        format_tag: WAVE_FORMAT_EXTENSIBLE,
        channels: 2,
        samples_per_sec: 48_000,
        avg_bytes_per_sec: 48_000 * 8,
        block_align: 8,
        bits_per_sample: 32,
        extensible: Some(ExtensibleFormat {
            valid_bits_per_sample: 32,
            channel_mask: 0x3,
            sub_format: SubFormat::IeeeFloat,
        }),
    }
}
