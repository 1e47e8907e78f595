use crate::models::config::MicrophoneRequest;
use crate::models::error::{CaptureError, CaptureOpenError, PlatformError};
use crate::models::format::{self, FormatDescriptor};
use crate::processing::ring_buffer::RingBuffer;
use crate::processing::wave_format::WaveFormat;
use crate::traits::audio_backend::AudioBackend;
use crate::traits::loopback_stream::{LoopbackStream, Packet, WaitOutcome};

/// Activate a loopback stream on `device_id` with a catalog format.
///
/// Negotiation failures are logged and reported as `None`; the caller
/// decides whether to keep the stream.
pub fn probe(
    backend: &dyn AudioBackend,
    device_id: &str,
    format: &FormatDescriptor,
) -> Option<Box<dyn LoopbackStream>> {
    match backend.activate_loopback(device_id, &WaveFormat::for_capture(format)) {
        Ok(stream) => Some(stream),
        Err(e) => {
            log::debug!("Couldn't initialize audio client for [{}]: {}", format.name, e);
            None
        }
    }
}

/// Whether a device accepts loopback for at least one catalog format.
///
/// Every format is probed, even after a success, so the log lists the
/// full capability set of the device.
pub fn validate(backend: &dyn AudioBackend, device_id: &str) -> bool {
    let mut valid = false;
    for format in format::all() {
        let supported = probe(backend, device_id, format).is_some();
        log::debug!(
            "{}: {}",
            format.name,
            if supported { "supported" } else { "unsupported" }
        );
        valid |= supported;
    }
    valid
}

/// A running loopback capture on the default render device.
///
/// Delivers fixed-size windows of interleaved 16-bit samples at 48 kHz.
/// Owned and driven by one thread; dropping the session stops the stream
/// and releases every handle.
pub struct CaptureSession {
    stream: Box<dyn LoopbackStream>,
    buffer: RingBuffer,
    format: &'static FormatDescriptor,
    latency_ms: u32,
    started: bool,
}

impl CaptureSession {
    /// Open a session on the default render device.
    ///
    /// Picks the first catalog format with the requested channel count that
    /// the device accepts.
    pub fn open(backend: &dyn AudioBackend, request: &MicrophoneRequest) -> Result<Self, CaptureOpenError> {
        request.validate().map_err(CaptureOpenError::InvalidRequest)?;

        if request.sample_rate != format::SAMPLE_RATE {
            log::debug!(
                "Requested sample rate [{}] will be converted from [{}]",
                request.sample_rate,
                format::SAMPLE_RATE
            );
        }

        let device_id = backend.default_render_device().map_err(|e| {
            log::error!("Couldn't create audio Device {}", e);
            CaptureOpenError::DeviceNotAvailable(e)
        })?;

        let mut selected = None;
        for format in format::all() {
            if format.channels != request.channels {
                log::debug!(
                    "Skipping audio format [{}] with channel count [{} != {}]",
                    format.name,
                    format.channels,
                    request.channels
                );
                continue;
            }

            log::debug!("Trying audio format [{}]", format.name);
            if let Some(stream) = probe(backend, &device_id, format) {
                log::debug!("Found audio format [{}]", format.name);
                selected = Some((format, stream));
                break;
            }
        }

        let Some((format, stream)) = selected else {
            log::error!("Couldn't find supported format for audio");
            return Err(CaptureOpenError::NoSupportedFormat {
                channels: request.channels,
            });
        };

        Self::start(stream, format, request.frame_size)
    }

    fn start(
        stream: Box<dyn LoopbackStream>,
        format: &'static FormatDescriptor,
        frame_size: u32,
    ) -> Result<Self, CaptureOpenError> {
        // From here on `session` owns the stream, so early returns release it.
        let mut session = Self {
            stream,
            buffer: RingBuffer::new(0),
            format,
            latency_ms: 0,
            started: false,
        };

        let period = session.stream.device_period().map_err(|e| {
            log::error!("Couldn't acquire the device period {}", e);
            CaptureOpenError::Platform(e)
        })?;
        session.latency_ms = period_to_ms(period);

        let frames = session.stream.buffer_frame_count().map_err(|e| {
            log::error!("Couldn't acquire the number of audio frames {}", e);
            CaptureOpenError::Platform(e)
        })?;
        session.buffer = RingBuffer::new(RingBuffer::capacity_for(frames, frame_size, format.channels));

        session.stream.start().map_err(|e| {
            log::error!("Couldn't start recording {}", e);
            CaptureOpenError::Platform(e)
        })?;
        session.started = true;

        Ok(session)
    }

    /// Fill `out` completely with captured samples.
    ///
    /// On error nothing is copied and already-buffered samples are kept.
    /// Samples beyond `out.len()` stay buffered for the next call.
    /// A window larger than `capacity()` is rejected before waiting.
    pub fn produce(&mut self, out: &mut [i16]) -> Result<(), CaptureError> {
        if out.len() > self.buffer.capacity() {
            log::error!(
                "Capture window of {} samples exceeds buffer capacity {}",
                out.len(),
                self.buffer.capacity()
            );
            return Err(CaptureError::WindowTooLarge {
                requested: out.len(),
                capacity: self.buffer.capacity(),
            });
        }

        while self.buffer.count() < out.len() {
            self.fill_once()?;
        }

        self.buffer.take_into(out);
        Ok(())
    }

    fn fill_once(&mut self) -> Result<(), CaptureError> {
        match self.stream.wait_ready(self.latency_ms) {
            Ok(WaitOutcome::Ready) => {}
            Ok(WaitOutcome::TimedOut) => return Err(CaptureError::Timeout),
            Err(e) => {
                log::error!("Couldn't wait for audio event {}", e);
                return Err(CaptureError::Failed(e));
            }
        }

        let channels = self.format.channels as usize;
        loop {
            let pending = self.stream.next_packet_frames().map_err(capture_failure)?;
            if pending == 0 {
                return Ok(());
            }

            let buffer = &mut self.buffer;
            self.stream
                .with_next_packet(&mut |packet: &Packet<'_>| {
                    let n = buffer.headroom().min(packet.frames as usize * channels);
                    if packet.silent {
                        buffer.write_silence(n);
                    } else {
                        buffer.write(&packet.samples[..n.min(packet.samples.len())]);
                    }
                })
                .map_err(capture_failure)?;
        }
    }

    pub fn format(&self) -> &'static FormatDescriptor {
        self.format
    }

    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    /// Wait timeout used per fill, derived from the device period.
    pub fn latency_ms(&self) -> u32 {
        self.latency_ms
    }

    /// Samples currently buffered ahead of the next window.
    pub fn buffered(&self) -> usize {
        self.buffer.count()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.started {
            if let Err(e) = self.stream.stop() {
                log::warn!("Couldn't stop recording {}", e);
            }
        }
    }
}

fn capture_failure(e: PlatformError) -> CaptureError {
    if e.is_device_invalidated() {
        CaptureError::Reinit
    } else {
        log::error!("Couldn't capture audio {}", e);
        CaptureError::Failed(e)
    }
}

/// Device period (100 ns units) to a wait timeout, at least 1 ms.
fn period_to_ms(period: i64) -> u32 {
    (period / 10_000).clamp(1, u32::MAX as i64) as u32
}
