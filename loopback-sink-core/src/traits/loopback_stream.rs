use crate::models::error::PlatformError;

/// Result of waiting on a stream's ready signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
}

/// One device packet, valid only for the duration of the visit.
#[derive(Debug)]
pub struct Packet<'a> {
    /// Frames in the packet (samples per channel).
    pub frames: u32,

    /// The device flagged the packet as silence; `samples` must not be read.
    pub silent: bool,

    /// Interleaved 16-bit samples.
    pub samples: &'a [i16],
}

/// An activated loopback stream.
///
/// Owned by a single capture session on a single thread.
pub trait LoopbackStream {
    /// Default device period in 100-nanosecond units.
    fn device_period(&self) -> Result<i64, PlatformError>;

    /// Size of the endpoint buffer, in frames.
    fn buffer_frame_count(&self) -> Result<u32, PlatformError>;

    /// Bind the ready signal, acquire the packet interface and start
    /// streaming.
    fn start(&mut self) -> Result<(), PlatformError>;

    /// Stop streaming. Stopping a stopped stream is not an error.
    fn stop(&mut self) -> Result<(), PlatformError>;

    /// Block until the ready signal fires or `timeout_ms` elapses.
    fn wait_ready(&mut self, timeout_ms: u32) -> Result<WaitOutcome, PlatformError>;

    /// Frames in the next pending packet, 0 when none is pending.
    fn next_packet_frames(&mut self) -> Result<u32, PlatformError>;

    /// Acquire the next packet, pass it to `visit`, then release it back to
    /// the device whether or not it was fully consumed.
    fn with_next_packet(&mut self, visit: &mut dyn FnMut(&Packet<'_>)) -> Result<(), PlatformError>;
}
