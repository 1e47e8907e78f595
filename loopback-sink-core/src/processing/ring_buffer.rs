/// Fixed-capacity sample store for the capture engine.
///
/// Not a wraparound ring: valid samples always start at index 0 and end at
/// the fill cursor. Taking a window shifts the excess to the front, which
/// only happens once per delivered window.
///
/// Overflow behavior: writes are clamped to the remaining headroom and the
/// rest of the input is dropped.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<i16>,
    fill: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            fill: 0,
        }
    }

    /// Capacity for a capture session: room for one pending window plus one
    /// more device burst.
    pub fn capacity_for(device_frames: u32, frame_size: u32, channels: u16) -> usize {
        device_frames.max(frame_size) as usize * 2 * channels as usize
    }

    /// Copy as many of `samples` as fit. Returns the number written.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        let n = samples.len().min(self.headroom());
        self.buffer[self.fill..self.fill + n].copy_from_slice(&samples[..n]);
        self.fill += n;
        n
    }

    /// Append up to `count` zero samples. Returns the number written.
    pub fn write_silence(&mut self, count: usize) -> usize {
        let n = count.min(self.headroom());
        self.buffer[self.fill..self.fill + n].fill(0);
        self.fill += n;
        n
    }

    /// Move the first `out.len()` samples into `out` and compact the rest.
    ///
    /// Returns false, leaving the buffer untouched, when fewer samples are
    /// buffered than requested.
    pub fn take_into(&mut self, out: &mut [i16]) -> bool {
        let n = out.len();
        if n > self.fill {
            return false;
        }

        out.copy_from_slice(&self.buffer[..n]);
        self.buffer.copy_within(n..self.fill, 0);
        self.fill -= n;
        true
    }

    /// Number of buffered samples (the fill cursor).
    pub fn count(&self) -> usize {
        self.fill
    }

    pub fn headroom(&self) -> usize {
        self.buffer.len() - self.fill
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
