//! Overwrite-oldest sample history for the waveform display.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fixed-capacity circular buffer of sample frames behind a single mutex.
///
/// Each slot holds `channels` values. Writes never block on readers for
/// longer than a slot copy and never fail; once full, every write replaces
/// the oldest frame. Reads copy the newest frames without consuming them.
#[derive(Debug)]
pub struct RingSampleBuffer {
    inner: Mutex<RingState>,
    capacity: usize,
    channels: usize,
}

#[derive(Debug)]
struct RingState {
    storage: Box<[f32]>,
    /// Slot the next frame is written to.
    head: usize,
    /// Oldest valid slot.
    tail: usize,
    /// Valid frames; disambiguates `head == tail` between empty and full.
    len: usize,
}

impl RingSampleBuffer {
    /// Mono buffer holding the last `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self::with_channels(capacity, 1)
    }

    /// Buffer holding the last `capacity` frames of `channels` values each.
    /// Zero arguments are raised to one.
    pub fn with_channels(capacity: usize, channels: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = channels.max(1);
        Self {
            inner: Mutex::new(RingState {
                storage: vec![0.0; capacity * channels].into_boxed_slice(),
                head: 0,
                tail: 0,
                len: 0,
            }),
            capacity,
            channels,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Writes one sample into a mono buffer. On a multi-channel buffer the
    /// value is stored on the first channel and the others are zeroed.
    pub fn push(&self, sample: f32) {
        self.push_channel_frame(&[sample]);
    }

    /// Writes one frame. Missing channels are zero-filled and extra values
    /// are ignored.
    pub fn push_channel_frame(&self, values: &[f32]) {
        let mut state = self.lock();
        self.write_frame(&mut state, values);
    }

    /// Writes every sample of a mono block under one lock acquisition.
    pub fn push_slice(&self, samples: &[f32]) {
        let mut state = self.lock();
        for sample in samples {
            self.write_frame(&mut state, std::slice::from_ref(sample));
        }
    }

    /// Writes whole frames from an interleaved block with `channels` values
    /// per frame, under one lock acquisition.
    pub fn push_interleaved(&self, samples: &[f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let mut state = self.lock();
        for frame in samples.chunks_exact(channels) {
            self.write_frame(&mut state, frame);
        }
    }

    /// Copies the newest `min(max_count, available)` frames into `out`,
    /// oldest first, and returns the number of frames copied. `out` is
    /// filled frame-interleaved; frames that do not fit in `out` are skipped
    /// from the old end.
    pub fn read_recent(&self, out: &mut [f32], max_count: usize) -> usize {
        let max_count = max_count.min(out.len() / self.channels);
        let state = self.lock();
        let count = max_count.min(state.len);
        let start = (state.head + self.capacity - count) % self.capacity;

        for i in 0..count {
            let slot = (start + i) % self.capacity;
            let src = &state.storage[slot * self.channels..(slot + 1) * self.channels];
            out[i * self.channels..(i + 1) * self.channels].copy_from_slice(src);
        }
        count
    }

    /// Owned copy of the newest `max_count` frames, oldest first.
    pub fn snapshot(&self, max_count: usize) -> Vec<f32> {
        let frames = max_count.min(self.available());
        let mut out = vec![0.0; frames * self.channels];
        let copied = self.read_recent(&mut out, frames);
        out.truncate(copied * self.channels);
        out
    }

    /// Number of valid frames currently stored.
    pub fn available(&self) -> usize {
        self.lock().len
    }

    /// Empties the buffer and zero-fills its storage.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.storage.fill(0.0);
        state.head = 0;
        state.tail = 0;
        state.len = 0;
    }

    fn write_frame(&self, state: &mut RingState, values: &[f32]) {
        let base = state.head * self.channels;
        let slot = &mut state.storage[base..base + self.channels];
        let copied = values.len().min(self.channels);
        slot[..copied].copy_from_slice(&values[..copied]);
        slot[copied..].fill(0.0);

        state.head = (state.head + 1) % self.capacity;
        if state.len == self.capacity {
            state.tail = state.head;
        } else {
            state.len += 1;
        }
        debug_assert_eq!(
            (state.tail + state.len) % self.capacity,
            state.head,
            "ring indices out of step"
        );
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        // Writes leave the indices consistent after every frame, so a poisoned
        // lock still guards usable data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
