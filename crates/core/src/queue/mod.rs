//! Blocking, capacity-bounded FIFO of audio frames.
//!
//! The queue hands frames from the producer (decoder loop or device callback)
//! to the analysis worker. A full queue blocks the producer rather than
//! dropping audio; an empty queue blocks the consumer. Samples are copied into
//! a fresh frame before the lock is taken so the critical section only moves
//! ownership and signals the condition variables.

use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

use tracing::trace;

use crate::{Result, TempoVizError};

/// An owned chunk of mono samples. A zero-length frame is the shutdown
/// sentinel and never carries audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
}

impl AudioFrame {
    /// Copies `samples` into a new frame, reporting allocation failure instead
    /// of aborting.
    pub fn copy_from(samples: &[f32]) -> Result<Self> {
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(samples.len())
            .map_err(|_| TempoVizError::AllocationFailure {
                requested: samples.len(),
            })?;
        owned.extend_from_slice(samples);
        Ok(Self { samples: owned })
    }

    /// The frame that tells the consumer to leave its loop.
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl From<Vec<f32>> for AudioFrame {
    fn from(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

/// Occupancy of a [`BoundedFrameQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Empty,
    Partial,
    Full,
}

/// Blocking FIFO holding at most `capacity - 1` frames.
#[derive(Debug)]
pub struct BoundedFrameQueue {
    frames: Mutex<VecDeque<AudioFrame>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl BoundedFrameQueue {
    /// Creates a queue with `capacity` slots. One slot is always kept open,
    /// as in a ring-index queue, so `capacity` must be at least 2.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 {
            return Err(TempoVizError::InvalidInput(
                "queue capacity must be at least 2",
            ));
        }
        Ok(Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity - 1)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest number of frames that can wait in the queue.
    pub fn max_resident(&self) -> usize {
        self.capacity - 1
    }

    /// Copies `samples` into a new frame and appends it, blocking while the
    /// queue is full. An empty slice enqueues the shutdown sentinel.
    pub fn enqueue(&self, samples: &[f32]) -> Result<()> {
        let frame = AudioFrame::copy_from(samples)?;
        self.enqueue_frame(frame);
        Ok(())
    }

    /// Moves an already-owned frame into the queue, blocking while full.
    pub fn enqueue_frame(&self, frame: AudioFrame) {
        let limit = self.max_resident();
        let mut frames = self.lock();
        while frames.len() >= limit {
            frames = self
                .not_full
                .wait(frames)
                .unwrap_or_else(PoisonError::into_inner);
        }
        frames.push_back(frame);
        let depth = frames.len();
        drop(frames);

        trace!(depth, "frame enqueued");
        self.not_empty.notify_one();
    }

    /// Enqueues the zero-length frame that stops the consumer loop.
    pub fn enqueue_sentinel(&self) {
        self.enqueue_frame(AudioFrame::sentinel());
    }

    /// Removes the oldest frame, blocking while the queue is empty. The
    /// caller must check [`AudioFrame::is_sentinel`] before treating the
    /// frame as audio.
    pub fn dequeue(&self) -> AudioFrame {
        let mut frames = self.lock();
        let frame = loop {
            match frames.pop_front() {
                Some(frame) => break frame,
                None => {
                    frames = self
                        .not_empty
                        .wait(frames)
                        .unwrap_or_else(PoisonError::into_inner)
                }
            }
        };
        drop(frames);

        self.not_full.notify_one();
        frame
    }

    /// Removes the oldest frame if one is waiting.
    pub fn try_dequeue(&self) -> Option<AudioFrame> {
        let frame = self.lock().pop_front();
        if frame.is_some() {
            self.not_full.notify_one();
        }
        frame
    }

    /// Drops every queued frame and wakes any blocked producers.
    pub fn clear(&self) {
        let discarded = std::mem::take(&mut *self.lock());
        if !discarded.is_empty() {
            trace!(discarded = discarded.len(), "queue cleared");
        }
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> QueueState {
        match self.len() {
            0 => QueueState::Empty,
            n if n >= self.max_resident() => QueueState::Full,
            _ => QueueState::Partial,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AudioFrame>> {
        // Every critical section leaves the deque consistent, so a poisoned
        // lock still guards valid data.
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
