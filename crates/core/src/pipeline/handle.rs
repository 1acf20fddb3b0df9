use std::sync::{atomic::Ordering, Arc};

use super::{PipelineState, Shared};
use crate::Result;

/// Cloneable handle an audio-device callback uses to feed the pipeline.
#[derive(Clone)]
pub struct FrameProducer {
    shared: Arc<Shared>,
}

impl FrameProducer {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Stages one interleaved block: the first channel is queued for
    /// analysis and the ring receives the channels it is configured for.
    ///
    /// Returns `Ok(false)` and drops the block when the pipeline is not
    /// running. Blocks while the analysis queue is full.
    pub fn push_interleaved(&self, samples: &[f32], channels: usize) -> Result<bool> {
        self.shared.produce(samples, channels)
    }

    /// Shorthand for a mono block.
    pub fn push(&self, samples: &[f32]) -> Result<bool> {
        self.shared.produce(samples, 1)
    }
}

impl std::fmt::Debug for FrameProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProducer").finish()
    }
}

/// Read-only view polled by the UI. None of its calls wait on the analysis
/// queue.
#[derive(Clone)]
pub struct PipelineMonitor {
    shared: Arc<Shared>,
}

impl PipelineMonitor {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn current_tempo(&self) -> f64 {
        self.shared.tempo.load()
    }

    /// Newest `max_samples` ring frames, oldest first.
    pub fn read_waveform_snapshot(&self, max_samples: usize) -> Vec<f32> {
        self.shared.ring.snapshot(max_samples)
    }

    /// Copies the newest frames into `out` and returns how many were copied.
    pub fn read_waveform_into(&self, out: &mut [f32], max_samples: usize) -> usize {
        self.shared.ring.read_recent(out, max_samples)
    }

    /// Channels stored per waveform frame.
    pub fn waveform_channels(&self) -> usize {
        self.shared.ring.channels()
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// Sample frames accepted from the producer since the last start.
    pub fn frames_produced(&self) -> u64 {
        self.shared.frames_produced.load(Ordering::Relaxed)
    }

    /// Sample frames handed to the tracker since the last start.
    pub fn frames_analysed(&self) -> u64 {
        self.shared.frames_analysed.load(Ordering::Relaxed)
    }

    /// Frames waiting for the analysis worker.
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.len()
    }
}

impl std::fmt::Debug for PipelineMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMonitor")
            .field("state", &self.state())
            .field("tempo_bpm", &self.current_tempo())
            .finish()
    }
}
