use std::{
    panic::{self, AssertUnwindSafe},
    sync::{atomic::Ordering, Arc},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, error, info};

use super::{Shared, SharedTracker};
use crate::{
    wave::{DecodeError, ReadStatus, Wave},
    Result,
};

/// Consumer loop: runs until it dequeues the shutdown sentinel.
///
/// A panicking tracker poisons its mutex; later frames are then drained
/// without analysis so the producer is never left blocked on a full queue.
pub(super) fn run_analysis(shared: Arc<Shared>, tracker: SharedTracker) {
    debug!("analysis worker started");
    let mut frames = 0_u64;

    loop {
        let frame = shared.queue.dequeue();
        if frame.is_sentinel() {
            break;
        }

        let estimate = panic::catch_unwind(AssertUnwindSafe(|| {
            tracker.lock().ok().map(|mut tracker| {
                tracker.process(frame.samples());
                tracker.tempo_bpm()
            })
        }));
        match estimate {
            Ok(Some(bpm)) => {
                if shared.tempo.update(bpm) {
                    debug!(tempo_bpm = bpm, "tempo changed");
                }
            }
            Ok(None) => {}
            Err(_) => error!("tempo tracker panicked, analysis suspended"),
        }

        shared
            .frames_analysed
            .fetch_add(frame.len() as u64, Ordering::Relaxed);
        frames += 1;
    }

    debug!(frames, "analysis worker observed shutdown sentinel");
}

/// Settings a file producer thread needs from the coordinator.
pub(super) struct FileProducer {
    pub wave: Wave,
    pub block_size: usize,
    pub target_sample_rate: Option<u32>,
    pub pace_realtime: bool,
}

impl FileProducer {
    /// Decoder-driven loop: reads blocks from the wave and fans them out
    /// until the file ends or the pipeline stops accepting frames.
    pub(super) fn run(mut self, shared: Arc<Shared>) -> Result<()> {
        let channels = self.wave.channels();
        let path = self.wave.path().display().to_string();

        let target = self
            .target_sample_rate
            .filter(|rate| *rate != self.wave.sample_rate());
        if let Some(rate) = target {
            self.wave.resample(rate)?;
        }

        let mut pacer = Pacer::new(self.wave.sample_rate(), self.pace_realtime);
        let outcome = if target.is_some() {
            let samples = self.wave.take_samples();
            let mut outcome = Ok(());
            for block in samples.chunks(self.block_size * channels) {
                match shared.produce(block, channels) {
                    Ok(true) => pacer.wait(block.len() / channels),
                    Ok(false) => break,
                    Err(err) => {
                        outcome = Err(err);
                        break;
                    }
                }
            }
            outcome
        } else {
            self.stream(&shared, channels, &mut pacer)
        };

        match &outcome {
            Ok(()) => info!(path, "file source finished"),
            Err(err) => error!(path, %err, "file source failed"),
        }
        self.wave.close();
        outcome
    }

    fn stream(&mut self, shared: &Shared, channels: usize, pacer: &mut Pacer) -> Result<()> {
        loop {
            let read = self.wave.read(self.block_size);
            if read.frames > 0 {
                if !shared.produce(&read.samples, channels)? {
                    return Ok(());
                }
                pacer.wait(read.frames);
            }
            match read.status {
                ReadStatus::Success => {}
                ReadStatus::Eof => return Ok(()),
                ReadStatus::Error => {
                    let err = read
                        .error
                        .unwrap_or_else(|| DecodeError::BadHeader("unreadable sample data".into()));
                    return Err(err.into());
                }
            }
        }
    }
}

/// Sleeps so that blocks are released no faster than real time.
struct Pacer {
    sample_rate: f64,
    enabled: bool,
    deadline: Instant,
}

impl Pacer {
    fn new(sample_rate: u32, enabled: bool) -> Self {
        Self {
            sample_rate: f64::from(sample_rate.max(1)),
            enabled,
            deadline: Instant::now(),
        }
    }

    fn wait(&mut self, frames: usize) {
        if !self.enabled {
            return;
        }
        self.deadline += Duration::from_secs_f64(frames as f64 / self.sample_rate);
        let now = Instant::now();
        if self.deadline > now {
            thread::sleep(self.deadline - now);
        } else {
            // Fell behind; do not try to catch up with a burst.
            self.deadline = now;
        }
    }
}
