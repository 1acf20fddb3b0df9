//! Producer → {ring buffer, analysis queue} fan-out and its worker threads.
//!
//! The [`PipelineCoordinator`] owns every piece of shared state: the waveform
//! ring, the analysis queue, the tempo cell and the tracker. A producer (the
//! built-in file reader thread, or an external device callback holding a
//! [`FrameProducer`]) writes each block once into the ring and once into the
//! queue. One analysis thread drains the queue into the tracker. The UI reads
//! tempo and waveform through a [`PipelineMonitor`] on its own schedule.
//!
//! Shutdown is cooperative: `stop` closes the gate to new frames, waits for
//! the file producer, enqueues the zero-length sentinel frame behind whatever
//! is already queued, and joins the analysis thread before clearing buffers.

mod handle;
mod tempo;
mod worker;

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, AtomicU8, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
};

use tracing::{info, warn};

use crate::{
    config::{AppConfig, AudioConfig, PipelineConfig},
    queue::{AudioFrame, BoundedFrameQueue},
    ring::RingSampleBuffer,
    tracker::TempoTracker,
    wave::Wave,
    Result, TempoVizError,
};

pub use handle::{FrameProducer, PipelineMonitor};
pub use tempo::TempoCell;

use worker::FileProducer;

pub(crate) type SharedTracker = Arc<Mutex<Box<dyn TempoTracker>>>;

/// Lifecycle of a [`PipelineCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Stopped,
    Running,
    /// Shutdown requested; frames are no longer accepted.
    Draining,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PipelineState::Running,
            2 => PipelineState::Draining,
            _ => PipelineState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PipelineState::Stopped => 0,
            PipelineState::Running => 1,
            PipelineState::Draining => 2,
        }
    }
}

/// Where produced frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// A WAV file read by a coordinator-owned producer thread.
    File(PathBuf),
    /// An external callback pushing through [`PipelineCoordinator::producer`].
    Callback { sample_rate: u32 },
}

/// State touched by the producer, the analysis worker and the UI.
#[derive(Debug)]
pub(crate) struct Shared {
    ring: RingSampleBuffer,
    queue: BoundedFrameQueue,
    tempo: TempoCell,
    state: AtomicU8,
    /// Producers hold it shared for the whole fan-out; `stop` takes it
    /// exclusively to flip the state, so no frame lands after the sentinel.
    gate: RwLock<()>,
    frames_produced: AtomicU64,
    frames_analysed: AtomicU64,
}

impl Shared {
    fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            ring: RingSampleBuffer::with_channels(config.ring_capacity, config.ring_channels),
            queue: BoundedFrameQueue::new(config.queue_capacity)?,
            tempo: TempoCell::default(),
            state: AtomicU8::new(PipelineState::Stopped.as_u8()),
            gate: RwLock::new(()),
            frames_produced: AtomicU64::new(0),
            frames_analysed: AtomicU64::new(0),
        })
    }

    fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PipelineState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Fans one interleaved block out to the ring and the analysis queue.
    /// Returns `false` without touching either when the pipeline is not
    /// running. Blocks while the analysis queue is full.
    fn produce(&self, samples: &[f32], channels: usize) -> Result<bool> {
        if channels == 0 {
            return Err(TempoVizError::InvalidInput("channel count must be positive"));
        }
        let _gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        if self.state() != PipelineState::Running {
            return Ok(false);
        }
        if samples.len() < channels {
            return Ok(true);
        }

        let frame = if channels == 1 {
            AudioFrame::copy_from(samples)?
        } else {
            first_channel(samples, channels)?
        };
        if self.ring.channels() == 1 {
            self.ring.push_slice(frame.samples());
        } else {
            self.ring.push_interleaved(samples, channels);
        }

        self.frames_produced
            .fetch_add(frame.len() as u64, Ordering::Relaxed);
        self.queue.enqueue_frame(frame);
        Ok(true)
    }
}

fn first_channel(samples: &[f32], channels: usize) -> Result<AudioFrame> {
    let frames = samples.len() / channels;
    let mut mono = Vec::new();
    mono.try_reserve_exact(frames)
        .map_err(|_| TempoVizError::AllocationFailure { requested: frames })?;
    mono.extend(samples.chunks_exact(channels).map(|frame| frame[0]));
    Ok(AudioFrame::from(mono))
}

/// Owns the staging buffers, the tracker and the worker threads.
pub struct PipelineCoordinator {
    audio: AudioConfig,
    pace_realtime: bool,
    shared: Arc<Shared>,
    tracker: SharedTracker,
    analysis: Option<JoinHandle<()>>,
    producer: Option<JoinHandle<Result<()>>>,
    source: Option<AudioSource>,
}

impl PipelineCoordinator {
    /// Validates `config`, builds the buffers and applies the configured
    /// tracker parameters. No thread is started until [`Self::start`].
    pub fn new<T>(config: AppConfig, tracker: T) -> Result<Self>
    where
        T: TempoTracker + 'static,
    {
        Self::with_boxed_tracker(config, Box::new(tracker))
    }

    pub fn with_boxed_tracker(
        config: AppConfig,
        mut tracker: Box<dyn TempoTracker>,
    ) -> Result<Self> {
        config.validate()?;
        for (name, value) in &config.tracker {
            tracker.set_parameter(name, *value)?;
        }

        Ok(Self {
            shared: Arc::new(Shared::new(&config.pipeline)?),
            audio: config.audio,
            pace_realtime: config.pipeline.pace_realtime,
            tracker: Arc::new(Mutex::new(tracker)),
            analysis: None,
            producer: None,
            source: None,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// The source most recently passed to [`Self::start`].
    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    /// Attaches `source` and starts the analysis worker, plus a producer
    /// thread for file sources. The file is opened before any thread starts,
    /// so a bad file leaves the pipeline stopped and reusable.
    pub fn start(&mut self, source: AudioSource) -> Result<()> {
        let state = self.state();
        if state != PipelineState::Stopped {
            return Err(TempoVizError::InvalidState {
                action: "start",
                state,
            });
        }

        let (wave, sample_rate) = match &source {
            AudioSource::File(path) => {
                let wave = Wave::open(path)?;
                let rate = self.audio.target_sample_rate.unwrap_or(wave.sample_rate());
                (Some(wave), rate)
            }
            AudioSource::Callback { sample_rate: 0 } => {
                return Err(TempoVizError::InvalidInput("sample rate must be positive"));
            }
            AudioSource::Callback { sample_rate } => (None, *sample_rate),
        };

        {
            let mut tracker = self.lock_tracker()?;
            tracker.reset();
            tracker.set_sample_rate(sample_rate);
        }
        self.shared.tempo.store(0.0);
        self.shared.frames_produced.store(0, Ordering::Relaxed);
        self.shared.frames_analysed.store(0, Ordering::Relaxed);

        let analysis = {
            let shared = Arc::clone(&self.shared);
            let tracker = Arc::clone(&self.tracker);
            thread::Builder::new()
                .name("tempo-analysis".into())
                .spawn(move || worker::run_analysis(shared, tracker))
                .map_err(|source| TempoVizError::ThreadStartFailure {
                    thread: "analysis",
                    source,
                })?
        };
        self.analysis = Some(analysis);
        self.shared.set_state(PipelineState::Running);

        if let Some(wave) = wave {
            let producer = FileProducer {
                wave,
                block_size: self.audio.block_size,
                target_sample_rate: self.audio.target_sample_rate,
                pace_realtime: self.pace_realtime,
            };
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name("wave-producer".into())
                .spawn(move || producer.run(shared));
            match spawned {
                Ok(handle) => self.producer = Some(handle),
                Err(source) => {
                    if let Err(err) = self.stop() {
                        warn!(%err, "failed to unwind partially started pipeline");
                    }
                    return Err(TempoVizError::ThreadStartFailure {
                        thread: "producer",
                        source,
                    });
                }
            }
        }

        info!(?source, sample_rate, "pipeline started");
        self.source = Some(source);
        Ok(())
    }

    /// Stops accepting frames, lets the analysis worker finish everything
    /// already queued, joins all threads and clears both buffers.
    ///
    /// Returns the file producer's error, if it failed, once shutdown is
    /// complete. Calling `stop` on a stopped pipeline is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if self.analysis.is_none() {
            self.shared.set_state(PipelineState::Stopped);
            return Ok(());
        }

        {
            let _gate = self.shared.gate.write().unwrap_or_else(PoisonError::into_inner);
            self.shared.set_state(PipelineState::Draining);
        }

        let producer = self.producer.take().map(JoinHandle::join);
        self.shared.queue.enqueue_sentinel();
        let analysis = self.analysis.take().map(JoinHandle::join);

        self.shared.set_state(PipelineState::Stopped);
        self.shared.queue.clear();
        self.shared.ring.clear();
        info!(
            frames_analysed = self.shared.frames_analysed.load(Ordering::Relaxed),
            "pipeline stopped"
        );

        if let Some(Err(_)) = analysis {
            return Err(TempoVizError::ThreadPanicked("analysis"));
        }
        if self.tracker.is_poisoned() {
            return Err(TempoVizError::ThreadPanicked("tracker"));
        }
        match producer {
            Some(Err(_)) => Err(TempoVizError::ThreadPanicked("producer")),
            Some(Ok(result)) => result,
            None => Ok(()),
        }
    }

    /// Switches to `source` without recreating the coordinator. An error
    /// left behind by the previous source is logged, not returned.
    pub fn reset(&mut self, source: AudioSource) -> Result<()> {
        if let Err(err) = self.stop() {
            warn!(%err, "previous source ended with an error");
        }
        self.shared.queue.clear();
        self.shared.ring.clear();
        self.start(source)
    }

    /// Handle for pushing frames from an external callback.
    pub fn producer(&self) -> FrameProducer {
        FrameProducer::new(Arc::clone(&self.shared))
    }

    /// Read-only handle for the UI.
    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(Arc::clone(&self.shared))
    }

    pub fn current_tempo(&self) -> f64 {
        self.shared.tempo.load()
    }

    /// Newest `max_samples` ring frames, oldest first.
    pub fn read_waveform_snapshot(&self, max_samples: usize) -> Vec<f32> {
        self.shared.ring.snapshot(max_samples)
    }

    /// Whether the file producer has delivered its last block. Always
    /// `false` for callback sources.
    pub fn source_finished(&self) -> bool {
        self.producer
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(false)
    }

    /// Forwards a tuning parameter to the tracker, also while running.
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<()> {
        self.lock_tracker()?.set_parameter(name, value)
    }

    pub fn parameter_names(&self) -> Result<Vec<&'static str>> {
        Ok(self.lock_tracker()?.parameter_names())
    }

    fn lock_tracker(&self) -> Result<MutexGuard<'_, Box<dyn TempoTracker>>> {
        self.tracker
            .lock()
            .map_err(|_| TempoVizError::msg("tempo tracker has been poisoned"))
    }
}

impl Drop for PipelineCoordinator {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(%err, "pipeline shut down with an error");
        }
    }
}

impl std::fmt::Debug for PipelineCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCoordinator")
            .field("state", &self.state())
            .field("source", &self.source)
            .field("tempo_bpm", &self.current_tempo())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        time::{Duration, Instant},
    };

    use super::*;
    use crate::{tracker::OnsetTempoTracker, wave::write_wav};

    /// Records every block it is given; its tempo is the block count.
    #[derive(Default)]
    struct ProbeTracker {
        blocks: Arc<Mutex<Vec<Vec<f32>>>>,
        delay: Duration,
        sample_rate: Arc<AtomicU64>,
    }

    impl TempoTracker for ProbeTracker {
        fn process(&mut self, samples: &[f32]) {
            thread::sleep(self.delay);
            self.blocks.lock().unwrap().push(samples.to_vec());
        }

        fn tempo_bpm(&self) -> f64 {
            self.blocks.lock().unwrap().len() as f64
        }

        fn set_sample_rate(&mut self, sample_rate: u32) {
            self.sample_rate
                .store(u64::from(sample_rate), Ordering::SeqCst);
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pipeline.queue_capacity = 4;
        config.pipeline.ring_capacity = 16;
        config.pipeline.pace_realtime = false;
        config
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    fn click_track(path: &Path, sample_rate: u32, bpm: f64, seconds: f64) -> usize {
        let total = (f64::from(sample_rate) * seconds) as usize;
        let period = (f64::from(sample_rate) * 60.0 / bpm) as usize;
        let samples: Vec<f32> = (0..total)
            .map(|i| if i % period < 32 { 0.9 } else { 0.0 })
            .collect();
        write_wav(path, 1, sample_rate, 16, &samples).unwrap();
        total
    }

    #[test]
    fn callback_frames_reach_ring_and_tracker() {
        let tracker = ProbeTracker::default();
        let blocks = Arc::clone(&tracker.blocks);
        let rate = Arc::clone(&tracker.sample_rate);
        let mut pipeline = PipelineCoordinator::new(test_config(), tracker).unwrap();
        let monitor = pipeline.monitor();

        pipeline
            .start(AudioSource::Callback { sample_rate: 48_000 })
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(rate.load(Ordering::SeqCst), 48_000);

        let producer = pipeline.producer();
        for i in 0..6 {
            let base = i as f32 * 4.0;
            assert!(producer.push(&[base, base + 1.0, base + 2.0, base + 3.0]).unwrap());
        }

        assert!(wait_until(Duration::from_secs(5), || monitor.frames_analysed() == 24));
        assert!(wait_until(Duration::from_secs(5), || monitor.current_tempo() == 6.0));
        assert_eq!(monitor.frames_produced(), 24);

        let window = pipeline.read_waveform_snapshot(32);
        let expected: Vec<f32> = (8..24).map(|i| i as f32).collect();
        assert_eq!(window, expected);

        let received = blocks.lock().unwrap().clone();
        assert_eq!(received.len(), 6);
        assert_eq!(received[5], vec![20.0, 21.0, 22.0, 23.0]);

        pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(pipeline.read_waveform_snapshot(32).is_empty());
        assert!(!producer.push(&[1.0]).unwrap());
    }

    #[test]
    fn stereo_blocks_send_first_channel_to_analysis() {
        let tracker = ProbeTracker::default();
        let blocks = Arc::clone(&tracker.blocks);
        let mut config = test_config();
        config.pipeline.ring_channels = 2;
        let mut pipeline = PipelineCoordinator::new(config, tracker).unwrap();
        pipeline
            .start(AudioSource::Callback { sample_rate: 44_100 })
            .unwrap();

        let producer = pipeline.producer();
        assert!(producer
            .push_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 2)
            .unwrap());
        assert!(producer.push_interleaved(&[], 2).unwrap());
        assert!(producer.push_interleaved(&[0.5], 0).is_err());

        let monitor = pipeline.monitor();
        assert!(wait_until(Duration::from_secs(5), || monitor.frames_analysed() == 3));
        assert_eq!(blocks.lock().unwrap()[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(monitor.waveform_channels(), 2);
        assert_eq!(
            monitor.read_waveform_snapshot(2),
            vec![0.2, -0.2, 0.3, -0.3]
        );
        pipeline.stop().unwrap();
    }

    #[test]
    fn stop_drains_queued_frames_then_joins() {
        let tracker = ProbeTracker {
            delay: Duration::from_millis(5),
            ..Default::default()
        };
        let blocks = Arc::clone(&tracker.blocks);
        let mut pipeline = PipelineCoordinator::new(test_config(), tracker).unwrap();
        pipeline
            .start(AudioSource::Callback { sample_rate: 8_000 })
            .unwrap();

        // Capacity 4 forces the producer through backpressure several times.
        let producer = pipeline.producer();
        for i in 0..20 {
            assert!(producer.push(&[i as f32; 8]).unwrap());
        }
        pipeline.stop().unwrap();

        let processed = blocks.lock().unwrap().len();
        assert_eq!(processed, 20);
        assert_eq!(pipeline.monitor().queue_depth(), 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(blocks.lock().unwrap().len(), processed);
        assert!(pipeline.stop().is_ok());
    }

    #[test]
    fn frames_after_stop_are_never_analysed() {
        let tracker = ProbeTracker::default();
        let blocks = Arc::clone(&tracker.blocks);
        let mut pipeline = PipelineCoordinator::new(test_config(), tracker).unwrap();
        pipeline
            .start(AudioSource::Callback { sample_rate: 8_000 })
            .unwrap();
        let producer = pipeline.producer();

        let feeder = thread::spawn(move || {
            let mut accepted = 0;
            while producer.push(&[1.0; 4]).unwrap() {
                accepted += 1;
            }
            accepted
        });
        thread::sleep(Duration::from_millis(20));
        pipeline.stop().unwrap();
        let accepted = feeder.join().unwrap();

        assert_eq!(blocks.lock().unwrap().len(), accepted);
    }

    #[test]
    fn file_source_produces_a_tempo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicks.wav");
        let frames = click_track(&path, 44_100, 120.0, 6.0);

        let mut config = test_config();
        config.pipeline.queue_capacity = 16;
        let mut pipeline =
            PipelineCoordinator::new(config, OnsetTempoTracker::new(44_100)).unwrap();
        pipeline.start(AudioSource::File(path.clone())).unwrap();

        let monitor = pipeline.monitor();
        assert!(wait_until(Duration::from_secs(20), || {
            pipeline.source_finished() && monitor.frames_analysed() == frames as u64
        }));
        let tempo = pipeline.current_tempo();
        assert!((tempo - 120.0).abs() < 5.0, "tempo was {tempo}");
        assert_eq!(pipeline.read_waveform_snapshot(64).len(), 16);

        pipeline.stop().unwrap();
        assert_eq!(pipeline.source(), Some(&AudioSource::File(path)));
    }

    #[test]
    fn file_source_can_be_resampled_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("low.wav");
        let frames = click_track(&path, 11_025, 120.0, 1.0);

        let tracker = ProbeTracker::default();
        let rate = Arc::clone(&tracker.sample_rate);
        let mut config = test_config();
        config.audio.target_sample_rate = Some(22_050);
        let mut pipeline = PipelineCoordinator::new(config, tracker).unwrap();
        pipeline.start(AudioSource::File(path)).unwrap();

        let monitor = pipeline.monitor();
        assert!(wait_until(Duration::from_secs(10), || {
            pipeline.source_finished() && monitor.frames_analysed() == 2 * frames as u64
        }));
        assert_eq!(rate.load(Ordering::SeqCst), 22_050);
        pipeline.stop().unwrap();
    }

    #[test]
    fn bad_files_leave_the_pipeline_reusable() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline =
            PipelineCoordinator::new(test_config(), ProbeTracker::default()).unwrap();

        let err = pipeline
            .start(AudioSource::File(dir.path().join("missing.wav")))
            .unwrap_err();
        assert!(matches!(err, TempoVizError::Decode(_)));
        assert_eq!(pipeline.state(), PipelineState::Stopped);

        pipeline
            .start(AudioSource::Callback { sample_rate: 8_000 })
            .unwrap();
        let again = pipeline.start(AudioSource::Callback { sample_rate: 8_000 });
        assert!(matches!(
            again,
            Err(TempoVizError::InvalidState {
                state: PipelineState::Running,
                ..
            })
        ));
    }

    #[test]
    fn callback_with_zero_sample_rate_is_rejected() {
        let tracker = ProbeTracker::default();
        let rate = Arc::clone(&tracker.sample_rate);
        let mut pipeline = PipelineCoordinator::new(test_config(), tracker).unwrap();

        let err = pipeline
            .start(AudioSource::Callback { sample_rate: 0 })
            .unwrap_err();
        assert!(matches!(err, TempoVizError::InvalidInput(_)));
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(rate.load(Ordering::SeqCst), 0);
        assert!(pipeline.source().is_none());
    }

    #[test]
    fn reset_switches_sources_and_clears_state() {
        let tracker = ProbeTracker::default();
        let mut pipeline = PipelineCoordinator::new(test_config(), tracker).unwrap();
        pipeline
            .start(AudioSource::Callback { sample_rate: 8_000 })
            .unwrap();
        let monitor = pipeline.monitor();
        pipeline.producer().push(&[0.5; 4]).unwrap();
        assert!(wait_until(Duration::from_secs(5), || monitor.current_tempo() == 1.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("next.wav");
        write_wav(&path, 2, 8_000, 8, &[0.0; 64]).unwrap();
        pipeline.reset(AudioSource::File(path)).unwrap();

        assert_eq!(monitor.state(), PipelineState::Running);
        assert!(wait_until(Duration::from_secs(5), || {
            pipeline.source_finished() && monitor.frames_analysed() == 32
        }));
        assert_eq!(monitor.frames_produced(), 32);
        assert!(monitor
            .read_waveform_snapshot(16)
            .iter()
            .all(|sample| *sample == 0.0));
    }

    #[test]
    fn configured_parameters_are_forwarded() {
        let mut config = test_config();
        config.tracker.insert("max_tempo".into(), 180.0);
        let pipeline = PipelineCoordinator::new(config, OnsetTempoTracker::new(44_100)).unwrap();

        pipeline.set_parameter("onset_threshold", 2.0).unwrap();
        assert!(pipeline.set_parameter("tempo_gain", 1.0).is_err());
        assert!(pipeline.parameter_names().unwrap().contains(&"max_tempo"));

        let mut bad = test_config();
        bad.tracker.insert("nonsense".into(), 1.0);
        assert!(matches!(
            PipelineCoordinator::new(bad, OnsetTempoTracker::new(44_100)),
            Err(TempoVizError::UnknownParameter(_))
        ));
    }

    #[test]
    fn dropping_a_running_pipeline_joins_its_threads() {
        let tracker = ProbeTracker::default();
        let blocks = Arc::clone(&tracker.blocks);
        let mut pipeline = PipelineCoordinator::new(test_config(), tracker).unwrap();
        pipeline
            .start(AudioSource::Callback { sample_rate: 8_000 })
            .unwrap();
        let producer = pipeline.producer();
        producer.push(&[0.25; 4]).unwrap();
        drop(pipeline);

        assert_eq!(blocks.lock().unwrap().len(), 1);
        assert!(!producer.push(&[0.25; 4]).unwrap());
    }
}
