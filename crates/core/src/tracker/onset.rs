use std::{collections::VecDeque, f32::consts::PI, fmt, sync::Arc, sync::OnceLock};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use tracing::{trace, warn};

use super::{ParameterRegistry, TempoTracker};
use crate::Result;

const WINDOW_SIZE: usize = 1024;
const HOP_SIZE: usize = 512;
const FLUX_HISTORY: usize = 43;
const PEAK_DECAY: f32 = 0.999;

/// Tunables of [`OnsetTempoTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetSettings {
    /// Scale each window by the inverse of the recent peak amplitude.
    pub use_amplitude_normalization: bool,
    /// Flux must exceed this multiple of the recent mean flux.
    pub onset_threshold: f64,
    /// Absolute flux floor below which no onset is reported.
    pub onset_threshold_min: f64,
    pub min_tempo: f64,
    pub max_tempo: f64,
    /// Inter-onset intervals kept for the median tempo estimate.
    pub num_tempo_candidates: usize,
}

impl Default for OnsetSettings {
    fn default() -> Self {
        Self {
            use_amplitude_normalization: false,
            onset_threshold: 1.5,
            onset_threshold_min: 0.01,
            min_tempo: 50.0,
            max_tempo: 200.0,
            num_tempo_candidates: 8,
        }
    }
}

/// Spectral-flux onset detector with an inter-onset-interval tempo estimate.
///
/// Samples are gathered into Hann-windowed 1024-sample windows advanced by
/// 512 samples, independent of the block sizes passed to `process`. An onset
/// is a flux value above both the adaptive and the absolute threshold that
/// arrives at least half a beat (at `max_tempo`) after the previous one. The
/// tempo is the median of the recent inter-onset intervals, folded by
/// octaves into `[min_tempo, max_tempo]`.
pub struct OnsetTempoTracker {
    sample_rate: u32,
    settings: OnsetSettings,
    pending: Vec<f32>,
    windows_analysed: u64,
    previous_magnitudes: Vec<f32>,
    flux_history: VecDeque<f32>,
    last_onset: Option<f64>,
    intervals: VecDeque<f64>,
    tempo_bpm: f64,
    peak: f32,
    fft: FftResources,
}

impl OnsetTempoTracker {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_settings(sample_rate, OnsetSettings::default())
    }

    pub fn with_settings(sample_rate: u32, settings: OnsetSettings) -> Self {
        let fft = FftResources::new(WINDOW_SIZE);
        Self {
            sample_rate: sample_rate.max(1),
            settings,
            pending: Vec::with_capacity(WINDOW_SIZE * 2),
            windows_analysed: 0,
            previous_magnitudes: vec![0.0; fft.spectrum.len()],
            flux_history: VecDeque::with_capacity(FLUX_HISTORY),
            last_onset: None,
            intervals: VecDeque::new(),
            tempo_bpm: 0.0,
            peak: 0.0,
            fft,
        }
    }

    pub fn settings(&self) -> &OnsetSettings {
        &self.settings
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn registry() -> &'static ParameterRegistry<OnsetTempoTracker> {
        static REGISTRY: OnceLock<ParameterRegistry<OnsetTempoTracker>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            ParameterRegistry::<OnsetTempoTracker>::new()
                .int("use_amplitude_normalization", |t, v| {
                    t.settings.use_amplitude_normalization = v != 0
                })
                .float("onset_threshold", |t, v| t.settings.onset_threshold = v.max(0.0))
                .float("onset_threshold_min", |t, v| {
                    t.settings.onset_threshold_min = v.max(0.0)
                })
                .float("min_tempo", |t, v| t.settings.min_tempo = v.max(1.0))
                .float("max_tempo", |t, v| t.settings.max_tempo = v.max(1.0))
                .int("num_tempo_candidates", |t, v| {
                    t.settings.num_tempo_candidates = v.clamp(1, 256) as usize;
                    let keep = t.settings.num_tempo_candidates;
                    while t.intervals.len() > keep {
                        t.intervals.pop_front();
                    }
                })
        })
    }

    fn analyse_window(&mut self) {
        let window = &self.pending[..WINDOW_SIZE];
        let gain = if self.settings.use_amplitude_normalization {
            let loudest = window.iter().fold(0.0_f32, |max, s| max.max(s.abs()));
            self.peak = (self.peak * PEAK_DECAY).max(loudest);
            if self.peak > f32::EPSILON {
                1.0 / self.peak
            } else {
                1.0
            }
        } else {
            1.0
        };

        for (index, (slot, sample)) in self.fft.input.iter_mut().zip(window).enumerate() {
            *slot = sample * gain * hann_value(index, WINDOW_SIZE);
        }
        if let Err(err) = self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        ) {
            warn!(%err, "fft failed, skipping window");
            return;
        }

        let mut flux = 0.0;
        for (bin, previous) in self.fft.spectrum.iter().zip(&mut self.previous_magnitudes) {
            let magnitude = bin.norm();
            flux += (magnitude - *previous).max(0.0);
            *previous = magnitude;
        }
        let flux = flux / self.previous_magnitudes.len() as f32;

        let mean = if self.flux_history.is_empty() {
            0.0
        } else {
            self.flux_history.iter().sum::<f32>() / self.flux_history.len() as f32
        };
        if self.flux_history.len() == FLUX_HISTORY {
            self.flux_history.pop_front();
        }
        self.flux_history.push_back(flux);

        let time = self.windows_analysed as f64 * HOP_SIZE as f64 / f64::from(self.sample_rate);
        self.windows_analysed += 1;

        let flux = f64::from(flux);
        let is_onset = flux > self.settings.onset_threshold_min
            && flux > self.settings.onset_threshold * f64::from(mean);
        if is_onset {
            self.register_onset(time);
        }
    }

    fn register_onset(&mut self, time: f64) {
        let refractory = 0.5 * 60.0 / self.settings.max_tempo;
        let longest = 2.0 * 60.0 / self.settings.min_tempo;

        match self.last_onset {
            Some(last) if time - last < refractory => return,
            Some(last) if time - last <= longest => {
                self.intervals.push_back(time - last);
                while self.intervals.len() > self.settings.num_tempo_candidates {
                    self.intervals.pop_front();
                }
                self.update_tempo();
            }
            _ => {}
        }
        trace!(time, "onset");
        self.last_onset = Some(time);
    }

    fn update_tempo(&mut self) {
        let mut sorted: Vec<f64> = self.intervals.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let median = sorted[sorted.len() / 2];
        if median > 0.0 {
            self.tempo_bpm = fold_into_range(
                60.0 / median,
                self.settings.min_tempo,
                self.settings.max_tempo,
            );
        }
    }
}

impl TempoTracker for OnsetTempoTracker {
    fn process(&mut self, samples: &[f32]) {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= WINDOW_SIZE {
            self.analyse_window();
            self.pending.drain(..HOP_SIZE);
        }
    }

    fn tempo_bpm(&self) -> f64 {
        self.tempo_bpm
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        Self::registry().apply(self, name, value)
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        Self::registry().names()
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.windows_analysed = 0;
        self.previous_magnitudes.fill(0.0);
        self.flux_history.clear();
        self.last_onset = None;
        self.intervals.clear();
        self.tempo_bpm = 0.0;
        self.peak = 0.0;
    }
}

impl fmt::Debug for OnsetTempoTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnsetTempoTracker")
            .field("sample_rate", &self.sample_rate)
            .field("settings", &self.settings)
            .field("pending", &self.pending.len())
            .field("windows_analysed", &self.windows_analysed)
            .field("intervals", &self.intervals.len())
            .field("tempo_bpm", &self.tempo_bpm)
            .finish()
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(size: usize) -> Self {
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(size);
        Self {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

/// Doubles or halves `bpm` until it lies within `[min, max]`, as far as the
/// range allows.
fn fold_into_range(mut bpm: f64, min: f64, max: f64) -> f64 {
    while bpm > max && bpm / 2.0 >= min {
        bpm /= 2.0;
    }
    while bpm < min && bpm * 2.0 <= max {
        bpm *= 2.0;
    }
    bpm
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TempoVizError;

    fn click_train(sample_rate: u32, bpm: f64, seconds: f64) -> Vec<f32> {
        let total = (f64::from(sample_rate) * seconds) as usize;
        let period = (f64::from(sample_rate) * 60.0 / bpm) as usize;
        (0..total)
            .map(|i| if i % period < 32 { 0.9 } else { 0.0 })
            .collect()
    }

    #[test]
    fn silence_has_no_tempo() {
        let mut tracker = OnsetTempoTracker::new(44_100);
        tracker.process(&vec![0.0; 44_100]);
        assert_eq!(tracker.tempo_bpm(), 0.0);
    }

    #[test]
    fn detects_tempo_of_a_click_train() {
        let mut tracker = OnsetTempoTracker::new(44_100);
        let clicks = click_train(44_100, 120.0, 6.0);
        for block in clicks.chunks(300) {
            tracker.process(block);
        }

        let tempo = tracker.tempo_bpm();
        assert!((tempo - 120.0).abs() < 5.0, "tempo was {tempo}");
    }

    #[test]
    fn normalisation_handles_quiet_input() {
        let mut tracker = OnsetTempoTracker::new(22_050);
        tracker.set_parameter("use_amplitude_normalization", 1.0).unwrap();
        let quiet: Vec<f32> = click_train(22_050, 100.0, 8.0)
            .into_iter()
            .map(|s| s * 0.01)
            .collect();
        tracker.process(&quiet);

        let tempo = tracker.tempo_bpm();
        assert!((tempo - 100.0).abs() < 6.0, "tempo was {tempo}");
    }

    #[test]
    fn reset_forgets_the_estimate() {
        let mut tracker = OnsetTempoTracker::new(44_100);
        tracker.process(&click_train(44_100, 120.0, 4.0));
        assert!(tracker.tempo_bpm() > 0.0);

        tracker.reset();
        assert_eq!(tracker.tempo_bpm(), 0.0);
    }

    #[test]
    fn parameters_are_set_by_name() {
        let mut tracker = OnsetTempoTracker::new(44_100);
        tracker.set_parameter("min_tempo", 90.0).unwrap();
        tracker.set_parameter("num_tempo_candidates", 4.8).unwrap();

        assert_eq!(tracker.settings().min_tempo, 90.0);
        assert_eq!(tracker.settings().num_tempo_candidates, 4);
        assert!(tracker.parameter_names().contains(&"onset_threshold_min"));
        assert!(matches!(
            tracker.set_parameter("spectral_compression_gamma", 1.0),
            Err(TempoVizError::UnknownParameter(_))
        ));
    }

    #[test]
    fn folds_tempo_by_octaves() {
        assert_eq!(fold_into_range(60.0, 90.0, 200.0), 120.0);
        assert_eq!(fold_into_range(300.0, 50.0, 200.0), 150.0);
        assert_eq!(fold_into_range(150.0, 140.0, 160.0), 150.0);
    }
}
