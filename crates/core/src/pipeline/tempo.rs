use std::sync::atomic::{AtomicU64, Ordering};

/// Single-writer `f64` cell shared between the analysis worker and the UI.
#[derive(Debug, Default)]
pub struct TempoCell(AtomicU64);

impl TempoCell {
    pub fn new(bpm: f64) -> Self {
        Self(AtomicU64::new(bpm.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, bpm: f64) {
        self.0.store(bpm.to_bits(), Ordering::Relaxed);
    }

    /// Stores `bpm` only if it differs from the current value. Returns
    /// whether a store happened.
    pub fn update(&self, bpm: f64) -> bool {
        if self.load() == bpm {
            return false;
        }
        self.store(bpm);
        true
    }
}
