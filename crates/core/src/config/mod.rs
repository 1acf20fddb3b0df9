use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, TempoVizError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub pipeline: PipelineConfig,
    /// Tracker parameter overrides applied by name before the pipeline starts.
    pub tracker: BTreeMap<String, f64>,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.pipeline.validate()
    }
}

/// Configuration specific to the audio source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Nominal rate used to pace callback-driven sources and the tracker.
    pub sample_rate: u32,
    /// Frames read from a file per produced block.
    pub block_size: usize,
    /// Resample file sources to this rate before staging them.
    pub target_sample_rate: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            block_size: 512,
            target_sample_rate: None,
        }
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(TempoVizError::InvalidInput("sample rate must be positive"));
        }
        if self.block_size == 0 {
            return Err(TempoVizError::InvalidInput("block size must be positive"));
        }
        if self.target_sample_rate == Some(0) {
            return Err(TempoVizError::InvalidInput(
                "target sample rate must be positive",
            ));
        }
        Ok(())
    }
}

/// Sizing of the staging buffers between producer, analysis and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Slots in the analysis queue; at most `queue_capacity - 1` frames wait at once.
    pub queue_capacity: usize,
    /// Sample frames retained for the waveform display.
    pub ring_capacity: usize,
    /// Channels stored per ring frame. `1` keeps only the first channel.
    pub ring_channels: usize,
    /// Sleep for each block's real-time duration when producing from a file.
    pub pace_realtime: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            ring_capacity: 44_100 * 2,
            ring_channels: 1,
            pace_realtime: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity < 2 {
            return Err(TempoVizError::InvalidInput(
                "queue capacity must be at least 2",
            ));
        }
        if self.ring_capacity == 0 {
            return Err(TempoVizError::InvalidInput("ring capacity must be positive"));
        }
        if self.ring_channels == 0 {
            return Err(TempoVizError::InvalidInput(
                "ring channel count must be positive",
            ));
        }
        Ok(())
    }
}
