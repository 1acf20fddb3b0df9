//! Core library for the tempo visualiser.
//!
//! Audio enters through a WAV decoder or an external device callback and is
//! fanned out twice: once into a fixed-size ring that the UI samples for its
//! waveform, and once into a bounded queue drained by a tempo tracking
//! worker. Each module owns one piece of that path; [`PipelineCoordinator`]
//! wires them together and owns the threads.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod ring;
pub mod tracker;
pub mod wave;

pub use config::{AppConfig, AudioConfig, PipelineConfig};
pub use error::{Result, TempoVizError};
pub use pipeline::{
    AudioSource, FrameProducer, PipelineCoordinator, PipelineMonitor, PipelineState, TempoCell,
};
pub use queue::{AudioFrame, BoundedFrameQueue, QueueState};
pub use ring::RingSampleBuffer;
pub use tracker::{
    parse_assignment, OnsetSettings, OnsetTempoTracker, ParameterRegistry, TempoTracker,
};
pub use wave::{DecodeError, ReadStatus, Wave, WaveHeader, WaveRead};
