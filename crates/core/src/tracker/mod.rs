//! Seam between the pipeline and the beat/tempo tracking algorithm.
//!
//! The analysis worker only needs two calls from a tracker: feed it a block
//! of mono samples and ask for the current tempo. Tunable parameters are
//! exposed by name through a [`ParameterRegistry`] so front-ends can forward
//! `name=value` pairs without knowing the tracker's concrete type.

mod onset;

use std::fmt;

use crate::{Result, TempoVizError};

pub use onset::{OnsetSettings, OnsetTempoTracker};

/// A streaming tempo estimator driven by the analysis worker.
pub trait TempoTracker: Send {
    /// Consumes the next block of mono samples.
    fn process(&mut self, samples: &[f32]);

    /// Latest tempo estimate in beats per minute, `0.0` when unknown.
    fn tempo_bpm(&self) -> f64;

    /// Updates a named tuning parameter.
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let _ = value;
        Err(TempoVizError::UnknownParameter(name.to_string()))
    }

    /// Names accepted by [`TempoTracker::set_parameter`].
    fn parameter_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Informs the tracker of the rate of the samples it is about to receive.
    fn set_sample_rate(&mut self, sample_rate: u32) {
        let _ = sample_rate;
    }

    /// Forgets all accumulated state, keeping parameters.
    fn reset(&mut self) {}
}

/// Numeric type a parameter setter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Int,
    Float,
}

/// Typed setter for a single tracker parameter.
pub enum Setter<T> {
    Int(fn(&mut T, i64)),
    Float(fn(&mut T, f64)),
}

impl<T> Setter<T> {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Setter::Int(_) => ParameterKind::Int,
            Setter::Float(_) => ParameterKind::Float,
        }
    }
}

pub struct Parameter<T> {
    pub name: &'static str,
    pub setter: Setter<T>,
}

impl<T> fmt::Debug for Parameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.setter.kind())
            .finish()
    }
}

/// Ordered table mapping parameter names to typed setters on `T`.
pub struct ParameterRegistry<T> {
    parameters: Vec<Parameter<T>>,
}

impl<T> ParameterRegistry<T> {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    /// Registers a parameter whose value is truncated to an integer.
    pub fn int(mut self, name: &'static str, setter: fn(&mut T, i64)) -> Self {
        self.parameters.push(Parameter {
            name,
            setter: Setter::Int(setter),
        });
        self
    }

    pub fn float(mut self, name: &'static str, setter: fn(&mut T, f64)) -> Self {
        self.parameters.push(Parameter {
            name,
            setter: Setter::Float(setter),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Parameter<T>> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parameters.iter().map(|parameter| parameter.name).collect()
    }

    /// Looks `name` up and calls its setter, converting `value` to an
    /// integer (toward zero) for integer parameters.
    pub fn apply(&self, target: &mut T, name: &str, value: f64) -> Result<()> {
        let parameter = self
            .get(name)
            .ok_or_else(|| TempoVizError::UnknownParameter(name.to_string()))?;
        if !value.is_finite() {
            return Err(TempoVizError::InvalidInput(
                "parameter values must be finite",
            ));
        }
        match parameter.setter {
            Setter::Int(set) => set(target, value.trunc() as i64),
            Setter::Float(set) => set(target, value),
        }
        Ok(())
    }
}

impl<T> Default for ParameterRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ParameterRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.parameters).finish()
    }
}

/// Splits a `name=value` assignment as given on the command line.
pub fn parse_assignment(input: &str) -> Result<(String, f64)> {
    let (name, value) = input
        .split_once('=')
        .ok_or(TempoVizError::InvalidInput("expected `name=value`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(TempoVizError::InvalidInput("parameter name is empty"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| TempoVizError::InvalidInput("parameter value is not a number"))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Knobs {
        count: i64,
        gain: f64,
    }

    fn registry() -> ParameterRegistry<Knobs> {
        ParameterRegistry::<Knobs>::new()
            .int("count", |knobs, value| knobs.count = value)
            .float("gain", |knobs, value| knobs.gain = value)
    }

    #[test]
    fn applies_typed_setters() {
        let registry = registry();
        let mut knobs = Knobs::default();

        registry.apply(&mut knobs, "count", 3.9).unwrap();
        registry.apply(&mut knobs, "gain", 0.75).unwrap();

        assert_eq!(knobs.count, 3);
        assert_eq!(knobs.gain, 0.75);
        assert_eq!(registry.get("count").unwrap().setter.kind(), ParameterKind::Int);
        assert_eq!(registry.names(), vec!["count", "gain"]);
    }

    #[test]
    fn rejects_unknown_names_and_non_finite_values() {
        let registry = registry();
        let mut knobs = Knobs::default();

        assert!(matches!(
            registry.apply(&mut knobs, "volume", 1.0),
            Err(TempoVizError::UnknownParameter(name)) if name == "volume"
        ));
        assert!(registry.apply(&mut knobs, "gain", f64::NAN).is_err());
        assert_eq!(knobs.gain, 0.0);
    }

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse_assignment(" min_tempo = 80.5 ").unwrap(),
            ("min_tempo".to_string(), 80.5)
        );
        assert!(parse_assignment("min_tempo").is_err());
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("min_tempo=fast").is_err());
    }
}
