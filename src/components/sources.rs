//! Independent voltage and current sources.

use super::waveform::Source;

/// A voltage source.
///
/// Voltage sources require an auxiliary unknown for the branch current.
/// The source enforces: V(a) - V(b) = source(t)
#[derive(Debug, Clone, Default)]
pub struct VoltageSource {
    pub source: Source,
}

impl VoltageSource {
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    /// Get the source voltage at time `t`.
    pub fn voltage(&self, t: f64) -> f64 {
        self.source.eval(t)
    }
}

/// A current source.
///
/// Current sources add directly to the RHS vector. The evaluated current
/// is drawn out of node `a` and delivered into node `b` through the source.
#[derive(Debug, Clone, Default)]
pub struct CurrentSource {
    pub source: Source,
}

impl CurrentSource {
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    /// Get the source current at time `t`.
    pub fn current(&self, t: f64) -> f64 {
        self.source.eval(t)
    }
}
