//! Excitation waveforms for independent sources.
//!
//! A [`Source`] is evaluated as a function of simulation time. The
//! [`Source::External`] variant instead samples a live [`ExternalSignal`]
//! written by an independent acquisition path (ADC reader, stdin frames).

use std::f64::consts::PI;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A live scalar shared between the sampling path and the engine.
///
/// Reads and writes are single relaxed atomic operations on the `f64` bit
/// pattern. There is no ordering with respect to the simulation step: the
/// engine sees whichever sample was stored last.
#[derive(Clone, Default)]
pub struct ExternalSignal(Arc<AtomicU64>);

impl ExternalSignal {
    /// Create a signal holding `initial`.
    pub fn new(initial: f64) -> Self {
        Self(Arc::new(AtomicU64::new(initial.to_bits())))
    }

    /// Store a new sample.
    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Load the most recent sample.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for ExternalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExternalSignal").field(&self.get()).finish()
    }
}

/// Sinusoid `offset + amplitude * sin(2*pi*frequency*t + phase)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sine {
    pub offset: f64,
    pub amplitude: f64,
    /// Frequency in Hz
    pub frequency: f64,
    /// Phase in radians
    pub phase: f64,
}

/// Trapezoidal pulse train.
///
/// ```text
///        ___width___
///  v2   /           \
///      / rise   fall \
///  v1 /               \______ ... repeats every `period`
///  |<-delay->|
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pulse {
    pub v1: f64,
    pub v2: f64,
    pub delay: f64,
    pub rise: f64,
    pub width: f64,
    pub fall: f64,
    pub period: f64,
}

/// An excitation descriptor.
#[derive(Debug, Clone)]
pub enum Source {
    /// Constant value
    Dc(f64),
    /// Sinusoid
    Sine(Sine),
    /// Pulse train
    Pulse(Pulse),
    /// Live sample scaled as `sample * gain + offset`
    External {
        signal: ExternalSignal,
        gain: f64,
        offset: f64,
    },
}

impl Default for Source {
    fn default() -> Self {
        Source::Dc(0.0)
    }
}

impl Source {
    /// Evaluate the source at simulation time `t`.
    pub fn eval(&self, t: f64) -> f64 {
        match self {
            Source::Dc(value) => *value,
            Source::Sine(s) => s.eval(t),
            Source::Pulse(p) => p.eval(t),
            Source::External {
                signal,
                gain,
                offset,
            } => signal.get() * gain + offset,
        }
    }
}

impl Sine {
    pub fn eval(&self, t: f64) -> f64 {
        let omega = 2.0 * PI * self.frequency;
        self.offset + self.amplitude * (omega * t + self.phase).sin()
    }
}

impl Pulse {
    pub fn eval(&self, t: f64) -> f64 {
        if t < self.delay || self.period <= 0.0 {
            return self.v1;
        }

        let tt = (t - self.delay) % self.period;

        if tt < self.rise {
            let k = tt / self.rise;
            return self.v1 + (self.v2 - self.v1) * k;
        }

        if tt < self.rise + self.width {
            return self.v2;
        }

        if tt < self.rise + self.width + self.fall {
            let k = ((tt - (self.rise + self.width)) / self.fall).min(1.0);
            return self.v2 + (self.v1 - self.v2) * k;
        }

        self.v1
    }
}
