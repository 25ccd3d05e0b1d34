//! Signal conditioning: engine read-back to actuation codes.
//!
//! Every transform is `clamp(raw * gain + offset, 0, 1)` scaled onto an
//! integer range (PWM compare value or DAC code). They are pure functions.

use crate::circuit::ElementId;
use crate::components::ElementKind;
use crate::solver::Simulator;

/// Clamp a normalized value to [0, 1] and scale it to `0..=pwm_max`.
pub fn value_to_duty(normalized: f64, pwm_max: u16) -> u16 {
    // NaN saturates to 0 in the cast
    (normalized.clamp(0.0, 1.0) * f64::from(pwm_max)) as u16
}

/// Map a raw signal to a PWM duty code.
pub fn signal_to_pwm(value: f64, gain: f64, offset: f64, pwm_max: u16) -> u16 {
    value_to_duty(value * gain + offset, pwm_max)
}

/// Map a raw signal to a DAC code.
pub fn signal_to_dac(value: f64, gain: f64, offset: f64, dac_max: u16) -> u16 {
    value_to_duty(value * gain + offset, dac_max)
}

/// Linear map from an engine quantity to an actuation code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationMap {
    pub gain: f64,
    pub offset: f64,
    /// Code emitted for a normalized value of 1
    pub full_scale: u16,
}

impl ActuationMap {
    pub fn new(gain: f64, offset: f64, full_scale: u16) -> Self {
        Self {
            gain,
            offset,
            full_scale,
        }
    }

    pub fn apply(&self, raw: f64) -> u16 {
        signal_to_pwm(raw, self.gain, self.offset, self.full_scale)
    }
}

/// Engine quantity read by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    /// Voltage of a node
    Voltage(usize),
    /// Current through an element
    Current(ElementId),
}

impl ProbeTarget {
    /// Read the quantity from the last committed step.
    ///
    /// Resistor and capacitor currents are derived from node voltages;
    /// branch-constrained elements report their aux current.
    pub fn read(&self, sim: &Simulator) -> f64 {
        match *self {
            ProbeTarget::Voltage(node) => sim.node_voltage(node),
            ProbeTarget::Current(id) => match sim.circuit().element(id).map(|e| &e.kind) {
                Some(ElementKind::Resistor(_)) => sim.resistor_current(id),
                Some(ElementKind::Capacitor(_)) => sim.capacitor_current(id),
                _ => sim.element_current(id),
            },
        }
    }
}

/// An actuation output: what to read and how to scale it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub target: ProbeTarget,
    pub map: ActuationMap,
}

impl Probe {
    pub fn new(target: ProbeTarget, map: ActuationMap) -> Self {
        Self { target, map }
    }

    /// Actuation code for the current engine state.
    pub fn sample(&self, sim: &Simulator) -> u16 {
        self.map.apply(self.target.read(sim))
    }
}
