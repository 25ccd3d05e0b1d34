//! Element models for circuit simulation.
//!
//! This module provides models for all supported elements:
//! - Linear: Resistor, Capacitor, Inductor
//! - Sources: Voltage Source, Current Source (DC, sine, pulse, external)
//! - Controlled: VCVS, VCCS, CCVS, CCCS
//! - Controls: voltage-controlled Switch
//!
//! An [`Element`] carries the attributes every kind shares (terminals and
//! the optional auxiliary-unknown slot) plus an [`ElementKind`] payload.
//! Stamping into the MNA system lives in [`crate::solver`].

mod controlled;
mod controls;
mod linear;
mod sources;
mod waveform;

pub use controlled::{Cccs, Ccvs, Vccs, Vcvs};
pub use controls::Switch;
pub use linear::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, VoltageSource};
pub use waveform::{ExternalSignal, Pulse, Sine, Source};

use crate::circuit::NodeId;

/// Per-kind payload of an element.
#[derive(Debug, Clone)]
pub enum ElementKind {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    CurrentSource(CurrentSource),
    VoltageSource(VoltageSource),
    Vcvs(Vcvs),
    Vccs(Vccs),
    Ccvs(Ccvs),
    Cccs(Cccs),
    Switch(Switch),
}

impl ElementKind {
    /// Display name of the element kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Resistor(_) => "Resistor",
            ElementKind::Capacitor(_) => "Capacitor",
            ElementKind::Inductor(_) => "Inductor",
            ElementKind::CurrentSource(_) => "Current source",
            ElementKind::VoltageSource(_) => "Voltage source",
            ElementKind::Vcvs(_) => "VCVS",
            ElementKind::Vccs(_) => "VCCS",
            ElementKind::Ccvs(_) => "CCVS",
            ElementKind::Cccs(_) => "CCCS",
            ElementKind::Switch(_) => "Switch",
        }
    }

    /// Whether the element owns an auxiliary (branch current) unknown.
    pub fn requires_aux(&self) -> bool {
        matches!(
            self,
            ElementKind::VoltageSource(_)
                | ElementKind::Inductor(_)
                | ElementKind::Vcvs(_)
                | ElementKind::Ccvs(_)
        )
    }

    /// Whether the element couples its own two terminals in the matrix.
    ///
    /// Current injections (I, VCCS, CCCS) only touch the RHS or foreign
    /// columns and give no path between their terminals.
    pub fn connects_terminals(&self) -> bool {
        !matches!(
            self,
            ElementKind::CurrentSource(_) | ElementKind::Vccs(_) | ElementKind::Cccs(_)
        )
    }

    /// Nominal value: resistance, capacitance, inductance, gain, or on-resistance.
    pub fn nominal(&self) -> f64 {
        match self {
            ElementKind::Resistor(r) => r.resistance,
            ElementKind::Capacitor(c) => c.capacitance,
            ElementKind::Inductor(l) => l.inductance,
            ElementKind::CurrentSource(i) => i.source.eval(0.0),
            ElementKind::VoltageSource(v) => v.source.eval(0.0),
            ElementKind::Vcvs(e) => e.gain,
            ElementKind::Vccs(g) => g.transconductance,
            ElementKind::Ccvs(h) => h.transresistance,
            ElementKind::Cccs(f) => f.gain,
            ElementKind::Switch(s) => s.ron,
        }
    }

    /// The offending value if the element parameters are physically invalid.
    pub fn invalid_value(&self) -> Option<f64> {
        let value = match self {
            ElementKind::Resistor(r) => r.resistance,
            ElementKind::Capacitor(c) => c.capacitance,
            ElementKind::Inductor(l) => l.inductance,
            ElementKind::Switch(s) => s.ron,
            _ => return None,
        };
        if value > 0.0 && value.is_finite() {
            None
        } else {
            Some(value)
        }
    }
}

/// A circuit element.
#[derive(Debug, Clone)]
pub struct Element {
    /// Terminals [a, b]; node 0 is ground
    pub nodes: [NodeId; 2],
    /// Slot of the auxiliary unknown, assigned by the circuit
    pub aux: Option<usize>,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(nodes: [NodeId; 2], kind: ElementKind) -> Self {
        Self {
            nodes,
            aux: None,
            kind,
        }
    }

    /// Matrix rows of the two terminals (`None` for ground).
    pub fn rows(&self) -> (Option<usize>, Option<usize>) {
        (self.nodes[0].row(), self.nodes[1].row())
    }

    /// Excitation descriptor of an independent source.
    pub fn source(&self) -> Option<&Source> {
        match &self.kind {
            ElementKind::VoltageSource(v) => Some(&v.source),
            ElementKind::CurrentSource(i) => Some(&i.source),
            _ => None,
        }
    }

    /// Mutable excitation descriptor of an independent source.
    pub fn source_mut(&mut self) -> Option<&mut Source> {
        match &mut self.kind {
            ElementKind::VoltageSource(v) => Some(&mut v.source),
            ElementKind::CurrentSource(i) => Some(&mut i.source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aux_requirement() {
        let v = ElementKind::VoltageSource(VoltageSource::new(Source::Dc(1.0)));
        let r = ElementKind::Resistor(Resistor::new(1.0));
        let l = ElementKind::Inductor(Inductor::new(1e-3));
        let g = ElementKind::Vccs(Vccs {
            control: [NodeId(1), NodeId(0)],
            transconductance: 1.0,
        });
        assert!(v.requires_aux());
        assert!(l.requires_aux());
        assert!(!r.requires_aux());
        assert!(!g.requires_aux());
        assert!(!g.connects_terminals());
    }

    #[test]
    fn test_invalid_value() {
        assert_eq!(ElementKind::Resistor(Resistor::new(0.0)).invalid_value(), Some(0.0));
        assert_eq!(ElementKind::Capacitor(Capacitor::new(-1.0)).invalid_value(), Some(-1.0));
        assert_eq!(ElementKind::Inductor(Inductor::new(1e-3)).invalid_value(), None);
        assert_eq!(
            ElementKind::CurrentSource(CurrentSource::new(Source::Dc(-5.0))).invalid_value(),
            None
        );
    }

    #[test]
    fn test_source_access() {
        let mut e = Element::new(
            [NodeId(1), NodeId(0)],
            ElementKind::VoltageSource(VoltageSource::new(Source::Dc(2.0))),
        );
        assert_eq!(e.source().map(|s| s.eval(0.0)), Some(2.0));
        *e.source_mut().unwrap() = Source::Dc(3.0);
        assert_eq!(e.source().map(|s| s.eval(0.0)), Some(3.0));

        let r = Element::new([NodeId(1), NodeId(0)], ElementKind::Resistor(Resistor::new(1.0)));
        assert!(r.source().is_none());
    }
}
