//! Circuit topology and the build-phase API.

use std::fmt;

use heapless::Vec as FixedVec;
use log::{debug, warn};

use super::types::{ElementId, NodeId, SeriesRl, MAX_ELEMENTS, MAX_NODES, MAX_SYSTEM_SIZE};
use crate::components::{
    Capacitor, Cccs, Ccvs, CurrentSource, Element, ElementKind, ExternalSignal, Inductor, Pulse,
    Resistor, Sine, Source, Switch, Vccs, Vcvs, VoltageSource,
};
use crate::error::{HilError, Result};

/// A circuit ready for simulation.
///
/// The node count and time step are fixed at construction. Elements are
/// appended during the build phase and never removed; their storage is a
/// fixed-capacity table so nothing grows once the circuit is built.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Number of non-ground nodes
    num_nodes: usize,
    /// Fixed time step in seconds
    dt: f64,
    /// Elements in declaration order
    elements: FixedVec<Element, MAX_ELEMENTS>,
    /// Number of auxiliary unknowns currently assigned
    num_aux: usize,
}

impl Circuit {
    /// Create an empty circuit with `nodes` non-ground nodes and time step `dt`.
    ///
    /// A node count of zero is raised to one.
    pub fn new(nodes: usize, dt: f64) -> Result<Self> {
        if nodes > MAX_NODES {
            return Err(HilError::CapacityExceeded {
                table: "node",
                capacity: MAX_NODES,
            });
        }
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(HilError::InvalidTimeStep { dt });
        }

        Ok(Self {
            num_nodes: nodes.max(1),
            dt,
            elements: FixedVec::new(),
            num_aux: 0,
        })
    }

    /// Number of non-ground nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Fixed time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of auxiliary unknowns.
    pub fn num_aux(&self) -> usize {
        self.num_aux
    }

    /// Effective dimension of the linear system.
    pub fn system_size(&self) -> usize {
        (self.num_nodes + self.num_aux).min(MAX_SYSTEM_SIZE)
    }

    /// All elements in declaration order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// Get an element by index.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    /// Number of declared elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    // ============ Builders ============

    pub fn add_resistor(&mut self, a: usize, b: usize, resistance: f64) -> Result<ElementId> {
        self.push(a, b, ElementKind::Resistor(Resistor::new(resistance)))
    }

    pub fn add_capacitor(&mut self, a: usize, b: usize, capacitance: f64) -> Result<ElementId> {
        self.push(a, b, ElementKind::Capacitor(Capacitor::new(capacitance)))
    }

    pub fn add_inductor(&mut self, a: usize, b: usize, inductance: f64) -> Result<ElementId> {
        self.push(a, b, ElementKind::Inductor(Inductor::new(inductance)))
    }

    /// Add a DC current source carrying `dc_value` through itself from `a` to `b`.
    pub fn add_current_source(&mut self, a: usize, b: usize, dc_value: f64) -> Result<ElementId> {
        self.push(
            a,
            b,
            ElementKind::CurrentSource(CurrentSource::new(Source::Dc(dc_value))),
        )
    }

    /// Add a DC voltage source enforcing V(a) - V(b) = `dc_value`.
    pub fn add_voltage_source(&mut self, a: usize, b: usize, dc_value: f64) -> Result<ElementId> {
        self.push(
            a,
            b,
            ElementKind::VoltageSource(VoltageSource::new(Source::Dc(dc_value))),
        )
    }

    /// Add a sinusoidal voltage source.
    pub fn add_sine_source(
        &mut self,
        a: usize,
        b: usize,
        amplitude: f64,
        offset: f64,
        frequency: f64,
        phase: f64,
    ) -> Result<ElementId> {
        let sine = Sine {
            offset,
            amplitude,
            frequency,
            phase,
        };
        self.push(
            a,
            b,
            ElementKind::VoltageSource(VoltageSource::new(Source::Sine(sine))),
        )
    }

    /// Add a VCCS carrying `gm * (V(c1) - V(c2))` through itself from `a` to `b`.
    pub fn add_vccs(&mut self, a: usize, b: usize, c1: usize, c2: usize, gm: f64) -> Result<ElementId> {
        let control = [self.node(c1)?, self.node(c2)?];
        self.push(
            a,
            b,
            ElementKind::Vccs(Vccs {
                control,
                transconductance: gm,
            }),
        )
    }

    /// Add a VCVS enforcing V(a) - V(b) = `gain * (V(c1) - V(c2))`.
    pub fn add_vcvs(&mut self, a: usize, b: usize, c1: usize, c2: usize, gain: f64) -> Result<ElementId> {
        let control = [self.node(c1)?, self.node(c2)?];
        self.push(a, b, ElementKind::Vcvs(Vcvs { control, gain }))
    }

    /// Add a CCCS carrying `gain * I(controller)` through itself from `a` to `b`.
    pub fn add_cccs(&mut self, a: usize, b: usize, controller: ElementId, gain: f64) -> Result<ElementId> {
        self.check_controller(controller)?;
        self.push(a, b, ElementKind::Cccs(Cccs { controller, gain }))
    }

    /// Add a CCVS enforcing V(a) - V(b) = `transresistance * I(controller)`.
    pub fn add_ccvs(
        &mut self,
        a: usize,
        b: usize,
        controller: ElementId,
        transresistance: f64,
    ) -> Result<ElementId> {
        self.check_controller(controller)?;
        self.push(
            a,
            b,
            ElementKind::Ccvs(Ccvs {
                controller,
                transresistance,
            }),
        )
    }

    /// Add a switch between `a` and `b` controlled by `V(c1) - V(c2)`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_switch(
        &mut self,
        a: usize,
        b: usize,
        c1: usize,
        c2: usize,
        ron: f64,
        roff: f64,
        vth: f64,
    ) -> Result<ElementId> {
        let control = [self.node(c1)?, self.node(c2)?];
        self.push(a, b, ElementKind::Switch(Switch::new(control, ron, roff, vth)))
    }

    /// Insert a new node between `a` and `b` and connect `a -[R]- mid -[L]- b`.
    ///
    /// Either both elements and the node are added or nothing changes.
    pub fn add_series_rl(&mut self, a: usize, b: usize, resistance: f64, inductance: f64) -> Result<SeriesRl> {
        if self.num_nodes >= MAX_NODES {
            return Err(HilError::CapacityExceeded {
                table: "node",
                capacity: MAX_NODES,
            });
        }
        if self.elements.len() + 2 > MAX_ELEMENTS {
            return Err(HilError::CapacityExceeded {
                table: "element",
                capacity: MAX_ELEMENTS,
            });
        }
        self.node(a)?;
        self.node(b)?;

        self.num_nodes += 1;
        let mid = self.num_nodes;
        self.assign_aux_slots();

        let resistor = self.add_resistor(a, mid, resistance)?;
        let inductor = self.add_inductor(mid, b, inductance)?;

        Ok(SeriesRl {
            resistor,
            inductor,
            intermediate_node: NodeId(mid),
        })
    }

    // ============ Source Configuration ============

    /// Replace the excitation of a source element.
    ///
    /// Out-of-range indices and non-source elements are ignored.
    pub fn set_source(&mut self, id: ElementId, source: Source) {
        match self.elements.get_mut(id.0).and_then(|e| e.source_mut()) {
            Some(slot) => *slot = source,
            None => warn!("ignoring source update for {} (not a source element)", id),
        }
    }

    pub fn set_source_sine(&mut self, id: ElementId, offset: f64, amplitude: f64, frequency: f64, phase: f64) {
        self.set_source(
            id,
            Source::Sine(Sine {
                offset,
                amplitude,
                frequency,
                phase,
            }),
        );
    }

    pub fn set_source_pulse(&mut self, id: ElementId, pulse: Pulse) {
        self.set_source(id, Source::Pulse(pulse));
    }

    pub fn set_source_external(&mut self, id: ElementId, signal: ExternalSignal, gain: f64, offset: f64) {
        self.set_source(
            id,
            Source::External {
                signal,
                gain,
                offset,
            },
        );
    }

    // ============ Internals ============

    fn node(&self, index: usize) -> Result<NodeId> {
        if index > self.num_nodes {
            return Err(HilError::InvalidIndex {
                kind: "node",
                index,
                limit: self.num_nodes,
            });
        }
        Ok(NodeId(index))
    }

    fn check_controller(&self, controller: ElementId) -> Result<()> {
        match self.elements.get(controller.0) {
            Some(e) if e.kind.requires_aux() => Ok(()),
            _ => Err(HilError::InvalidIndex {
                kind: "current-controlling element",
                index: controller.0,
                limit: self.elements.len(),
            }),
        }
    }

    fn push(&mut self, a: usize, b: usize, kind: ElementKind) -> Result<ElementId> {
        let nodes = [self.node(a)?, self.node(b)?];
        let id = ElementId(self.elements.len());

        let mut element = Element::new(nodes, kind);
        if element.kind.requires_aux() {
            element.aux = Some(self.num_nodes + self.num_aux);
        }

        self.elements.push(element).map_err(|_| HilError::CapacityExceeded {
            table: "element",
            capacity: MAX_ELEMENTS,
        })?;
        if self.elements[id.0].aux.is_some() {
            self.num_aux += 1;
        }

        debug!("added {} {} between {} and {}", self.elements[id.0].kind.type_name(), id, nodes[0], nodes[1]);
        Ok(id)
    }

    /// Lay out aux unknowns contiguously after the node unknowns, in declaration order.
    fn assign_aux_slots(&mut self) {
        let mut next = self.num_nodes;
        for element in self.elements.iter_mut() {
            element.aux = if element.kind.requires_aux() {
                next += 1;
                Some(next - 1)
            } else {
                None
            };
        }
        self.num_aux = next - self.num_nodes;
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Circuit elements ({} nodes, dt = {:e} s) ===", self.num_nodes, self.dt)?;
        for (i, e) in self.elements.iter().enumerate() {
            writeln!(
                f,
                "[{}] {:<15} ({} <-> {})  value={:.6}",
                i,
                e.kind.type_name(),
                e.nodes[0],
                e.nodes[1],
                e.kind.nominal()
            )?;
        }
        write!(f, "=================================")
    }
}
