//! Turning a parsed netlist into a circuit and its runtime context.

use std::collections::HashMap;

use log::info;

use super::ast::*;
use crate::circuit::{Circuit, ElementId, MAX_ELEMENTS};
use crate::components::{ExternalSignal, Pulse, Sine, Source};
use crate::conditioning::{ActuationMap, Probe, ProbeTarget};
use crate::error::{HilError, Result};
use crate::solver::SimulatorConfig;

/// Full-scale actuation code used until the driver overrides it (12-bit).
pub const DEFAULT_FULL_SCALE: u16 = 4095;

/// Highest number of `EXT` channels; each one must feed at least one source.
pub const MAX_CHANNELS: usize = MAX_ELEMENTS;

/// Everything the build phase produces.
///
/// Owns the handles a per-step driver needs: the live external channels
/// feeding `EXT` sources and the probes mapping read-back to actuation.
#[derive(Debug)]
pub struct NetlistBuild {
    pub circuit: Circuit,
    pub config: SimulatorConfig,
    /// Indexed by `EXT` channel number
    pub channels: Vec<ExternalSignal>,
    /// In declaration order
    pub probes: Vec<Probe>,
    /// Element names (uppercased) to indices
    pub names: HashMap<String, ElementId>,
}

impl NetlistBuild {
    /// Look up an element by name.
    pub fn element(&self, name: &str) -> Option<ElementId> {
        self.names.get(&name.to_ascii_uppercase()).copied()
    }
}

/// Build a circuit from a parsed netlist.
pub fn build(ast: &NetlistAst) -> Result<NetlistBuild> {
    let header = ast
        .header
        .ok_or_else(|| HilError::parse(1, "missing .circuit directive"))?;

    let mut circuit = Circuit::new(header.nodes, header.dt).map_err(|e| HilError::parse(header.line, e.to_string()))?;

    let mut config = SimulatorConfig::new();
    if let Some(solver) = ast.solver {
        config = config.with_solver(solver);
    }
    if let Some(assembly) = ast.assembly {
        config = config.with_assembly(assembly);
    }

    let mut builder = Builder {
        circuit: &mut circuit,
        channels: Vec::new(),
        names: HashMap::new(),
    };
    let mut probes = Vec::new();

    for statement in &ast.statements {
        match statement {
            Statement::Element(def) => builder.add_element(def)?,
            Statement::SeriesRl(def) => builder.add_series_rl(def)?,
            Statement::Probe(def) => probes.push(builder.probe(def)?),
        }
    }

    let Builder { channels, names, .. } = builder;

    info!(
        "netlist built: {} nodes, {} elements, {} channels, {} probes",
        circuit.num_nodes(),
        circuit.len(),
        channels.len(),
        probes.len()
    );

    Ok(NetlistBuild {
        circuit,
        config,
        channels,
        probes,
        names,
    })
}

struct Builder<'c> {
    circuit: &'c mut Circuit,
    channels: Vec<ExternalSignal>,
    names: HashMap<String, ElementId>,
}

impl Builder<'_> {
    fn register(&mut self, name: &str, line: usize, id: ElementId) -> Result<()> {
        let key = name.to_ascii_uppercase();
        if self.names.contains_key(&key) {
            return Err(HilError::invalid_component(name, line, "duplicate element name"));
        }
        self.names.insert(key, id);
        Ok(())
    }

    fn lookup(&self, name: &str, line: usize) -> Result<ElementId> {
        self.names
            .get(&name.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| HilError::UnknownElement {
                name: name.to_string(),
                line,
            })
    }

    fn channel(&mut self, index: usize, def: &ElementDef) -> Result<ExternalSignal> {
        if index >= MAX_CHANNELS {
            return Err(HilError::invalid_component(
                &def.name,
                def.line,
                format!("EXT channel {} out of range (max {})", index, MAX_CHANNELS - 1),
            ));
        }
        while self.channels.len() <= index {
            self.channels.push(ExternalSignal::default());
        }
        Ok(self.channels[index].clone())
    }

    fn source(&mut self, spec: SourceSpec, def: &ElementDef) -> Result<Source> {
        let source = match spec {
            SourceSpec::Dc(v) => Source::Dc(v),
            SourceSpec::Sin {
                offset,
                amplitude,
                frequency,
                phase_deg,
            } => Source::Sine(Sine {
                offset,
                amplitude,
                frequency,
                phase: phase_deg.to_radians(),
            }),
            SourceSpec::Pulse {
                v1,
                v2,
                delay,
                rise,
                width,
                fall,
                period,
            } => Source::Pulse(Pulse {
                v1,
                v2,
                delay,
                rise,
                width,
                fall,
                period,
            }),
            SourceSpec::Ext { channel, gain, offset } => Source::External {
                signal: self.channel(channel, def)?,
                gain,
                offset,
            },
        };
        Ok(source)
    }

    fn add_element(&mut self, def: &ElementDef) -> Result<()> {
        let ty = def.element_type;
        if def.nodes.len() < ty.expected_node_count() || def.values.len() < ty.expected_value_count() {
            return Err(HilError::invalid_component(&def.name, def.line, "missing nodes or values"));
        }

        let ctrl = match &def.controller {
            Some(name) => Some(self.lookup(name, def.line)?),
            None => None,
        };

        let n = &def.nodes;
        let v = &def.values;
        let c = &mut *self.circuit;

        let added = match ty {
            ElementType::Resistor => c.add_resistor(n[0], n[1], v[0]),
            ElementType::Capacitor => c.add_capacitor(n[0], n[1], v[0]),
            ElementType::Inductor => c.add_inductor(n[0], n[1], v[0]),
            ElementType::VoltageSource => c.add_voltage_source(n[0], n[1], 0.0),
            ElementType::CurrentSource => c.add_current_source(n[0], n[1], 0.0),
            ElementType::Vcvs => c.add_vcvs(n[0], n[1], n[2], n[3], v[0]),
            ElementType::Vccs => c.add_vccs(n[0], n[1], n[2], n[3], v[0]),
            ElementType::Switch => c.add_switch(n[0], n[1], n[2], n[3], v[0], v[1], v[2]),
            ElementType::Ccvs | ElementType::Cccs => match ctrl {
                Some(k) if ty == ElementType::Ccvs => c.add_ccvs(n[0], n[1], k, v[0]),
                Some(k) => c.add_cccs(n[0], n[1], k, v[0]),
                None => {
                    return Err(HilError::invalid_component(
                        &def.name,
                        def.line,
                        "missing controlling element",
                    ))
                }
            },
        };
        let id = added.map_err(|e| HilError::invalid_component(&def.name, def.line, e.to_string()))?;

        if let Some(spec) = def.source {
            let source = self.source(spec, def)?;
            self.circuit.set_source(id, source);
        }

        self.register(&def.name, def.line, id)
    }

    fn add_series_rl(&mut self, def: &SeriesRlDef) -> Result<()> {
        let rl = self
            .circuit
            .add_series_rl(def.nodes[0], def.nodes[1], def.resistance, def.inductance)
            .map_err(|e| HilError::invalid_component(&def.name, def.line, e.to_string()))?;
        // The name refers to the series current, carried by the inductor
        self.register(&def.name, def.line, rl.inductor)
    }

    fn probe(&self, def: &ProbeDef) -> Result<Probe> {
        let target = match &def.target {
            ProbeRef::Voltage(node) => {
                if *node > self.circuit.num_nodes() {
                    return Err(HilError::parse(
                        def.line,
                        format!("probe node {} out of range", node),
                    ));
                }
                ProbeTarget::Voltage(*node)
            }
            ProbeRef::Current(name) => ProbeTarget::Current(self.lookup(name, def.line)?),
        };
        Ok(Probe::new(
            target,
            ActuationMap::new(def.gain, def.offset, DEFAULT_FULL_SCALE),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::load;
    use super::*;
    use crate::components::ElementKind;

    #[test]
    fn test_build_divider() {
        let build = load(".circuit 2 1u\nV1 1 0 10\nR1 1 2 1k\nR2 2 0 1k\n.probe v(2) 0.1 0").unwrap();
        assert_eq!(build.circuit.len(), 3);
        assert_eq!(build.element("r2"), Some(ElementId(2)));
        assert_eq!(build.probes.len(), 1);
        assert_eq!(build.probes[0].target, ProbeTarget::Voltage(2));
        assert!(build.channels.is_empty());
    }

    #[test]
    fn test_ext_channels_are_shared() {
        let build = load(".circuit 2 1u\nVA 1 0 EXT(2 1 0)\nVB 2 0 EXT(2 3 0)\nR1 1 2 1k\nR2 2 0 1k").unwrap();
        assert_eq!(build.channels.len(), 3);

        build.channels[2].set(1.5);
        let va = build.circuit.element(ElementId(0)).unwrap();
        let vb = build.circuit.element(ElementId(1)).unwrap();
        assert_eq!(va.source().map(|s| s.eval(0.0)), Some(1.5));
        assert_eq!(vb.source().map(|s| s.eval(0.0)), Some(4.5));
    }

    #[test]
    fn test_ext_channel_is_bounded() {
        let last = format!(".circuit 1 1u\nV1 1 0 EXT({} 1 0)\nR1 1 0 1k", MAX_CHANNELS - 1);
        assert_eq!(load(&last).unwrap().channels.len(), MAX_CHANNELS);

        assert!(matches!(
            load(".circuit 1 1u\nV1 1 0 EXT(1000000 1 0)\nR1 1 0 1k"),
            Err(HilError::InvalidComponent { line: 2, .. })
        ));
        assert!(matches!(
            load(".circuit 1 1u\nV1 1 0 EXT(1e9 1 0)\nR1 1 0 1k"),
            Err(HilError::InvalidComponent { line: 2, .. })
        ));
    }

    #[test]
    fn test_sine_phase_in_degrees() {
        let build = load(".circuit 1 1u\nV1 1 0 SIN(0 1 50 90)\nR1 1 0 1").unwrap();
        let v = build.circuit.element(ElementId(0)).unwrap();
        assert!((v.source().unwrap().eval(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_current_controlled_reference() {
        let build = load(".circuit 2 1u\nV1 1 0 1\nR1 1 0 1k\nF1 0 2 v1 2\nR2 2 0 1k").unwrap();
        match &build.circuit.element(ElementId(2)).unwrap().kind {
            ElementKind::Cccs(f) => assert_eq!(f.controller, ElementId(0)),
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            load(".circuit 2 1u\nH1 1 0 VX 2\nR1 1 0 1k"),
            Err(HilError::UnknownElement { line: 2, .. })
        ));
    }

    #[test]
    fn test_series_rl_name_maps_to_inductor() {
        let build = load(".circuit 1 1u\nV1 1 0 1\n.rl LINE 1 0 1 1m\n.probe i(line)").unwrap();
        assert_eq!(build.circuit.num_nodes(), 2);
        let id = build.element("LINE").unwrap();
        assert!(matches!(
            build.circuit.element(id).unwrap().kind,
            ElementKind::Inductor(_)
        ));
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(load("R1 1 0 1k"), Err(HilError::ParseError { .. })));
        assert!(matches!(
            load(".circuit 1 1u\nR1 1 0 1k\nR1 1 0 2k"),
            Err(HilError::InvalidComponent { line: 3, .. })
        ));
        assert!(matches!(
            load(".circuit 1 1u\nR1 1 5 1k"),
            Err(HilError::InvalidComponent { line: 2, .. })
        ));
        assert!(load(".circuit 1 1u\nR1 1 0 1k\n.probe v(4)").is_err());
    }
}
