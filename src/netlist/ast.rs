//! Abstract Syntax Tree types for the netlist.

use crate::solver::{AssemblyMode, SolverKind};

/// Complete AST representation of a parsed netlist.
#[derive(Debug, Clone, Default)]
pub struct NetlistAst {
    /// `.circuit` header
    pub header: Option<CircuitHeader>,
    /// `.solver` selection
    pub solver: Option<SolverKind>,
    /// `.assembly` selection
    pub assembly: Option<AssemblyMode>,
    /// Elements, helpers and probes in declaration order
    pub statements: Vec<Statement>,
}

impl NetlistAst {
    /// Create a new empty netlist AST.
    pub fn new() -> Self {
        Self::default()
    }

    /// Element definitions only.
    pub fn elements(&self) -> impl Iterator<Item = &ElementDef> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Element(e) => Some(e),
            _ => None,
        })
    }
}

/// `.circuit <nodes> <dt>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitHeader {
    pub nodes: usize,
    pub dt: f64,
    pub line: usize,
}

/// One netlist statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Element(ElementDef),
    SeriesRl(SeriesRlDef),
    Probe(ProbeDef),
}

/// An element definition from the netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDef {
    pub element_type: ElementType,
    /// Unique element name
    pub name: String,
    /// Terminal nodes, then control nodes for E, G and S
    pub nodes: Vec<usize>,
    /// Name of the current-controlling element for H and F
    pub controller: Option<String>,
    /// Numeric parameters after the nodes
    pub values: Vec<f64>,
    /// Excitation of V and I
    pub source: Option<SourceSpec>,
    /// Source line number for error reporting
    pub line: usize,
}

/// Element types supported by the netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    /// E
    Vcvs,
    /// G
    Vccs,
    /// H
    Ccvs,
    /// F
    Cccs,
    /// S
    Switch,
}

impl ElementType {
    /// Parse an element type from its name prefix.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'R' => Some(Self::Resistor),
            'C' => Some(Self::Capacitor),
            'L' => Some(Self::Inductor),
            'V' => Some(Self::VoltageSource),
            'I' => Some(Self::CurrentSource),
            'E' => Some(Self::Vcvs),
            'G' => Some(Self::Vccs),
            'H' => Some(Self::Ccvs),
            'F' => Some(Self::Cccs),
            'S' => Some(Self::Switch),
            _ => None,
        }
    }

    /// Number of node references on the line.
    pub fn expected_node_count(&self) -> usize {
        match self {
            Self::Vcvs | Self::Vccs | Self::Switch => 4,
            _ => 2,
        }
    }

    /// Number of numeric parameters after the nodes (sources take a spec instead).
    pub fn expected_value_count(&self) -> usize {
        match self {
            Self::VoltageSource | Self::CurrentSource => 0,
            Self::Switch => 3,
            _ => 1,
        }
    }

    /// Whether a controlling element name follows the nodes.
    pub fn has_controller(&self) -> bool {
        matches!(self, Self::Ccvs | Self::Cccs)
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Self::VoltageSource | Self::CurrentSource)
    }
}

/// Excitation of an independent source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceSpec {
    /// `[DC] value`
    Dc(f64),
    /// `SIN(offset amplitude frequency phase_deg)`
    Sin {
        offset: f64,
        amplitude: f64,
        frequency: f64,
        phase_deg: f64,
    },
    /// `PULSE(v1 v2 delay rise width fall period)`
    Pulse {
        v1: f64,
        v2: f64,
        delay: f64,
        rise: f64,
        width: f64,
        fall: f64,
        period: f64,
    },
    /// `EXT(channel gain offset)`
    Ext { channel: usize, gain: f64, offset: f64 },
}

/// `.rl <name> a b R L`
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRlDef {
    pub name: String,
    pub nodes: [usize; 2],
    pub resistance: f64,
    pub inductance: f64,
    pub line: usize,
}

/// What a probe reads.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeRef {
    /// `v(<node>)`
    Voltage(usize),
    /// `i(<element name>)`
    Current(String),
}

/// `.probe v(<node>)|i(<element>) [gain offset]`
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeDef {
    pub target: ProbeRef,
    pub gain: f64,
    pub offset: f64,
    pub line: usize,
}
