//! Core types for circuit representation.

use std::fmt;

/// Maximum number of non-ground nodes in a circuit.
pub const MAX_NODES: usize = 16;

/// Maximum number of elements in a circuit.
pub const MAX_ELEMENTS: usize = 64;

/// Dimension of the preallocated dense system (node unknowns + aux unknowns).
pub const MAX_SYSTEM_SIZE: usize = MAX_NODES + MAX_ELEMENTS;

/// A node in the circuit.
/// Node 0 is always ground and never owns a matrix row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The ground node (always index 0).
    pub const GROUND: NodeId = NodeId(0);

    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }

    /// Matrix row of this node, `None` for ground.
    pub fn row(&self) -> Option<usize> {
        if self.is_ground() {
            None
        } else {
            Some(self.0 - 1)
        }
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "N{}", self.0)
        }
    }
}

/// Index of an element in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Indices created by the series RL helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRl {
    pub resistor: ElementId,
    pub inductor: ElementId,
    pub intermediate_node: NodeId,
}
