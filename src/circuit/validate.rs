//! Structural diagnostics run on an assembled system before solving.

use log::debug;

use crate::components::ElementKind;
use crate::error::{HilError, Result};
use crate::solver::{MnaMatrix, EPSILON};

use super::{Circuit, MAX_NODES};

/// Check the circuit and its assembled system for defects a solver would
/// otherwise trip over.
///
/// Checks, in order:
/// - Resistor, capacitor, inductor and switch on-resistance are positive
/// - No row of A is entirely (near) zero
/// - Every node row has a usable diagonal
/// - Every node reaches ground through elements that couple their terminals
pub fn check_system(circuit: &Circuit, matrix: &MnaMatrix) -> Result<()> {
    for (index, element) in circuit.elements().iter().enumerate() {
        if let Some(value) = element.kind.invalid_value() {
            debug!("element {} ({}) has invalid value {}", index, element.kind.type_name(), value);
            return Err(HilError::InvalidElement { index, value });
        }
    }

    let n = matrix.size;
    for row in 0..n {
        if matrix.row(row).iter().all(|v| v.abs() < EPSILON) {
            debug!("row {} of the system is empty", row);
            return Err(HilError::IsolatedNode { row });
        }
    }

    // Aux rows of ideal voltage sources have a structural zero on the
    // diagonal, so only node rows are checked here.
    for row in 0..circuit.num_nodes().min(n) {
        if matrix.get(row, row).abs() < EPSILON {
            debug!("near-zero diagonal at row {}", row);
            return Err(HilError::Singular { row });
        }
    }

    if let Some(node) = first_floating_node(circuit) {
        debug!("node {} has no path to ground", node);
        return Err(HilError::Singular { row: node - 1 });
    }

    Ok(())
}

/// First node with no conductive path to ground, if any.
///
/// A VCCS couples its output rows to its control columns, so its output
/// and control nodes are joined. One sensing its own terminals is a
/// plain conductance.
fn first_floating_node(circuit: &Circuit) -> Option<usize> {
    let mut sets = DisjointSet::new(circuit.num_nodes() + 1);

    for element in circuit.elements() {
        match &element.kind {
            ElementKind::Vccs(g) => {
                for out in element.nodes {
                    for ctrl in g.control {
                        sets.union(out.0, ctrl.0);
                    }
                }
            }
            kind if kind.connects_terminals() => {
                sets.union(element.nodes[0].0, element.nodes[1].0);
            }
            _ => {}
        }
    }

    let ground = sets.find(0);
    (1..=circuit.num_nodes()).find(|&node| sets.find(node) != ground)
}

/// Union-find over node indices.
struct DisjointSet {
    parent: [usize; MAX_NODES + 1],
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        let mut parent = [0; MAX_NODES + 1];
        for (i, p) in parent.iter_mut().enumerate().take(len) {
            *p = i;
        }
        Self { parent }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}
