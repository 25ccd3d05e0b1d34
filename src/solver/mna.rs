//! MNA matrix storage and element stamping.

use crate::circuit::{Circuit, NodeId, MAX_SYSTEM_SIZE};
use crate::components::ElementKind;

/// Row stride of the dense storage.
const STRIDE: usize = MAX_SYSTEM_SIZE;

/// MNA matrix system Ax = b.
///
/// Storage is allocated once for the largest supported system. Only the
/// leading `size` rows and columns take part in assembly and solving.
#[derive(Debug, Clone)]
pub struct MnaMatrix {
    /// System matrix A (row-major, stride `MAX_SYSTEM_SIZE`)
    pub a: Vec<f64>,
    /// Right-hand side b
    pub b: Vec<f64>,
    /// Solution vector x (solver scratch)
    pub x: Vec<f64>,
    /// Effective dimension
    pub size: usize,
}

impl MnaMatrix {
    /// Create a zeroed system of effective dimension `size`.
    pub fn new(size: usize) -> Self {
        Self {
            a: vec![0.0; STRIDE * STRIDE],
            b: vec![0.0; STRIDE],
            x: vec![0.0; STRIDE],
            size: size.min(STRIDE),
        }
    }

    /// Clear A and b to zero.
    pub fn clear(&mut self) {
        let n = self.size;
        self.a[..n * STRIDE].fill(0.0);
        self.b[..n].fill(0.0);
    }

    /// Get matrix element at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.a[row * STRIDE + col]
    }

    /// Set matrix element at (row, col).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * STRIDE + col] = value;
    }

    /// Add to matrix element at (row, col).
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * STRIDE + col] += value;
    }

    /// Add to the right-hand side.
    #[inline]
    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.b[row] += value;
    }

    /// One row of A, restricted to the effective dimension.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.a[row * STRIDE..row * STRIDE + self.size]
    }

    /// Copy A and b from another system of the same dimension.
    pub fn copy_from(&mut self, other: &MnaMatrix) {
        let n = self.size;
        self.a[..n * STRIDE].copy_from_slice(&other.a[..n * STRIDE]);
        self.b[..n].copy_from_slice(&other.b[..n]);
    }

    /// Stamp a conductance between two nodes.
    /// For a conductance G between nodes n1 and n2:
    ///   A[n1,n1] += G
    ///   A[n2,n2] += G
    ///   A[n1,n2] -= G
    ///   A[n2,n1] -= G
    pub fn stamp_conductance(&mut self, n1: Option<usize>, n2: Option<usize>, g: f64) {
        if let Some(i) = n1 {
            self.add(i, i, g);
        }
        if let Some(j) = n2 {
            self.add(j, j, g);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.add(i, j, -g);
            self.add(j, i, -g);
        }
    }

    /// Stamp the +1/-1 couplings tying branch row `k` to its terminals.
    /// KVL row: V[n+] - V[n-] (+ extra terms) = b[k]
    pub fn stamp_branch(&mut self, n_pos: Option<usize>, n_neg: Option<usize>, k: usize) {
        if let Some(i) = n_pos {
            self.add(k, i, 1.0);
            self.add(i, k, 1.0);
        }
        if let Some(j) = n_neg {
            self.add(k, j, -1.0);
            self.add(j, k, -1.0);
        }
    }

    /// Stamp a current source. Current flows through the source from n+ to n-.
    pub fn stamp_current_source(&mut self, n_pos: Option<usize>, n_neg: Option<usize>, current: f64) {
        if let Some(i) = n_pos {
            self.add_rhs(i, -current);
        }
        if let Some(j) = n_neg {
            self.add_rhs(j, current);
        }
    }

    /// Stamp a VCCS (Voltage-Controlled Current Source).
    /// I = gm * (V[ctrl+] - V[ctrl-])
    pub fn stamp_vccs(
        &mut self,
        n_out_pos: Option<usize>,
        n_out_neg: Option<usize>,
        n_ctrl_pos: Option<usize>,
        n_ctrl_neg: Option<usize>,
        gm: f64,
    ) {
        if let (Some(i), Some(k)) = (n_out_pos, n_ctrl_pos) {
            self.add(i, k, gm);
        }
        if let (Some(i), Some(l)) = (n_out_pos, n_ctrl_neg) {
            self.add(i, l, -gm);
        }
        if let (Some(j), Some(k)) = (n_out_neg, n_ctrl_pos) {
            self.add(j, k, -gm);
        }
        if let (Some(j), Some(l)) = (n_out_neg, n_ctrl_neg) {
            self.add(j, l, gm);
        }
    }

    /// Build a system from dense rows (tests only).
    #[cfg(test)]
    pub fn from_dense(a: &[&[f64]], b: &[f64]) -> Self {
        let mut m = Self::new(b.len());
        for (i, row) in a.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                m.set(i, j, v);
            }
        }
        m.b[..b.len()].copy_from_slice(b);
        m
    }
}

/// Voltage of `node` in a solution vector; ground reads 0.
#[inline]
pub(crate) fn voltage_in(solution: &[f64], node: NodeId) -> f64 {
    node.row().map_or(0.0, |r| solution[r])
}

/// Stamp everything that does not change between steps.
///
/// Resistors, the branch couplings of inductors, voltage sources, VCVS and
/// CCVS, and the fixed coefficients of the controlled sources.
pub fn assemble_static(circuit: &Circuit, matrix: &mut MnaMatrix) {
    for element in circuit.elements() {
        let (n1, n2) = element.rows();

        match &element.kind {
            ElementKind::Resistor(r) => {
                matrix.stamp_conductance(n1, n2, r.conductance());
            }

            ElementKind::Inductor(_) | ElementKind::VoltageSource(_) => {
                if let Some(k) = element.aux {
                    matrix.stamp_branch(n1, n2, k);
                }
            }

            ElementKind::Vcvs(e) => {
                if let Some(k) = element.aux {
                    matrix.stamp_branch(n1, n2, k);
                    if let Some(c) = e.control[0].row() {
                        matrix.add(k, c, -e.gain);
                    }
                    if let Some(c) = e.control[1].row() {
                        matrix.add(k, c, e.gain);
                    }
                }
            }

            ElementKind::Vccs(g) => {
                matrix.stamp_vccs(n1, n2, g.control[0].row(), g.control[1].row(), g.transconductance);
            }

            ElementKind::Ccvs(h) => {
                let ctrl = circuit.element(h.controller).and_then(|c| c.aux);
                if let (Some(k), Some(kc)) = (element.aux, ctrl) {
                    matrix.stamp_branch(n1, n2, k);
                    matrix.add(k, kc, -h.transresistance);
                }
            }

            ElementKind::Cccs(f) => {
                if let Some(kc) = circuit.element(f.controller).and_then(|c| c.aux) {
                    if let Some(i) = n1 {
                        matrix.add(i, kc, f.gain);
                    }
                    if let Some(j) = n2 {
                        matrix.add(j, kc, -f.gain);
                    }
                }
            }

            // Dynamic elements
            ElementKind::Capacitor(_) | ElementKind::CurrentSource(_) | ElementKind::Switch(_) => {}
        }
    }
}

/// Stamp everything that depends on time, history, or the previous solution.
///
/// `committed` is the last successful solution; switches read their control
/// voltage from it.
pub fn assemble_dynamic(circuit: &Circuit, matrix: &mut MnaMatrix, t: f64, committed: &[f64]) {
    let dt = circuit.dt();

    for element in circuit.elements() {
        let (n1, n2) = element.rows();

        match &element.kind {
            ElementKind::Capacitor(c) => {
                matrix.stamp_conductance(n1, n2, c.conductance(dt));
                // Companion current source
                let i_eq = c.history_current(dt);
                if let Some(i) = n1 {
                    matrix.add_rhs(i, i_eq);
                }
                if let Some(j) = n2 {
                    matrix.add_rhs(j, -i_eq);
                }
            }

            ElementKind::Inductor(l) => {
                if let Some(k) = element.aux {
                    matrix.add(k, k, -l.resistance(dt));
                    matrix.add_rhs(k, l.history_voltage(dt));
                }
            }

            ElementKind::CurrentSource(i) => {
                matrix.stamp_current_source(n1, n2, i.current(t));
            }

            ElementKind::VoltageSource(v) => {
                if let Some(k) = element.aux {
                    matrix.add_rhs(k, v.voltage(t));
                }
            }

            ElementKind::Switch(s) => {
                let v_ctrl = voltage_in(committed, s.control[0]) - voltage_in(committed, s.control[1]);
                matrix.stamp_conductance(n1, n2, s.conductance(v_ctrl));
            }

            // Static elements
            ElementKind::Resistor(_)
            | ElementKind::Vcvs(_)
            | ElementKind::Vccs(_)
            | ElementKind::Ccvs(_)
            | ElementKind::Cccs(_) => {}
        }
    }
}

/// Rebuild the whole system from scratch.
pub fn assemble_full(circuit: &Circuit, matrix: &mut MnaMatrix, t: f64, committed: &[f64]) {
    matrix.clear();
    assemble_static(circuit, matrix);
    assemble_dynamic(circuit, matrix, t, committed);
}
