//! Doolittle LU factorization without pivoting.

use super::{LinearSolver, MnaMatrix, EPSILON};
use crate::circuit::MAX_SYSTEM_SIZE;
use crate::error::{HilError, Result};

const STRIDE: usize = MAX_SYSTEM_SIZE;

/// LU solver with preallocated factor and forward-substitution storage.
#[derive(Debug, Clone)]
pub struct LuSolver {
    l: Vec<f64>,
    u: Vec<f64>,
    y: Vec<f64>,
}

impl Default for LuSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LuSolver {
    pub fn new() -> Self {
        Self {
            l: vec![0.0; STRIDE * STRIDE],
            u: vec![0.0; STRIDE * STRIDE],
            y: vec![0.0; STRIDE],
        }
    }

    /// Factor A = LU with unit diagonal on L.
    fn decompose(&mut self, m: &MnaMatrix) -> Result<()> {
        let n = m.size;
        let (l, u) = (&mut self.l, &mut self.u);

        for i in 0..n {
            for k in i..n {
                let sum: f64 = (0..i).map(|j| l[i * STRIDE + j] * u[j * STRIDE + k]).sum();
                u[i * STRIDE + k] = m.get(i, k) - sum;
            }

            let pivot = u[i * STRIDE + i];
            if pivot.abs() < EPSILON {
                return Err(HilError::SolverPivot { row: i, pivot });
            }

            l[i * STRIDE + i] = 1.0;
            for k in (i + 1)..n {
                let sum: f64 = (0..i).map(|j| l[k * STRIDE + j] * u[j * STRIDE + i]).sum();
                l[k * STRIDE + i] = (m.get(k, i) - sum) / pivot;
            }
        }

        Ok(())
    }

    /// Forward then back substitution into `m.x`.
    fn substitute(&mut self, m: &mut MnaMatrix) {
        let n = m.size;

        for i in 0..n {
            let sum: f64 = (0..i).map(|j| self.l[i * STRIDE + j] * self.y[j]).sum();
            self.y[i] = m.b[i] - sum;
        }

        for i in (0..n).rev() {
            let sum: f64 = ((i + 1)..n).map(|j| self.u[i * STRIDE + j] * m.x[j]).sum();
            m.x[i] = (self.y[i] - sum) / self.u[i * STRIDE + i];
        }
    }
}

impl LinearSolver for LuSolver {
    fn solve(&mut self, m: &mut MnaMatrix) -> Result<()> {
        self.decompose(m)?;
        self.substitute(m);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "lu"
    }
}
