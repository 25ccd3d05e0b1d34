//! Gauss-Seidel relaxation.

use super::{LinearSolver, MnaMatrix, EPSILON};
use crate::error::{HilError, Result};

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default convergence tolerance on the largest per-coordinate update.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Iterative Gauss-Seidel solver.
///
/// Starts from whatever `x` holds, so the caller seeds it with the previous
/// solution. Converges only for diagonally dominant systems; a zero
/// diagonal is reported as a pivot failure instead of dividing by it.
#[derive(Debug, Clone, Copy)]
pub struct GaussSeidelSolver {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for GaussSeidelSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE)
    }
}

impl GaussSeidelSolver {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }
}

impl LinearSolver for GaussSeidelSolver {
    fn solve(&mut self, m: &mut MnaMatrix) -> Result<()> {
        let n = m.size;

        for i in 0..n {
            let diag = m.get(i, i);
            if diag.abs() < EPSILON {
                return Err(HilError::SolverPivot { row: i, pivot: diag });
            }
        }

        let mut max_err = f64::INFINITY;
        for _ in 0..self.max_iterations {
            max_err = 0.0;

            for i in 0..n {
                let mut sigma = 0.0;
                for j in 0..n {
                    if j != i {
                        sigma += m.get(i, j) * m.x[j];
                    }
                }

                let x_new = (m.b[i] - sigma) / m.get(i, i);
                max_err = max_err.max((x_new - m.x[i]).abs());
                m.x[i] = x_new;
            }

            if max_err < self.tolerance {
                return Ok(());
            }
        }

        Err(HilError::non_convergence(self.max_iterations, max_err))
    }

    fn name(&self) -> &'static str {
        "gauss-seidel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_converges_on_dominant_system() {
        let mut m = MnaMatrix::from_dense(
            &[&[10.0, -1.0, 0.0], &[-1.0, 10.0, -2.0], &[0.0, -2.0, 10.0]],
            &[9.0, 7.0, 8.0],
        );
        let mut gs = GaussSeidelSolver::default();
        gs.solve(&mut m).unwrap();

        // Residual check against the untouched A
        for i in 0..3 {
            let r: f64 = (0..3).map(|j| m.get(i, j) * m.x[j]).sum::<f64>() - m.b[i];
            assert!(r.abs() < 1e-4);
        }
    }

    #[test]
    fn test_iteration_cap() {
        let mut m = MnaMatrix::from_dense(&[&[1.0, 3.0], &[3.0, 1.0]], &[1.0, 1.0]);
        let mut gs = GaussSeidelSolver::new(5, 1e-9);
        let err = gs.solve(&mut m).unwrap_err();
        assert!(matches!(err, HilError::SolverNonConvergence { iterations: 5, .. }));
    }

    #[test]
    fn test_zero_diagonal_is_pivot_failure() {
        let mut m = MnaMatrix::from_dense(&[&[1.0, 1.0], &[1.0, 0.0]], &[1.0, 0.0]);
        let err = GaussSeidelSolver::default().solve(&mut m).unwrap_err();
        assert!(matches!(err, HilError::SolverPivot { row: 1, .. }));
    }

    #[test]
    fn test_warm_start_converges_immediately() {
        let mut m = MnaMatrix::from_dense(&[&[2.0, 0.0], &[0.0, 4.0]], &[2.0, 8.0]);
        m.x[0] = 1.0;
        m.x[1] = 2.0;
        GaussSeidelSolver::new(1, 1e-9).solve(&mut m).unwrap();
        assert_relative_eq!(m.x[1], 2.0);
    }
}
