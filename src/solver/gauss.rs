//! Direct Gaussian elimination without pivoting.

use super::{LinearSolver, MnaMatrix, EPSILON};
use crate::error::{HilError, Result};

/// Gaussian elimination using each row's own diagonal as the pivot.
///
/// Rows are never reordered. A is reduced to unit upper-triangular form in
/// place, so the matrix must be reassembled before the next solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussSolver;

impl LinearSolver for GaussSolver {
    fn solve(&mut self, m: &mut MnaMatrix) -> Result<()> {
        let n = m.size;

        for i in 0..n {
            let pivot = m.get(i, i);
            if pivot.abs() < EPSILON {
                return Err(HilError::SolverPivot { row: i, pivot });
            }

            let inv_pivot = 1.0 / pivot;
            for j in i..n {
                let v = m.get(i, j) * inv_pivot;
                m.set(i, j, v);
            }
            m.b[i] *= inv_pivot;

            for k in (i + 1)..n {
                let factor = m.get(k, i);
                if factor.abs() < EPSILON {
                    continue;
                }
                for j in i..n {
                    let v = m.get(k, j) - factor * m.get(i, j);
                    m.set(k, j, v);
                }
                m.b[k] -= factor * m.b[i];
            }
        }

        for i in (0..n).rev() {
            let mut sum = m.b[i];
            for j in (i + 1)..n {
                sum -= m.get(i, j) * m.x[j];
            }
            m.x[i] = sum;
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "gauss"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solves_small_system() {
        let mut m = MnaMatrix::from_dense(&[&[4.0, -2.0], &[-2.0, 3.0]], &[2.0, 1.0]);
        GaussSolver.solve(&mut m).unwrap();
        assert_relative_eq!(m.x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_pivot_fails() {
        let mut m = MnaMatrix::from_dense(&[&[0.0, 1.0], &[1.0, 0.0]], &[1.0, 1.0]);
        let err = GaussSolver.solve(&mut m).unwrap_err();
        assert!(matches!(err, HilError::SolverPivot { row: 0, .. }));
    }
}
