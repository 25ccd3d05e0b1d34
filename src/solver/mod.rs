//! MNA (Modified Nodal Analysis) solver.
//!
//! This module provides the numerical engine for circuit emulation.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Ax = b where:
//! - x contains node voltages followed by auxiliary branch currents
//! - A is the conductance/coefficient matrix
//! - b is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   D ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G is the conductance matrix (node equations)
//! - B, C couple branch-constrained elements to their terminals
//! - D holds inductor companion resistances and current-control terms
//! - v is the vector of node voltages
//! - j is the vector of auxiliary currents
//! - i is the sum of current injections into each node
//! - e is the vector of branch constraint values
//!
//! Reactive elements use backward-Euler companion models for the fixed time
//! step, so every step is a single linear solve. None of the solvers reorder
//! rows; a well-posed network is expected to produce usable diagonals.

mod gauss;
mod gauss_seidel;
mod lu;
mod mna;
mod simulator;

use std::fmt;
use std::str::FromStr;

pub use gauss::GaussSolver;
pub use gauss_seidel::{GaussSeidelSolver, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
pub use lu::LuSolver;
pub use mna::{assemble_dynamic, assemble_full, assemble_static, MnaMatrix};
pub use simulator::{AssemblyMode, EngineState, Simulator, SimulatorConfig};

use crate::error::Result;

/// Magnitude below which a pivot, diagonal or row entry counts as zero.
pub const EPSILON: f64 = 1e-9;

/// A dense linear solver working on an assembled [`MnaMatrix`].
///
/// On success `x` holds the full solution. On failure `x` is left in
/// whatever partial state the algorithm reached.
pub trait LinearSolver {
    fn solve(&mut self, matrix: &mut MnaMatrix) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Available solver algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    /// Direct Gaussian elimination
    #[default]
    Gauss,
    /// Gauss-Seidel relaxation
    GaussSeidel,
    /// Doolittle LU factorization
    Lu,
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gauss" | "direct" => Ok(Self::Gauss),
            "seidel" | "gauss-seidel" | "gs" => Ok(Self::GaussSeidel),
            "lu" => Ok(Self::Lu),
            other => Err(format!("unknown solver '{}'", other)),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gauss => "gauss",
            Self::GaussSeidel => "seidel",
            Self::Lu => "lu",
        };
        f.write_str(name)
    }
}

/// The configured solver instance, with any workspace it needs.
#[derive(Debug, Clone)]
pub enum Solver {
    Gauss(GaussSolver),
    GaussSeidel(GaussSeidelSolver),
    Lu(LuSolver),
}

impl Solver {
    pub fn new(kind: SolverKind, max_iterations: usize, tolerance: f64) -> Self {
        match kind {
            SolverKind::Gauss => Self::Gauss(GaussSolver),
            SolverKind::GaussSeidel => Self::GaussSeidel(GaussSeidelSolver::new(max_iterations, tolerance)),
            SolverKind::Lu => Self::Lu(LuSolver::new()),
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Self::Gauss(_) => SolverKind::Gauss,
            Self::GaussSeidel(_) => SolverKind::GaussSeidel,
            Self::Lu(_) => SolverKind::Lu,
        }
    }
}

impl LinearSolver for Solver {
    fn solve(&mut self, matrix: &mut MnaMatrix) -> Result<()> {
        match self {
            Self::Gauss(s) => s.solve(matrix),
            Self::GaussSeidel(s) => s.solve(matrix),
            Self::Lu(s) => s.solve(matrix),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Gauss(s) => s.name(),
            Self::GaussSeidel(s) => s.name(),
            Self::Lu(s) => s.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_parse() {
        assert_eq!("LU".parse::<SolverKind>(), Ok(SolverKind::Lu));
        assert_eq!("seidel".parse::<SolverKind>(), Ok(SolverKind::GaussSeidel));
        assert!("cholesky".parse::<SolverKind>().is_err());
        assert_eq!(Solver::new(SolverKind::Lu, 50, 1e-5).kind(), SolverKind::Lu);
    }
}
