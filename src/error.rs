//! Error types for the HIL circuit emulator.
//!
//! [`HilError`] covers every failure the crate can report: build-time
//! capacity and reference errors, the structural diagnostics run before each
//! solve, solver failures, netlist parsing, and CLI I/O.
//!
//! [`SystemStatus`] is the compact status code consumed by external
//! monitoring. Every engine-level [`HilError`] maps onto one of its variants.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`HilError`].
pub type Result<T> = std::result::Result<T, HilError>;

/// Unified error type for all emulator operations.
#[derive(Error, Debug)]
pub enum HilError {
    // ============ Build Errors ============
    /// A fixed-capacity table (elements or nodes) is full
    #[error("{table} table full (capacity {capacity})")]
    CapacityExceeded { table: &'static str, capacity: usize },

    /// A node or element index that does not exist in the circuit
    #[error("{kind} index {index} out of range (limit {limit})")]
    InvalidIndex {
        kind: &'static str,
        index: usize,
        limit: usize,
    },

    /// Time step that is not a positive finite number
    #[error("invalid time step {dt:.3e} s")]
    InvalidTimeStep { dt: f64 },

    // ============ Structural Diagnostics ============
    /// Resistor, capacitor, inductor or switch with a non-positive value
    #[error("element {index} has an invalid value ({value:.3e})")]
    InvalidElement { index: usize, value: f64 },

    /// A system row with no effective connection
    #[error("row {row} of the system is empty (isolated node)")]
    IsolatedNode { row: usize },

    /// Near-zero node diagonal or a node with no path to ground
    #[error("singular system at row {row} - circuit is ill-defined")]
    Singular { row: usize },

    // ============ Solver Errors ============
    /// Direct or LU elimination hit a pivot below epsilon
    #[error("solver pivot failure at row {row} (pivot {pivot:.3e})")]
    SolverPivot { row: usize, pivot: f64 },

    /// Gauss-Seidel reached its iteration cap
    #[error("iterative solver did not converge after {iterations} iterations (residual: {residual:.2e})")]
    SolverNonConvergence { iterations: usize, residual: f64 },

    // ============ Netlist Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Invalid element definition
    #[error("Invalid element '{name}' at line {line}: {message}")]
    InvalidComponent {
        name: String,
        line: usize,
        message: String,
    },

    /// Unknown element type prefix
    #[error("Unknown element type '{component_type}' at line {line}")]
    UnknownComponentType { component_type: String, line: usize },

    /// Reference to an element name that was never declared
    #[error("Undefined element '{name}' referenced at line {line}")]
    UnknownElement { name: String, line: usize },

    // ============ I/O Errors ============
    /// Error reading the netlist file
    #[error("Failed to read netlist file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error reading external samples
    #[error("Sample input error: {message}")]
    SampleInputError { message: String },

    /// Error writing actuation codes
    #[error("Sample output error: {message}")]
    SampleOutputError { message: String },
}

impl HilError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid component error
    pub fn invalid_component(name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            name: name.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a non-convergence error
    pub fn non_convergence(iterations: usize, residual: f64) -> Self {
        Self::SolverNonConvergence {
            iterations,
            residual,
        }
    }

    /// Map the error onto the engine status code, if it is an engine error.
    pub fn status(&self) -> Option<SystemStatus> {
        match self {
            Self::InvalidElement { .. } => Some(SystemStatus::InvalidElement),
            Self::IsolatedNode { .. } => Some(SystemStatus::IsolatedNode),
            Self::Singular { .. } => Some(SystemStatus::Singular),
            Self::SolverPivot { .. } => Some(SystemStatus::SolverPivot),
            Self::SolverNonConvergence { .. } => Some(SystemStatus::SolverNonConvergence),
            _ => None,
        }
    }
}

/// Outcome of one simulation step, as reported to monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemStatus {
    Ok,
    Singular,
    InvalidElement,
    IsolatedNode,
    SolverPivot,
    SolverNonConvergence,
}

impl SystemStatus {
    /// Numeric status code (0 = OK, negative = structural/pivot, positive = convergence).
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::SolverPivot => -1,
            Self::Singular => -2,
            Self::InvalidElement => -3,
            Self::IsolatedNode => -4,
            Self::SolverNonConvergence => 1,
        }
    }

    /// Inverse of [`SystemStatus::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            -1 => Some(Self::SolverPivot),
            -2 => Some(Self::Singular),
            -3 => Some(Self::InvalidElement),
            -4 => Some(Self::IsolatedNode),
            1 => Some(Self::SolverNonConvergence),
            _ => None,
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "OK - solution found",
            Self::Singular => "singular matrix (ill-defined circuit)",
            Self::InvalidElement => "invalid element (R, C or L <= 0)",
            Self::IsolatedNode => "isolated node detected",
            Self::SolverPivot => "solver failure (zero pivot)",
            Self::SolverNonConvergence => "iterative solver did not converge",
        }
    }

    /// Whether this status reports success.
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            SystemStatus::Ok,
            SystemStatus::Singular,
            SystemStatus::InvalidElement,
            SystemStatus::IsolatedNode,
            SystemStatus::SolverPivot,
            SystemStatus::SolverNonConvergence,
        ] {
            assert_eq!(SystemStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(SystemStatus::from_code(42), None);
    }

    #[test]
    fn test_error_maps_to_status() {
        let err = HilError::SolverPivot { row: 3, pivot: 0.0 };
        assert_eq!(err.status(), Some(SystemStatus::SolverPivot));

        let err = HilError::CapacityExceeded {
            table: "element",
            capacity: 64,
        };
        assert_eq!(err.status(), None);
    }
}
