//! # HILSim Core
//!
//! A real-time analog circuit emulator for hardware-in-the-loop rigs.
//!
//! This library provides:
//! - A fixed-capacity circuit model built once from builder calls or a netlist
//! - Modified Nodal Analysis (MNA) with backward-Euler companion models
//! - Three dense solvers: Gaussian elimination, Gauss-Seidel, LU
//! - Structural diagnostics and status codes for monitoring
//! - Linear actuation mapping (PWM / DAC codes)
//!
//! ## Architecture
//!
//! - [`netlist`] - Parser for the text netlist format
//! - [`circuit`] - Topology, builders and diagnostics
//! - [`components`] - Element models and excitation sources
//! - [`solver`] - MNA assembly, linear solvers and the stepping engine
//! - [`conditioning`] - Read-back to actuation codes
//! - [`driver`] - Frame I/O and real-time pacing (CLI only)
//!
//! ## Usage
//!
//! ```
//! use hilsim_core::{Circuit, Simulator};
//!
//! let mut circuit = Circuit::new(2, 1e-5).unwrap();
//! circuit.add_voltage_source(1, 0, 5.0).unwrap();
//! circuit.add_resistor(1, 2, 1e3).unwrap();
//! circuit.add_capacitor(2, 0, 1e-6).unwrap();
//!
//! let mut sim = Simulator::new(circuit);
//! for _ in 0..500 {
//!     sim.step().unwrap();
//! }
//! assert!((sim.node_voltage(2) - 5.0).abs() < 0.05);
//! ```
//!
//! ## Time Stepping
//!
//! For each step of fixed size dt:
//!
//! 1. Assemble A and b at the current time (fully, or static snapshot plus dynamic stamps)
//! 2. Run diagnostics; abort on invalid elements, isolated rows or a singular topology
//! 3. Solve Ax = b with the configured solver
//! 4. Commit capacitor voltages and inductor currents, then advance time
//!
//! A failed step leaves time and element state untouched. Switches see the
//! control voltages of the previous step only.

pub mod circuit;
pub mod components;
pub mod conditioning;
pub mod error;
pub mod netlist;
pub mod solver;

#[cfg(feature = "cli")]
pub mod driver;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use error::{HilError, Result, SystemStatus};
pub use solver::{Simulator, SimulatorConfig};
