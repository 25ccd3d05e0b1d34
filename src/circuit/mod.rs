//! Circuit topology, build-phase API and structural diagnostics.
//!
//! A [`Circuit`] is built once by a sequence of builder calls (or from a
//! netlist) and then handed to the [`Simulator`](crate::solver::Simulator),
//! which owns it for the rest of its life.

mod graph;
mod types;
mod validate;

pub use graph::Circuit;
pub use types::*;
pub use validate::check_system;
