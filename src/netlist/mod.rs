//! Netlist parser for circuit descriptions.
//!
//! This module provides a SPICE-inspired, line-oriented text format that
//! expands into the builder calls of [`Circuit`](crate::circuit::Circuit).
//! Nodes are integer indices; `0` (or `GND`) is ground.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist     = { line }
//! line        = comment | directive | element | empty
//! comment     = ('#' | ';' | '*') { any_char }
//! directive   = '.' directive_name { argument }
//! element     = name node+ [controller] (value+ | source)
//!
//! name        = type_letter identifier_chars
//! node        = integer | "GND"
//! source      = ["DC"] value | "SIN" args | "PULSE" args | "EXT" args
//! args        = '(' value { [','] value } ')'
//! value       = number [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! # Element Types
//!
//! | Type | Description | Syntax |
//! |------|-------------|--------|
//! | R | Resistor | `R<name> <a> <b> <ohms>` |
//! | C | Capacitor | `C<name> <a> <b> <farads>` |
//! | L | Inductor | `L<name> <a> <b> <henries>` |
//! | V | Voltage source | `V<name> <a> <b> <source>` |
//! | I | Current source | `I<name> <a> <b> <source>` |
//! | E | VCVS | `E<name> <a> <b> <c1> <c2> <gain>` |
//! | G | VCCS | `G<name> <a> <b> <c1> <c2> <siemens>` |
//! | H | CCVS | `H<name> <a> <b> <controller> <ohms>` |
//! | F | CCCS | `F<name> <a> <b> <controller> <gain>` |
//! | S | Switch | `S<name> <a> <b> <c1> <c2> <ron> <roff> <vth>` |
//!
//! Sources take `SIN(offset amplitude freq [phase_deg])`,
//! `PULSE(v1 v2 delay rise width fall period)` or `EXT(channel gain offset)`.
//!
//! # Directives
//!
//! | Directive | Description | Syntax |
//! |-----------|-------------|--------|
//! | .circuit | Node count and time step (required) | `.circuit <nodes> <dt>` |
//! | .solver | Linear solver | `.solver gauss\|seidel\|lu` |
//! | .assembly | Assembly strategy | `.assembly full\|split` |
//! | .rl | Series RL with a new internal node | `.rl <name> <a> <b> <R> <L>` |
//! | .probe | Actuation output | `.probe v(<node>)\|i(<element>) [gain offset]` |
//! | .end | Stop parsing | `.end` |
//!
//! # Example
//!
//! ```text
//! # RC low-pass driven by a live input
//! .circuit 2 10u
//! VIN  1  0  EXT(0 10 0)
//! R1   1  2  1k
//! C1   2  0  100n
//! .probe v(2) 0.1 0
//! ```

mod ast;
mod build;
mod lexer;
mod parser;

pub use ast::*;
pub use build::{build, NetlistBuild, DEFAULT_FULL_SCALE, MAX_CHANNELS};
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a netlist string into an AST.
pub fn parse(input: &str) -> Result<NetlistAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse and build a netlist string in one go.
pub fn load(input: &str) -> Result<NetlistBuild> {
    build(&parse(input)?)
}

/// Read, parse and build a netlist file.
pub fn load_file(path: &std::path::Path) -> Result<NetlistBuild> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::HilError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    load(&content)
}
