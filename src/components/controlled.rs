//! Linear controlled sources (E, G, H, F).
//!
//! Voltage-controlled variants sense a pair of control nodes. Current-
//! controlled variants sense the auxiliary current unknown of another
//! element (voltage source, inductor, VCVS or CCVS).

use crate::circuit::{ElementId, NodeId};

/// Voltage-controlled voltage source:
///   V(a) - V(b) = gain * (V(c1) - V(c2))
#[derive(Debug, Clone, PartialEq)]
pub struct Vcvs {
    pub control: [NodeId; 2],
    pub gain: f64,
}

/// Voltage-controlled current source:
///   I(a -> b) = transconductance * (V(c1) - V(c2))
#[derive(Debug, Clone, PartialEq)]
pub struct Vccs {
    pub control: [NodeId; 2],
    pub transconductance: f64,
}

/// Current-controlled voltage source:
///   V(a) - V(b) = transresistance * I(controller)
#[derive(Debug, Clone, PartialEq)]
pub struct Ccvs {
    pub controller: ElementId,
    pub transresistance: f64,
}

/// Current-controlled current source:
///   I(a -> b) = gain * I(controller)
#[derive(Debug, Clone, PartialEq)]
pub struct Cccs {
    pub controller: ElementId,
    pub gain: f64,
}
