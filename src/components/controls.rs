//! Voltage-controlled switch.

use crate::circuit::NodeId;

/// A voltage-controlled switch.
///
/// Modeled as a resistance between its terminals:
/// - Closed (control voltage above `vth`): `ron`
/// - Open: `roff`
///
/// The conduction state is never stored. It is derived each step from the
/// control voltages committed by the previous step, so a switch cannot react
/// to values solved within the same step.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub control: [NodeId; 2],
    pub ron: f64,
    pub roff: f64,
    pub vth: f64,
}

impl Switch {
    pub fn new(control: [NodeId; 2], ron: f64, roff: f64, vth: f64) -> Self {
        Self {
            control,
            ron,
            roff,
            vth,
        }
    }

    /// Whether the switch conducts for the given control voltage.
    pub fn is_closed(&self, v_ctrl: f64) -> bool {
        v_ctrl > self.vth
    }

    /// Get the resistance for the given control voltage.
    pub fn resistance(&self, v_ctrl: f64) -> f64 {
        let r = if self.is_closed(v_ctrl) {
            self.ron
        } else {
            self.roff
        };
        if r <= 0.0 {
            self.ron
        } else {
            r
        }
    }

    /// Get the conductance for the given control voltage.
    pub fn conductance(&self, v_ctrl: f64) -> f64 {
        1.0 / self.resistance(v_ctrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_threshold() {
        let s = Switch::new([NodeId(1), NodeId(0)], 0.1, 1e6, 2.5);
        assert_eq!(s.resistance(0.0), 1e6);
        assert_eq!(s.resistance(2.5), 1e6);
        assert_eq!(s.resistance(2.6), 0.1);
        assert!((s.conductance(5.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_switch_open_falls_back_to_ron() {
        let s = Switch::new([NodeId(1), NodeId(0)], 1.0, 0.0, 0.5);
        assert_eq!(s.resistance(0.0), 1.0);
    }
}
