//! Linear passive elements: Resistor, Capacitor, Inductor.
//!
//! Reactive elements use backward-Euler companion models. Their persisted
//! state (capacitor voltage, inductor current) is only written by the
//! stepping engine after a successful solve.

/// A resistor.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub resistance: f64,
}

impl Resistor {
    pub fn new(resistance: f64) -> Self {
        Self { resistance }
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }

    /// Branch current for a voltage `v` across the terminals.
    pub fn current(&self, v: f64) -> f64 {
        if self.resistance <= 0.0 {
            return 0.0;
        }
        v / self.resistance
    }
}

/// A capacitor.
///
/// Backward Euler turns `i = C dv/dt` into a Norton equivalent:
///   i(n) = Gc * v(n) - Gc * v(n-1),   Gc = C/dt
///
/// so the element stamps a conductance Gc in parallel with a history
/// current source Ieq = Gc * v(n-1).
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub capacitance: f64,
    /// Terminal voltage at the last committed step
    pub v_prev: f64,
    /// Terminal voltage one step before `v_prev`
    pub v_before: f64,
}

impl Capacitor {
    pub fn new(capacitance: f64) -> Self {
        Self {
            capacitance,
            v_prev: 0.0,
            v_before: 0.0,
        }
    }

    /// Equivalent conductance Gc = C/dt.
    pub fn conductance(&self, dt: f64) -> f64 {
        self.capacitance / dt
    }

    /// History current Ieq = Gc * v_prev, injected into the positive terminal.
    pub fn history_current(&self, dt: f64) -> f64 {
        self.conductance(dt) * self.v_prev
    }

    /// Commit the freshly solved terminal voltage.
    pub fn update_state(&mut self, v_new: f64) {
        self.v_before = self.v_prev;
        self.v_prev = v_new;
    }

    /// Current through the capacitor over the last committed step.
    pub fn current(&self, dt: f64) -> f64 {
        self.capacitance * (self.v_prev - self.v_before) / dt
    }
}

/// An inductor.
///
/// Backward Euler turns `v = L di/dt` into a branch constraint on the
/// inductor's auxiliary current unknown:
///   v(n) - Req * i(n) = -Req * i(n-1),   Req = L/dt
#[derive(Debug, Clone, PartialEq)]
pub struct Inductor {
    pub inductance: f64,
    /// Branch current at the last committed step
    pub i_prev: f64,
}

impl Inductor {
    pub fn new(inductance: f64) -> Self {
        Self {
            inductance,
            i_prev: 0.0,
        }
    }

    /// Equivalent series resistance Req = L/dt.
    pub fn resistance(&self, dt: f64) -> f64 {
        self.inductance / dt
    }

    /// History voltage Veq = -Req * i_prev.
    pub fn history_voltage(&self, dt: f64) -> f64 {
        -self.resistance(dt) * self.i_prev
    }

    /// Commit the freshly solved branch current.
    pub fn update_state(&mut self, i_new: f64) {
        self.i_prev = i_new;
    }
}
