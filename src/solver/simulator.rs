//! Time-stepping engine.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};

use crate::circuit::{check_system, Circuit, ElementId, NodeId};
use crate::components::{ElementKind, ExternalSignal, Pulse, Source};
use crate::error::{HilError, Result, SystemStatus};

use super::mna::{assemble_dynamic, assemble_full, assemble_static, voltage_in, MnaMatrix};
use super::{LinearSolver, Solver, SolverKind, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};

/// How the system is rebuilt each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyMode {
    /// Clear and stamp every element every step
    #[default]
    Full,
    /// Stamp static elements once, then only the dynamic ones per step
    Split,
}

impl FromStr for AssemblyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "split" => Ok(Self::Split),
            other => Err(format!("unknown assembly mode '{}'", other)),
        }
    }
}

impl fmt::Display for AssemblyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Split => f.write_str("split"),
        }
    }
}

/// Configuration for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Linear solver algorithm.
    pub solver: SolverKind,
    /// Assembly strategy.
    pub assembly: AssemblyMode,
    /// Gauss-Seidel iteration cap.
    pub max_iterations: usize,
    /// Gauss-Seidel convergence tolerance.
    pub tolerance: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            assembly: AssemblyMode::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the linear solver.
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Select the assembly strategy.
    pub fn with_assembly(mut self, assembly: AssemblyMode) -> Self {
        self.assembly = assembly;
        self
    }

    /// Set the Gauss-Seidel iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the Gauss-Seidel convergence tolerance.
    ///
    /// The bound applies to the largest change of any unknown in one sweep.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Circuit handed over, no step attempted yet
    Built,
    /// At least one step attempted
    Stepping,
}

/// The real-time circuit emulator.
///
/// Owns the circuit, so the topology is frozen once stepping can begin.
/// All buffers are allocated here; [`Simulator::step`] does not allocate.
pub struct Simulator {
    /// The circuit being emulated
    circuit: Circuit,
    /// Working system, rebuilt every step
    matrix: MnaMatrix,
    /// Static stamps, present in split mode
    static_system: Option<MnaMatrix>,
    solver: Solver,
    /// Last successfully solved unknowns
    solution: Vec<f64>,
    /// Simulation time of the next step
    time: f64,
    state: EngineState,
    /// Successful steps taken
    steps: u64,
    config: SimulatorConfig,
}

impl Simulator {
    /// Create a new simulator for the given circuit with default configuration.
    pub fn new(circuit: Circuit) -> Self {
        Self::with_config(circuit, SimulatorConfig::default())
    }

    /// Create a new simulator for the given circuit with custom configuration.
    pub fn with_config(circuit: Circuit, config: SimulatorConfig) -> Self {
        let size = circuit.system_size();
        let matrix = MnaMatrix::new(size);
        let solver = Solver::new(config.solver, config.max_iterations, config.tolerance);

        let static_system = match config.assembly {
            AssemblyMode::Full => None,
            AssemblyMode::Split => {
                let mut snapshot = MnaMatrix::new(size);
                assemble_static(&circuit, &mut snapshot);
                Some(snapshot)
            }
        };

        debug!(
            "simulator ready: {} nodes, {} aux, solver {}, {} assembly",
            circuit.num_nodes(),
            circuit.num_aux(),
            config.solver,
            config.assembly
        );

        Self {
            circuit,
            matrix,
            static_system,
            solver,
            solution: vec![0.0; size],
            time: 0.0,
            state: EngineState::Built,
            steps: 0,
            config,
        }
    }

    /// Advance the emulation by one time step.
    ///
    /// On failure nothing persisted changes: time, reactive history and the
    /// committed solution all keep their previous values.
    pub fn step(&mut self) -> Result<()> {
        self.state = EngineState::Stepping;

        match &self.static_system {
            Some(snapshot) => {
                self.matrix.copy_from(snapshot);
                assemble_dynamic(&self.circuit, &mut self.matrix, self.time, &self.solution);
            }
            None => assemble_full(&self.circuit, &mut self.matrix, self.time, &self.solution),
        }

        if let Err(e) = check_system(&self.circuit, &self.matrix) {
            debug!("diagnostics failed at t={:.6}: {}", self.time, e);
            return Err(e);
        }

        // Warm start for the iterative solver
        let n = self.matrix.size;
        self.matrix.x[..n].copy_from_slice(&self.solution);

        if let Err(e) = self.solver.solve(&mut self.matrix) {
            debug!("{} solver failed at t={:.6}: {}", self.solver.name(), self.time, e);
            return Err(e);
        }

        self.commit();
        trace!("step {} done, t={:.6}", self.steps, self.time);
        Ok(())
    }

    /// Advance one step and report the outcome as a status code.
    pub fn step_status(&mut self) -> SystemStatus {
        match self.step() {
            Ok(()) => SystemStatus::Ok,
            Err(e) => e.status().unwrap_or(SystemStatus::Singular),
        }
    }

    /// Copy the fresh solution into persisted state and advance time.
    fn commit(&mut self) {
        let n = self.matrix.size;
        self.solution.copy_from_slice(&self.matrix.x[..n]);

        let solution = &self.solution;
        for element in self.circuit.elements_mut() {
            match &mut element.kind {
                ElementKind::Capacitor(c) => {
                    let v = voltage_in(solution, element.nodes[0]) - voltage_in(solution, element.nodes[1]);
                    c.update_state(v);
                }
                ElementKind::Inductor(l) => {
                    if let Some(k) = element.aux {
                        l.update_state(solution[k]);
                    }
                }
                _ => {}
            }
        }

        self.time += self.circuit.dt();
        self.steps += 1;
    }

    // ============ Read-back ============

    /// Voltage of a node after the last successful step.
    ///
    /// Ground and out-of-range nodes read 0.
    pub fn node_voltage(&self, node: usize) -> f64 {
        self.try_node_voltage(node).unwrap_or(0.0)
    }

    /// Voltage of a node, rejecting indices the circuit does not have.
    pub fn try_node_voltage(&self, node: usize) -> Result<f64> {
        if node > self.circuit.num_nodes() {
            return Err(HilError::InvalidIndex {
                kind: "node",
                index: node,
                limit: self.circuit.num_nodes(),
            });
        }
        Ok(voltage_in(&self.solution, node.into()))
    }

    /// Auxiliary current of a voltage source, inductor, VCVS or CCVS.
    ///
    /// Elements without an aux unknown read 0.
    pub fn element_current(&self, id: ElementId) -> f64 {
        self.circuit
            .element(id)
            .and_then(|e| e.aux)
            .map_or(0.0, |k| self.solution[k])
    }

    /// Current through a resistor from its first to its second terminal.
    pub fn resistor_current(&self, id: ElementId) -> f64 {
        match self.circuit.element(id) {
            Some(e) => match &e.kind {
                ElementKind::Resistor(r) => r.current(self.branch_voltage(e.nodes)),
                _ => 0.0,
            },
            None => 0.0,
        }
    }

    /// Current into a capacitor over the last successful step.
    pub fn capacitor_current(&self, id: ElementId) -> f64 {
        match self.circuit.element(id).map(|e| &e.kind) {
            Some(ElementKind::Capacitor(c)) => c.current(self.circuit.dt()),
            _ => 0.0,
        }
    }

    fn branch_voltage(&self, nodes: [NodeId; 2]) -> f64 {
        voltage_in(&self.solution, nodes[0]) - voltage_in(&self.solution, nodes[1])
    }

    /// Committed unknowns: node voltages then aux currents.
    pub fn solution(&self) -> &[f64] {
        &self.solution
    }

    // ============ Source Updates ============

    pub fn set_source(&mut self, id: ElementId, source: Source) {
        self.circuit.set_source(id, source);
    }

    pub fn set_source_sine(&mut self, id: ElementId, offset: f64, amplitude: f64, frequency: f64, phase: f64) {
        self.circuit.set_source_sine(id, offset, amplitude, frequency, phase);
    }

    pub fn set_source_pulse(&mut self, id: ElementId, pulse: Pulse) {
        self.circuit.set_source_pulse(id, pulse);
    }

    pub fn set_source_external(&mut self, id: ElementId, signal: ExternalSignal, gain: f64, offset: f64) {
        self.circuit.set_source_external(id, signal, gain, offset);
    }

    // ============ Accessors ============

    /// Simulation time the next step will evaluate sources at.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Move the simulation clock, e.g. to wrap it at a whole source period.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn dt(&self) -> f64 {
        self.circuit.dt()
    }

    /// Number of successful steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Get a reference to the circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rc_circuit(v: f64, r: f64, c: f64, dt: f64) -> Circuit {
        let mut circuit = Circuit::new(2, dt).unwrap();
        circuit.add_voltage_source(1, 0, v).unwrap();
        circuit.add_resistor(1, 2, r).unwrap();
        circuit.add_capacitor(2, 0, c).unwrap();
        circuit
    }

    #[test]
    fn test_resistor_across_source() {
        let mut circuit = Circuit::new(1, 1e-4).unwrap();
        let v = circuit.add_voltage_source(1, 0, 5.0).unwrap();
        let r = circuit.add_resistor(1, 0, 1000.0).unwrap();

        let mut sim = Simulator::new(circuit);
        assert_eq!(sim.state(), EngineState::Built);
        sim.step().unwrap();

        assert_eq!(sim.state(), EngineState::Stepping);
        assert_relative_eq!(sim.node_voltage(1), 5.0, max_relative = 1e-4);
        assert_relative_eq!(sim.element_current(v), -5e-3, max_relative = 1e-4);
        assert_relative_eq!(sim.resistor_current(r), 5e-3, max_relative = 1e-4);
        assert_eq!(sim.node_voltage(0), 0.0);
        assert_eq!(sim.node_voltage(7), 0.0);
        assert!(sim.try_node_voltage(7).is_err());
        assert_eq!(sim.element_current(r), 0.0);
    }

    #[test]
    fn test_rc_charging() {
        let (v, r, c) = (5.0, 1e3, 1e-6);
        let tau = r * c;
        let dt = tau / 100.0;
        let mut sim = Simulator::new(rc_circuit(v, r, c, dt));

        for k in 1..=500 {
            sim.step().unwrap();
            let t = k as f64 * dt;
            let expected = v * (1.0 - (-t / tau).exp());
            assert!((sim.node_voltage(2) - expected).abs() < 0.01 * v, "step {}", k);
        }
        assert_relative_eq!(sim.node_voltage(2), v, max_relative = 0.01);
    }

    #[test]
    fn test_capacitor_current_matches_series_resistor() {
        let mut sim = Simulator::new(rc_circuit(5.0, 1e3, 1e-6, 1e-5));
        for _ in 0..30 {
            sim.step().unwrap();
        }
        let i_r = sim.resistor_current(ElementId(1));
        let i_c = sim.capacitor_current(ElementId(2));
        assert!(i_r > 0.0);
        assert_relative_eq!(i_c, i_r, max_relative = 1e-6);
    }

    #[test]
    fn test_rl_current_rise() {
        let (v, r, l) = (1.0, 10.0, 10e-3);
        let dt = 1e-5;
        let mut circuit = Circuit::new(2, dt).unwrap();
        circuit.add_voltage_source(1, 0, v).unwrap();
        circuit.add_resistor(1, 2, r).unwrap();
        let ind = circuit.add_inductor(2, 0, l).unwrap();
        circuit.add_resistor(2, 0, 10e3).unwrap();

        for solver in [SolverKind::Gauss, SolverKind::Lu] {
            let config = SimulatorConfig::new().with_solver(solver);
            let mut sim = Simulator::with_config(circuit.clone(), config);
            for k in 1..=500 {
                sim.step().unwrap();
                let t = k as f64 * dt;
                let expected = v / r * (1.0 - (-t * r / l).exp());
                assert!(
                    (sim.element_current(ind) - expected).abs() < 0.01 * v / r,
                    "{} step {}",
                    solver,
                    k
                );
            }
        }
    }

    #[test]
    fn test_switch_uses_previous_step_control() {
        let dt = 1e-3;
        let mut circuit = Circuit::new(3, dt).unwrap();
        circuit.add_voltage_source(1, 0, 10.0).unwrap();
        circuit.add_resistor(1, 2, 1e3).unwrap();
        circuit.add_switch(2, 0, 3, 0, 1.0, 1e6, 2.5).unwrap();
        let ctrl = circuit.add_voltage_source(3, 0, 0.0).unwrap();
        circuit.add_resistor(3, 0, 1e3).unwrap();
        circuit.set_source_pulse(
            ctrl,
            Pulse {
                v1: 0.0,
                v2: 5.0,
                delay: 0.5e-3,
                rise: 0.0,
                width: 1.0,
                fall: 0.0,
                period: 10.0,
            },
        );

        let mut sim = Simulator::new(circuit);
        sim.step().unwrap();
        assert_relative_eq!(sim.node_voltage(2), 10.0 * 1e6 / (1e6 + 1e3), max_relative = 1e-6);

        // Control goes high during this step, switch still open
        sim.step().unwrap();
        assert_relative_eq!(sim.node_voltage(3), 5.0, max_relative = 1e-9);
        assert_relative_eq!(sim.node_voltage(2), 10.0 * 1e6 / (1e6 + 1e3), max_relative = 1e-6);

        sim.step().unwrap();
        assert_relative_eq!(sim.node_voltage(2), 10.0 / 1001.0, max_relative = 1e-6);
    }

    #[test]
    fn test_failed_step_keeps_state() {
        let mut circuit = Circuit::new(1, 1e-4).unwrap();
        circuit.add_current_source(0, 1, 1e-3).unwrap();
        circuit.add_resistor(1, 0, 1e3).unwrap();
        let cap = circuit.add_capacitor(1, 0, 1e-6).unwrap();

        let config = SimulatorConfig::new()
            .with_solver(SolverKind::GaussSeidel)
            .with_max_iterations(1)
            .with_tolerance(1e-12);
        let mut sim = Simulator::with_config(circuit, config);

        assert_eq!(sim.step_status(), SystemStatus::SolverNonConvergence);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.node_voltage(1), 0.0);
        assert_eq!(sim.capacitor_current(cap), 0.0);
        match sim.circuit().element(cap).map(|e| &e.kind) {
            Some(ElementKind::Capacitor(c)) => assert_eq!(c.v_prev, 0.0),
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn test_invalid_element_status() {
        let mut circuit = Circuit::new(1, 1e-4).unwrap();
        circuit.add_voltage_source(1, 0, 1.0).unwrap();
        circuit.add_resistor(1, 0, -5.0).unwrap();
        let mut sim = Simulator::new(circuit);
        assert_eq!(sim.step_status(), SystemStatus::InvalidElement);
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn test_gauss_seidel_on_nodal_network() {
        let mut circuit = Circuit::new(2, 1e-4).unwrap();
        circuit.add_current_source(0, 1, 2e-3).unwrap();
        circuit.add_resistor(1, 0, 1e3).unwrap();
        circuit.add_resistor(1, 2, 1e3).unwrap();
        circuit.add_resistor(2, 0, 1e3).unwrap();

        let config = SimulatorConfig::new().with_solver(SolverKind::GaussSeidel);
        let mut sim = Simulator::with_config(circuit, config);
        sim.step().unwrap();

        // 2 mA into 1k || 2k
        assert_relative_eq!(sim.node_voltage(1), 4.0 / 3.0, epsilon = 1e-3);
        assert_relative_eq!(sim.node_voltage(2), 2.0 / 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_split_assembly_matches_full() {
        let mut circuit = Circuit::new(3, 1e-4).unwrap();
        circuit.add_sine_source(1, 0, 10.0, 0.0, 50.0, 0.0).unwrap();
        circuit.add_resistor(1, 2, 100.0).unwrap();
        circuit.add_capacitor(2, 0, 10e-6).unwrap();
        circuit.add_series_rl(2, 3, 5.0, 1e-3).unwrap();
        circuit.add_resistor(3, 0, 50.0).unwrap();

        let mut full = Simulator::new(circuit.clone());
        let mut split = Simulator::with_config(circuit, SimulatorConfig::new().with_assembly(AssemblyMode::Split));

        for _ in 0..50 {
            full.step().unwrap();
            split.step().unwrap();
            assert_eq!(full.solution(), split.solution());
        }
    }

    #[test]
    fn test_set_time_wraps_clock() {
        let mut sim = Simulator::new(rc_circuit(1.0, 1e3, 1e-6, 1e-4));
        sim.step().unwrap();
        assert_relative_eq!(sim.time(), 1e-4);
        sim.set_time(0.0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.steps(), 1);
    }
}
