//! End-to-end emulation scenarios.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use hilsim_core::circuit::{ElementId, MAX_ELEMENTS, MAX_NODES};
use hilsim_core::components::ExternalSignal;
use hilsim_core::netlist;
use hilsim_core::solver::{AssemblyMode, SolverKind};
use hilsim_core::{Circuit, HilError, Simulator, SimulatorConfig, SystemStatus};

const ALL_SOLVERS: [SolverKind; 3] = [SolverKind::Gauss, SolverKind::GaussSeidel, SolverKind::Lu];

#[test]
fn ground_reads_zero_for_every_topology() {
    let netlists = [
        ".circuit 1 1u\nV1 1 0 3\nR1 1 0 10",
        ".circuit 2 1u\nI1 0 1 1m\nR1 1 2 1k\nC1 2 0 1u\nR2 2 0 1k",
        ".circuit 3 1u\nV1 1 0 SIN(0 1 50)\nR1 1 2 1\nL1 2 3 1m\nR2 3 0 5\nR3 2 0 100",
    ];
    for text in netlists {
        let build = netlist::load(text).unwrap();
        let mut sim = Simulator::with_config(build.circuit, build.config);
        for _ in 0..10 {
            sim.step().unwrap();
            assert_eq!(sim.node_voltage(0), 0.0);
        }
    }
}

#[test]
fn dc_source_across_resistor_all_solvers() {
    // Gauss-Seidel cannot handle the zero diagonal of a source aux row
    for solver in [SolverKind::Gauss, SolverKind::Lu] {
        let mut circuit = Circuit::new(1, 1e-4).unwrap();
        let v = circuit.add_voltage_source(1, 0, 12.0).unwrap();
        circuit.add_resistor(1, 0, 240.0).unwrap();

        let mut sim = Simulator::with_config(circuit, SimulatorConfig::new().with_solver(solver));
        sim.step().unwrap();
        assert_relative_eq!(sim.node_voltage(1), 12.0, max_relative = 1e-4);
        assert_relative_eq!(sim.element_current(v), -0.05, max_relative = 1e-4);
    }

    let mut circuit = Circuit::new(1, 1e-4).unwrap();
    circuit.add_voltage_source(1, 0, 12.0).unwrap();
    circuit.add_resistor(1, 0, 240.0).unwrap();
    let mut sim = Simulator::with_config(circuit, SimulatorConfig::new().with_solver(SolverKind::GaussSeidel));
    assert_eq!(sim.step_status(), SystemStatus::SolverPivot);
}

#[test]
fn norton_network_agrees_across_solvers() {
    let mut results = Vec::new();
    for solver in ALL_SOLVERS {
        let mut circuit = Circuit::new(3, 1e-5).unwrap();
        circuit.add_current_source(0, 1, 5e-3).unwrap();
        circuit.add_resistor(1, 0, 2e3).unwrap();
        circuit.add_resistor(1, 2, 1e3).unwrap();
        circuit.add_capacitor(2, 0, 1e-7).unwrap();
        circuit.add_resistor(2, 3, 1e3).unwrap();
        circuit.add_resistor(3, 0, 4e3).unwrap();

        let config = SimulatorConfig::new()
            .with_solver(solver)
            .with_tolerance(1e-9)
            .with_max_iterations(500);
        let mut sim = Simulator::with_config(circuit, config);
        for _ in 0..200 {
            sim.step().unwrap();
        }
        results.push([sim.node_voltage(1), sim.node_voltage(2), sim.node_voltage(3)]);
    }

    for r in &results[1..] {
        for (a, b) in r.iter().zip(&results[0]) {
            assert_relative_eq!(*a, *b, max_relative = 1e-5);
        }
    }
}

#[test]
fn rc_step_response_tracks_exponential() {
    let (v, r, c) = (3.3, 4.7e3, 2.2e-7);
    let tau = r * c;
    let dt = tau / 100.0;

    let mut circuit = Circuit::new(2, dt).unwrap();
    circuit.add_voltage_source(1, 0, v).unwrap();
    circuit.add_resistor(1, 2, r).unwrap();
    circuit.add_capacitor(2, 0, c).unwrap();

    let mut sim = Simulator::new(circuit);
    let steps = (5.0 * tau / dt).ceil() as usize;
    for k in 1..=steps {
        sim.step().unwrap();
        let expected = v * (1.0 - (-(k as f64) * dt / tau).exp());
        assert!((sim.node_voltage(2) - expected).abs() < 0.01 * v);
    }
}

#[test]
fn rl_step_response_tracks_exponential() {
    let (v, r, l) = (5.0, 20.0, 40e-3);
    let dt = 2e-5;
    let mut circuit = Circuit::new(2, dt).unwrap();
    circuit.add_voltage_source(1, 0, v).unwrap();
    circuit.add_resistor(1, 2, r).unwrap();
    let ind = circuit.add_inductor(2, 0, l).unwrap();
    circuit.add_resistor(2, 0, 1e5).unwrap();

    let mut sim = Simulator::new(circuit);
    let tau = l / r;
    let steps = (5.0 * tau / dt) as usize;
    for k in 1..=steps {
        sim.step().unwrap();
        let t = k as f64 * dt;
        let expected = v / r * (1.0 - (-t / tau).exp());
        assert!((sim.element_current(ind) - expected).abs() < 0.01 * v / r);
    }
}

#[test]
fn diagnostics_report_structural_faults() {
    // Node 2 has nothing attached
    let mut circuit = Circuit::new(2, 1e-4).unwrap();
    circuit.add_voltage_source(1, 0, 1.0).unwrap();
    circuit.add_resistor(1, 0, 1.0).unwrap();
    assert_eq!(Simulator::new(circuit).step_status(), SystemStatus::IsolatedNode);

    let mut circuit = Circuit::new(1, 1e-4).unwrap();
    circuit.add_voltage_source(1, 0, 1.0).unwrap();
    circuit.add_resistor(1, 0, 0.0).unwrap();
    assert_eq!(Simulator::new(circuit).step_status(), SystemStatus::InvalidElement);

    // Nodes 2 and 3 form an island with no path to ground
    let mut circuit = Circuit::new(3, 1e-4).unwrap();
    circuit.add_voltage_source(1, 0, 1.0).unwrap();
    circuit.add_resistor(1, 0, 1.0).unwrap();
    circuit.add_resistor(2, 3, 1.0).unwrap();
    circuit.add_capacitor(2, 3, 1e-6).unwrap();
    let mut sim = Simulator::new(circuit);
    let err = sim.step().unwrap_err();
    assert!(matches!(err, HilError::Singular { .. }));
    assert_eq!(err.status(), Some(SystemStatus::Singular));
    assert_eq!(sim.time(), 0.0);
}

#[test]
fn aux_slots_are_deterministic() {
    let mut circuit = Circuit::new(4, 1e-4).unwrap();
    let ids = [
        circuit.add_resistor(1, 0, 1.0).unwrap(),
        circuit.add_voltage_source(1, 0, 1.0).unwrap(),
        circuit.add_capacitor(2, 0, 1e-6).unwrap(),
        circuit.add_inductor(2, 3, 1e-3).unwrap(),
        circuit.add_vccs(3, 0, 1, 0, 1e-3).unwrap(),
        circuit.add_vcvs(4, 0, 2, 0, 2.0).unwrap(),
    ];
    let ccvs = circuit.add_ccvs(4, 3, ids[1], 10.0).unwrap();

    let aux: Vec<_> = ids
        .iter()
        .chain(std::iter::once(&ccvs))
        .map(|&id| circuit.element(id).unwrap().aux)
        .collect();
    assert_eq!(aux, vec![None, Some(4), None, Some(5), None, Some(6), Some(7)]);
    assert_eq!(circuit.system_size(), 8);
}

#[test]
fn three_phase_sources_keep_120_degree_spacing() {
    let freq = 50.0;
    let dt = 1e-4;
    let amplitude = 10.0;
    let phases = [0.0, -2.0 * PI / 3.0, 2.0 * PI / 3.0];

    let mut circuit = Circuit::new(3, dt).unwrap();
    for (i, &phase) in phases.iter().enumerate() {
        let node = i + 1;
        circuit.add_sine_source(node, 0, amplitude, 0.0, freq, phase).unwrap();
        circuit.add_resistor(node, 0, 100.0).unwrap();
    }
    let mut sim = Simulator::new(circuit);

    // Solution after step k corresponds to t = (k - 1) * dt
    let period_steps = (1.0 / freq / dt).round() as usize;
    let samples = [1, 1 + period_steps / 4, 1 + period_steps / 2];
    let mut step = 0;
    for &target in &samples {
        while step < target {
            sim.step().unwrap();
            step += 1;
        }
        let t = (step - 1) as f64 * dt;
        for (i, &phase) in phases.iter().enumerate() {
            let expected = amplitude * (2.0 * PI * freq * t + phase).sin();
            assert_relative_eq!(sim.node_voltage(i + 1), expected, epsilon = 1e-6);
        }
        // Balanced set sums to zero
        let sum: f64 = (1..=3).map(|n| sim.node_voltage(n)).sum();
        assert!(sum.abs() < 1e-6);
    }
}

#[test]
fn split_assembly_tracks_full_assembly() {
    let text = ".circuit 3 5u\nV1 1 0 PULSE(0 5 10u 5u 50u 5u 100u)\nR1 1 2 50\nC1 2 0 1u\n\
                S1 2 3 1 0 0.5 1M 2.5\nR2 3 0 200\n.rl LOAD 3 0 10 1m";
    let build = netlist::load(text).unwrap();
    let mut full = Simulator::new(build.circuit.clone());
    let mut split = Simulator::with_config(
        build.circuit,
        SimulatorConfig::new().with_assembly(AssemblyMode::Split),
    );
    for _ in 0..400 {
        full.step().unwrap();
        split.step().unwrap();
        assert_eq!(full.solution(), split.solution());
    }
}

#[test]
fn switch_lags_one_step_behind_control() {
    let mut circuit = Circuit::new(3, 1e-3).unwrap();
    circuit.add_voltage_source(1, 0, 10.0).unwrap();
    circuit.add_resistor(1, 2, 1e3).unwrap();
    circuit.add_switch(2, 0, 3, 0, 1.0, 1e6, 2.5).unwrap();
    let ctrl = circuit.add_voltage_source(3, 0, 0.0).unwrap();
    circuit.add_resistor(3, 0, 1e3).unwrap();

    let mut sim = Simulator::new(circuit);
    sim.step().unwrap();
    let open = sim.node_voltage(2);

    // Drive the control high; the switch only sees it on the following step
    sim.set_source(ctrl, hilsim_core::components::Source::Dc(5.0));
    sim.step().unwrap();
    assert_relative_eq!(sim.node_voltage(2), open, max_relative = 1e-12);

    sim.step().unwrap();
    assert!(sim.node_voltage(2) < 0.02);

    sim.set_source(ctrl, hilsim_core::components::Source::Dc(0.0));
    sim.step().unwrap();
    assert!(sim.node_voltage(2) < 0.02);
    sim.step().unwrap();
    assert_relative_eq!(sim.node_voltage(2), open, max_relative = 1e-9);
}

#[test]
fn external_signal_drives_source_live() {
    let signal = ExternalSignal::new(0.0);
    let mut circuit = Circuit::new(1, 1e-4).unwrap();
    let v = circuit.add_voltage_source(1, 0, 0.0).unwrap();
    circuit.add_resistor(1, 0, 1e3).unwrap();
    circuit.set_source_external(v, signal.clone(), 24.0, -12.0);

    let mut sim = Simulator::new(circuit);
    for (sample, expected) in [(0.0, -12.0), (0.5, 0.0), (1.0, 12.0)] {
        signal.set(sample);
        sim.step().unwrap();
        assert_relative_eq!(sim.node_voltage(1), expected, epsilon = 1e-9);
    }
}

#[test]
fn controlled_sources_solve_as_expected() {
    let mut circuit = Circuit::new(4, 1e-4).unwrap();
    let vin = circuit.add_voltage_source(1, 0, 2.0).unwrap();
    circuit.add_resistor(1, 0, 1e3).unwrap();
    // VCVS: V2 = 3 * V1
    circuit.add_vcvs(2, 0, 1, 0, 3.0).unwrap();
    circuit.add_resistor(2, 0, 1e3).unwrap();
    // VCCS: 1 mS * V1 pulled out of node 3 into ground through the source
    circuit.add_vccs(3, 0, 1, 0, 1e-3).unwrap();
    circuit.add_resistor(3, 0, 1e3).unwrap();
    // CCVS: V4 = 100 * I(vin)
    circuit.add_ccvs(4, 0, vin, 100.0).unwrap();
    circuit.add_resistor(4, 0, 1e3).unwrap();

    let mut sim = Simulator::new(circuit);
    sim.step().unwrap();

    assert_relative_eq!(sim.node_voltage(2), 6.0, epsilon = 1e-9);
    assert_relative_eq!(sim.node_voltage(3), -2.0, epsilon = 1e-9);
    assert_relative_eq!(sim.element_current(vin), -2e-3, epsilon = 1e-12);
    assert_relative_eq!(sim.node_voltage(4), -0.2, epsilon = 1e-9);
}

#[test]
fn self_sensing_vccs_acts_as_conductance() {
    let mut circuit = Circuit::new(1, 1e-4).unwrap();
    circuit.add_current_source(0, 1, 1e-3).unwrap();
    // Draws 2 mS * V1 out of node 1: a 500 ohm load
    circuit.add_vccs(1, 0, 1, 0, 2e-3).unwrap();

    for solver in ALL_SOLVERS {
        let mut sim = Simulator::with_config(circuit.clone(), SimulatorConfig::new().with_solver(solver));
        assert_eq!(sim.step_status(), SystemStatus::Ok);
        assert_relative_eq!(sim.node_voltage(1), 0.5, epsilon = 1e-6);
    }
}

#[test]
fn cccs_mirrors_controller_current() {
    let mut circuit = Circuit::new(2, 1e-4).unwrap();
    let vin = circuit.add_voltage_source(1, 0, 1.0).unwrap();
    circuit.add_resistor(1, 0, 100.0).unwrap();
    // I(vin) = -10 mA; 5x of it carried from ground into node 2 through the source
    circuit.add_cccs(0, 2, vin, 5.0).unwrap();
    circuit.add_resistor(2, 0, 10.0).unwrap();

    let mut sim = Simulator::new(circuit);
    sim.step().unwrap();
    assert_relative_eq!(sim.node_voltage(2), -0.5, epsilon = 1e-9);
}

#[test]
fn capacity_limits_are_enforced() {
    let mut circuit = Circuit::new(MAX_NODES, 1e-4).unwrap();
    for _ in 0..MAX_ELEMENTS {
        circuit.add_resistor(1, 0, 1.0).unwrap();
    }
    assert!(matches!(
        circuit.add_capacitor(2, 0, 1e-6),
        Err(HilError::CapacityExceeded { .. })
    ));
    assert!(matches!(
        circuit.add_series_rl(1, 2, 1.0, 1e-3),
        Err(HilError::CapacityExceeded { .. })
    ));
    assert_eq!(circuit.len(), MAX_ELEMENTS);
    assert_eq!(circuit.num_nodes(), MAX_NODES);
}

#[test]
fn out_of_range_reads_are_silent_zero() {
    let mut circuit = Circuit::new(1, 1e-4).unwrap();
    circuit.add_voltage_source(1, 0, 1.0).unwrap();
    let r = circuit.add_resistor(1, 0, 1.0).unwrap();
    let mut sim = Simulator::new(circuit);
    sim.step().unwrap();

    assert_eq!(sim.node_voltage(99), 0.0);
    assert_eq!(sim.element_current(ElementId(99)), 0.0);
    assert_eq!(sim.resistor_current(ElementId(99)), 0.0);
    assert_eq!(sim.capacitor_current(r), 0.0);
    assert!(matches!(sim.try_node_voltage(2), Err(HilError::InvalidIndex { .. })));
}
