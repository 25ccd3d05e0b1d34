//! HILSim - real-time circuit emulator CLI
//!
//! Emulates an analog network described by a netlist, driven by live
//! samples and producing actuation codes.
//!
//! # Usage
//!
//! ```bash
//! adc-capture --f32le | hilsim plant.cir --realtime --pwm-max 4095 | pwm-writer --u16le
//! ```

use std::io;
use std::path::PathBuf;

use clap::Parser;
use hilsim_core::{
    driver::{run, DriverOptions},
    error::Result,
    netlist,
    solver::{AssemblyMode, SolverKind},
    Simulator,
};
use log::info;

/// Real-time hardware-in-the-loop circuit emulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file
    #[arg(value_name = "NETLIST")]
    netlist: PathBuf,

    /// Pace steps at the circuit time step
    #[arg(long)]
    realtime: bool,

    /// Stop after this many steps
    #[arg(long)]
    steps: Option<u64>,

    /// Full-scale actuation code for every probe
    #[arg(long)]
    pwm_max: Option<u16>,

    /// Rewind simulation time by this period (seconds) to keep sources phase-accurate
    #[arg(long)]
    wrap_period: Option<f64>,

    /// Override the netlist's solver (gauss, seidel, lu)
    #[arg(long)]
    solver: Option<SolverKind>,

    /// Override the netlist's assembly mode (full, split)
    #[arg(long)]
    assembly: Option<AssemblyMode>,

    /// Print the element table to stderr before running
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Parse and build the netlist
    let build = netlist::load_file(&args.netlist)?;

    if args.list {
        eprintln!("{}", build.circuit);
    }

    let mut config = build.config.clone();
    if let Some(solver) = args.solver {
        config = config.with_solver(solver);
    }
    if let Some(assembly) = args.assembly {
        config = config.with_assembly(assembly);
    }

    let mut simulator = Simulator::with_config(build.circuit, config);

    let options = DriverOptions {
        realtime: args.realtime,
        max_steps: args.steps,
        pwm_max: args.pwm_max,
        wrap_period: args.wrap_period,
    };

    let stats = run(
        &mut simulator,
        &build.channels,
        &build.probes,
        &options,
        io::stdin().lock(),
        io::stdout().lock(),
    )?;

    info!(
        "done: {} frames, {} failed steps, last status {}",
        stats.frames, stats.failures, stats.last_status
    );
    Ok(())
}
