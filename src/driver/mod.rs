//! Real-time driver for the CLI frontend.
//!
//! Reads frames of little-endian `f32` samples (one per external channel),
//! runs one engine step per frame and writes one little-endian `u16`
//! actuation code per probe.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::components::ExternalSignal;
use crate::conditioning::Probe;
use crate::error::{HilError, Result, SystemStatus};
use crate::solver::Simulator;

/// Log every n-th consecutive step failure after the first.
const FAILURE_LOG_INTERVAL: u64 = 1000;

/// Frame reader for external samples.
pub struct SampleInput<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: Read> SampleInput<R> {
    /// Create a reader for frames of `channels` samples.
    pub fn new(reader: R, channels: usize) -> Self {
        Self {
            reader,
            buffer: vec![0u8; channels * 4], // 4 bytes per f32
        }
    }

    /// Read one frame. Returns `false` on a clean end of stream.
    pub fn read_frame(&mut self, samples: &mut [f32]) -> Result<bool> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HilError::SampleInputError {
                        message: e.to_string(),
                    })
                }
            }
        }

        if filled == 0 && !self.buffer.is_empty() {
            return Ok(false);
        }
        if filled < self.buffer.len() {
            return Err(HilError::SampleInputError {
                message: format!("truncated frame ({} of {} bytes)", filled, self.buffer.len()),
            });
        }

        for (sample, bytes) in samples.iter_mut().zip(self.buffer.chunks_exact(4)) {
            *sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(true)
    }
}

/// Actuation code writer.
pub struct CodeOutput<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> CodeOutput<W> {
    pub fn new(writer: W, probes: usize) -> Self {
        Self {
            writer,
            buffer: vec![0u8; probes * 2],
        }
    }

    /// Write one frame of codes.
    pub fn write_frame(&mut self, codes: &[u16]) -> Result<()> {
        for (chunk, code) in self.buffer.chunks_exact_mut(2).zip(codes) {
            chunk.copy_from_slice(&code.to_le_bytes());
        }
        self.writer
            .write_all(&self.buffer)
            .map_err(|e| HilError::SampleOutputError {
                message: e.to_string(),
            })
    }

    /// Flush the output stream.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| HilError::SampleOutputError {
            message: e.to_string(),
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Fixed-cadence pacing with an accumulated deadline.
///
/// Each deadline is the previous deadline plus the period, never "now plus
/// period", so scheduling jitter does not accumulate into drift.
pub struct StepClock {
    period: Duration,
    next_deadline: Instant,
}

impl StepClock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: Instant::now() + period,
        }
    }

    /// Block until the next deadline, then schedule the one after it.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next_deadline > now {
            thread::sleep(self.next_deadline - now);
        }
        self.next_deadline += self.period;
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }
}

/// Driver options.
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// Pace steps at the circuit time step
    pub realtime: bool,
    /// Stop after this many frames
    pub max_steps: Option<u64>,
    /// Full-scale actuation code applied to every probe
    pub pwm_max: Option<u16>,
    /// Rewind the simulation clock by this period whenever it is reached
    pub wrap_period: Option<f64>,
}

/// Summary of a driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Frames processed
    pub frames: u64,
    /// Steps that failed
    pub failures: u64,
    /// Status of the last step
    pub last_status: SystemStatus,
}

/// Run the emulator against a frame stream.
///
/// A failed step keeps the previous actuation codes; the stream continues.
pub fn run<R: Read, W: Write>(
    sim: &mut Simulator,
    channels: &[ExternalSignal],
    probes: &[Probe],
    options: &DriverOptions,
    reader: R,
    writer: W,
) -> Result<RunStats> {
    let mut probes = probes.to_vec();
    if let Some(full_scale) = options.pwm_max {
        for probe in &mut probes {
            probe.map.full_scale = full_scale;
        }
    }

    let mut input = SampleInput::new(reader, channels.len());
    let mut output = CodeOutput::new(writer, probes.len());
    let mut samples = vec![0.0f32; channels.len()];
    let mut codes = vec![0u16; probes.len()];
    let mut clock = options
        .realtime
        .then(|| StepClock::new(Duration::from_secs_f64(sim.dt())));

    let mut stats = RunStats {
        frames: 0,
        failures: 0,
        last_status: SystemStatus::Ok,
    };
    let mut consecutive_failures = 0u64;

    info!(
        "driver start: {} channels, {} probes, realtime={}",
        channels.len(),
        probes.len(),
        options.realtime
    );

    loop {
        if options.max_steps.is_some_and(|max| stats.frames >= max) {
            break;
        }
        if !channels.is_empty() && !input.read_frame(&mut samples)? {
            break;
        }
        for (signal, &sample) in channels.iter().zip(&samples) {
            signal.set(f64::from(sample));
        }

        if let Some(clock) = clock.as_mut() {
            clock.wait();
        }

        let status = sim.step_status();
        if status.is_ok() {
            consecutive_failures = 0;
            for (code, probe) in codes.iter_mut().zip(&probes) {
                *code = probe.sample(sim);
            }
        } else {
            stats.failures += 1;
            if consecutive_failures % FAILURE_LOG_INTERVAL == 0 {
                warn!("step failed at t={:.6}: {} (holding outputs)", sim.time(), status);
            }
            consecutive_failures += 1;
        }
        stats.last_status = status;

        if let Some(period) = options.wrap_period {
            if period > 0.0 && sim.time() >= period {
                sim.set_time(sim.time() - period);
            }
        }

        output.write_frame(&codes)?;
        stats.frames += 1;
    }

    output.flush()?;
    info!("driver stop: {} frames, {} failures", stats.frames, stats.failures);
    Ok(stats)
}
