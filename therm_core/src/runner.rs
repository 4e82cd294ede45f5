//! Main-loop driver: runs the controller until shutdown is requested
//! or a bounded poll count is reached, then parks the heater.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use therm_traits::{AnalogInput, Display, HeaterOutput, TouchPanel};

use crate::controller::{Controller, PollOutcome};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub polls: u64,
    pub skipped_reads: u64,
    pub uptime_ms: u64,
}

/// Drive the poll loop. `max_polls` bounds the run for simulations and
/// tests; `None` runs until the shutdown flag is set. The heater is
/// driven off on every exit path.
pub fn run_loop<A, H, T, D>(
    controller: &mut Controller<A, H, T, D>,
    shutdown: &Arc<AtomicBool>,
    max_polls: Option<u64>,
) -> Result<RunSummary>
where
    A: AnalogInput,
    H: HeaterOutput,
    T: TouchPanel,
    D: Display,
{
    let started = Instant::now();
    let mut polls: u64 = 0;

    let result = loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break Ok(());
        }
        if let Some(max) = max_polls
            && polls >= max
        {
            break Ok(());
        }
        match controller.poll() {
            Ok(PollOutcome::Nominal { temperature_c, mode }) => {
                tracing::trace!(temperature_c, ?mode, "poll");
            }
            Ok(PollOutcome::SensorSkipped) => {}
            Err(e) => break Err(e),
        }
        polls += 1;
    };

    // Park the relay no matter how the loop ended.
    if let Err(e) = controller.heater_off() {
        tracing::warn!(error = %e, "failed to park heater on exit");
    }

    let summary = RunSummary {
        polls,
        skipped_reads: controller.skipped_reads(),
        uptime_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
        polls = summary.polls,
        skipped_reads = summary.skipped_reads,
        uptime_ms = summary.uptime_ms,
        "run finished"
    );
    result.map(|()| summary)
}
