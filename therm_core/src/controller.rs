//! Poll-cycle orchestration: sense, control, actuate, input, render.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use therm_traits::clock::{Clock, MonotonicClock};
use therm_traits::{AnalogInput, Display, HeaterOutput, TouchPanel};

use crate::control::{ControlLoop, HeaterMode};
use crate::error::{BuildError, ControllerError, Result};
use crate::input::{Edge, InputController};
use crate::sensor::{SensorCfg, SensorReader};
use crate::state::ControllerState;

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Valid reading; the control loop ran
    Nominal { temperature_c: f64, mode: HeaterMode },
    /// Invalid reading discarded; previous mode retained
    SensorSkipped,
}

/// The single-threaded controller. One `poll()` performs, in order:
/// sense temperature, evaluate the control loop, drive the relay,
/// sample touch input, dispatch button actions, render, then sleep the
/// poll period.
pub struct Controller<A, H, T, D>
where
    A: AnalogInput,
    H: HeaterOutput,
    T: TouchPanel,
    D: Display,
{
    adc: A,
    heater: H,
    touch: T,
    display: D,
    sensor: SensorReader,
    control: ControlLoop,
    input: InputController,
    state: ControllerState,
    clock: Arc<dyn Clock + Send + Sync>,
    poll_period: Duration,
    last_temperature_c: Option<f64>,
    skipped_reads: u64,
}

impl<A, H, T, D> std::fmt::Debug for Controller<A, H, T, D>
where
    A: AnalogInput,
    H: HeaterOutput,
    T: TouchPanel,
    D: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("poll_period", &self.poll_period)
            .field("last_temperature_c", &self.last_temperature_c)
            .field("skipped_reads", &self.skipped_reads)
            .finish_non_exhaustive()
    }
}

impl<A, H, T, D> Controller<A, H, T, D>
where
    A: AnalogInput,
    H: HeaterOutput,
    T: TouchPanel,
    D: Display,
{
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn mode(&self) -> HeaterMode {
        self.state.mode
    }

    /// Last valid temperature, if any reading has succeeded yet.
    pub fn last_temperature(&self) -> Option<f64> {
        self.last_temperature_c
    }

    pub fn skipped_reads(&self) -> u64 {
        self.skipped_reads
    }

    /// Display bring-up and initial render. A display that rejects its
    /// controller ID fails here, which aborts startup before the loop.
    pub fn init(&mut self) -> Result<()> {
        let shown = match self
            .sensor
            .read_temperature(&mut self.adc, self.clock.as_ref())
        {
            Ok(t) => {
                self.last_temperature_c = Some(t);
                t
            }
            Err(e) => {
                tracing::warn!(error = %e, "startup reading invalid; rendering placeholder");
                f64::NAN
            }
        };
        self.display
            .init(shown, self.state.setpoint_c, self.state.mode.label())
            .map_err(|e| eyre::Report::new(ControllerError::Display(e.to_string())))
            .wrap_err("display bring-up")?;
        for i in 0..self.input.buttons().len() {
            let label = self.input.buttons()[i].label().to_string();
            self.display
                .draw_button(&label, false)
                .map_err(|e| eyre::Report::new(ControllerError::Display(e.to_string())))
                .wrap_err("initial button render")?;
        }
        Ok(())
    }

    /// One iteration of the control loop.
    pub fn poll(&mut self) -> Result<PollOutcome> {
        // 1) sense + control. Invalid readings are discarded and the
        // previous mode retained; the disable override still applies.
        let outcome = match self
            .sensor
            .read_temperature(&mut self.adc, self.clock.as_ref())
        {
            Ok(t) => {
                self.last_temperature_c = Some(t);
                let mode = self.control.tick(t, &mut self.state);
                PollOutcome::Nominal {
                    temperature_c: t,
                    mode,
                }
            }
            Err(e) => {
                self.skipped_reads += 1;
                tracing::warn!(error = %e, "sensor reading discarded; holding mode");
                if !self.state.enabled {
                    self.state.mode = HeaterMode::Idle;
                }
                PollOutcome::SensorSkipped
            }
        };

        // 2) actuate. Written every poll so the relay is correct even
        // after a mode was forced without a transition.
        self.heater
            .set_on(self.state.mode.heater_on())
            .map_err(|e| eyre::Report::new(ControllerError::Hardware(e.to_string())))
            .wrap_err("heater actuation")?;

        // 3) touch + dispatch. A failed sample is "no touch", not an
        // error; the poll still completes.
        let sample = match self.touch.sample() {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::debug!(error = %e, "touch sample failed; treating as no touch");
                None
            }
        };
        let events = self.input.poll(sample.as_ref(), &mut self.state);

        // 4) render. Button faces follow their edges; the status region
        // is overwritten idempotently each poll.
        for ev in &events {
            let label = self.input.buttons()[ev.index].label().to_string();
            let pressed = matches!(ev.edge, Edge::Pressed);
            if let Err(e) = self.display.draw_button(&label, pressed) {
                tracing::warn!(error = %e, button = %label, "button redraw failed");
            }
        }
        let shown = self.last_temperature_c.unwrap_or(f64::NAN);
        if let Err(e) = self
            .display
            .update(shown, self.state.setpoint_c, self.state.mode.label())
        {
            tracing::warn!(error = %e, "display update failed");
        }

        self.clock.sleep(self.poll_period);
        Ok(outcome)
    }

    /// Best-effort safe shutdown: relay off.
    pub fn heater_off(&mut self) -> Result<()> {
        self.heater
            .set_on(false)
            .map_err(|e| eyre::Report::new(ControllerError::Hardware(e.to_string())))
            .wrap_err("heater off")
    }
}

/// Assemble a controller from configuration and the four hardware
/// seams. All config values are validated here; a bad sample count or
/// tolerance never reaches the loop.
pub fn build_controller<A, H, T, D>(
    adc: A,
    heater: H,
    touch: T,
    display: D,
    cfg: &therm_config::Config,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<Controller<A, H, T, D>>
where
    A: AnalogInput,
    H: HeaterOutput,
    T: TouchPanel,
    D: Display,
{
    if !(cfg.control.tolerance_c.is_finite() && cfg.control.tolerance_c > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tolerance must be > 0",
        )));
    }
    if !cfg.control.setpoint_c.is_finite() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "setpoint must be finite",
        )));
    }
    if cfg.control.poll_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "poll period must be >= 1 ms",
        )));
    }
    if cfg.buttons.is_empty() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "button layout must not be empty",
        )));
    }
    if cfg.touch.x_min >= cfg.touch.x_max || cfg.touch.y_min >= cfg.touch.y_max {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "touch axis bounds must satisfy min < max",
        )));
    }
    if cfg.touch.min_pressure >= cfg.touch.max_pressure {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "touch pressure band must satisfy min < max",
        )));
    }

    let sensor = SensorReader::new(SensorCfg::from_config(cfg)).map_err(eyre::Report::new)?;
    let input = InputController::from_config(cfg);
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(Controller {
        adc,
        heater,
        touch,
        display,
        sensor,
        control: ControlLoop::new(),
        input,
        state: ControllerState::new(cfg.control.setpoint_c, cfg.control.tolerance_c),
        clock,
        poll_period: Duration::from_millis(cfg.control.poll_ms),
        last_temperature_c: None,
        skipped_reads: 0,
    })
}
