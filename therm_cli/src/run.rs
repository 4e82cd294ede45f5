//! Command execution: backend assembly and loop driving.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::{Result, WrapErr};
use therm_config::{ActionCfg, Config};
use therm_core::{RunSummary, build_controller, run_loop};
use therm_traits::clock::{Clock, MonotonicClock};
use therm_traits::{AnalogInput, Display, HeaterOutput, TouchPanel};
use therm_ui::ConsoleDisplay;

#[cfg(not(feature = "hardware"))]
use therm_hardware::sim::{SimulatedAnalog, SimulatedRelay, SimulatedTouch, TouchWindow};

/// Invert the touch calibration: raw panel coordinates that land on
/// the given pixel, for scheduling simulated presses.
#[cfg(not(feature = "hardware"))]
fn raw_for_pixel(t: &therm_config::Touch, px: u16, py: u16) -> (u16, u16) {
    let span = |lo: u16, hi: u16, v: u16, size: u16| -> u16 {
        let (lo, hi, v, size) = (i64::from(lo), i64::from(hi), i64::from(v), i64::from(size));
        (lo + v * (hi - lo) / size).clamp(0, i64::from(u16::MAX)) as u16
    };
    let (x0, x1) = if t.invert_x {
        (t.x_max, t.x_min)
    } else {
        (t.x_min, t.x_max)
    };
    let (y0, y1) = if t.invert_y {
        (t.y_max, t.y_min)
    } else {
        (t.y_min, t.y_max)
    };
    let rx = span(x0, x1, px, t.width);
    let ry = span(y0, y1, py, t.height);
    if t.swap_axes { (ry, rx) } else { (rx, ry) }
}

/// Center pixel of the configured power button, if any.
#[cfg(not(feature = "hardware"))]
fn power_button_center(cfg: &Config) -> Option<(u16, u16)> {
    cfg.buttons
        .iter()
        .find(|b| matches!(b.action, ActionCfg::Power))
        .map(|b| (b.x.clamp(0, i32::from(u16::MAX)) as u16, b.y.clamp(0, i32::from(u16::MAX)) as u16))
}

fn drive<A, H, T, D>(
    cfg: &Config,
    adc: A,
    heater: H,
    touch: T,
    display: D,
    max_polls: Option<u64>,
) -> Result<(RunSummary, Option<f64>)>
where
    A: AnalogInput,
    H: HeaterOutput,
    T: TouchPanel,
    D: Display,
{
    let mut controller = build_controller(adc, heater, touch, display, cfg, None)?;
    controller.init()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let s = shutdown.clone();
        ctrlc::set_handler(move || s.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let summary = run_loop(&mut controller, &shutdown, max_polls)?;
    Ok((summary, controller.last_temperature()))
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    cfg: &Config,
    setpoint: Option<f64>,
    tolerance: Option<f64>,
    max_polls: Option<u64>,
    enable: bool,
    ambient: f64,
    json: bool,
) -> Result<()> {
    let mut cfg = cfg.clone();
    if let Some(s) = setpoint {
        cfg.control.setpoint_c = s;
    }
    if let Some(t) = tolerance {
        cfg.control.tolerance_c = t;
    }
    cfg.validate()?;

    let display = ConsoleDisplay::stdout(cfg.display.controller_id);

    #[cfg(not(feature = "hardware"))]
    let (summary, final_temp) = {
        let relay = SimulatedRelay::new();
        let plant = SimulatedAnalog::new(&cfg, ambient, relay.state_handle());
        let touch = if enable {
            match power_button_center(&cfg) {
                Some((px, py)) => {
                    let (x, y) = raw_for_pixel(&cfg.touch, px, py);
                    let pressure = cfg.touch.min_pressure / 2 + cfg.touch.max_pressure / 2;
                    SimulatedTouch::new(
                        vec![TouchWindow {
                            start_poll: 1,
                            end_poll: 1,
                            x,
                            y,
                        }],
                        pressure,
                    )
                }
                None => {
                    tracing::warn!("--enable given but no power button is configured");
                    SimulatedTouch::idle()
                }
            }
        } else {
            SimulatedTouch::idle()
        };
        drive(&cfg, plant, relay, touch, display, max_polls)?
    };

    #[cfg(feature = "hardware")]
    let (summary, final_temp) = {
        let _ = (enable, ambient);
        let (adc, relay, touch) = hw::assemble(&cfg)?;
        drive(&cfg, adc, relay, touch, display, max_polls)?
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "polls": summary.polls,
                "skipped_reads": summary.skipped_reads,
                "uptime_ms": summary.uptime_ms,
                "final_temp_c": final_temp,
            })
        );
    } else {
        println!(
            "run complete: polls={} skipped_reads={} uptime_ms={}",
            summary.polls, summary.skipped_reads, summary.uptime_ms
        );
        if let Some(t) = final_temp {
            println!("final temperature: {t:.2} C");
        }
    }
    Ok(())
}

pub fn read_temp(cfg: &Config, count: u32, ambient: f64, json: bool) -> Result<()> {
    let sensor = therm_core::SensorReader::new(therm_core::SensorCfg::from_config(cfg))
        .map_err(eyre::Report::new)?;
    let clock = MonotonicClock::new();

    #[cfg(not(feature = "hardware"))]
    let mut adc = SimulatedAnalog::free_running(cfg, ambient);
    #[cfg(feature = "hardware")]
    let mut adc = {
        let _ = ambient;
        hw::adc_only()?
    };

    for _ in 0..count {
        let t = sensor.read_temperature(&mut adc, &clock as &dyn Clock)?;
        if json {
            println!("{}", serde_json::json!({ "temperature_c": t }));
        } else {
            println!("temperature {t:.2} C");
        }
    }
    Ok(())
}

pub fn self_check(cfg: &Config, json: bool) -> Result<()> {
    // Bring up every seam once: one valid reading, one display init,
    // one relay write.
    let display = ConsoleDisplay::new(std::io::sink(), cfg.display.controller_id);

    #[cfg(not(feature = "hardware"))]
    let (summary, _) = {
        let relay = SimulatedRelay::new();
        let plant = SimulatedAnalog::new(cfg, 20.0, relay.state_handle());
        drive(cfg, plant, relay, SimulatedTouch::idle(), display, Some(1))?
    };
    #[cfg(feature = "hardware")]
    let (summary, _) = {
        let (adc, relay, touch) = hw::assemble(cfg)?;
        drive(cfg, adc, relay, touch, display, Some(1))?
    };

    if summary.skipped_reads > 0 {
        eyre::bail!("self-check failed: sensor returned no valid reading");
    }
    if json {
        println!("{}", serde_json::json!({ "status": "ok" }));
    } else {
        println!("self-check ok");
    }
    Ok(())
}

#[cfg(feature = "hardware")]
mod hw {
    use eyre::Result;
    use rppal::spi::{Bus, SlaveSelect};
    use therm_config::Config;
    use therm_hardware::mcp3008::{FourWireTouch, GpioBus, Mcp3008, RelayPin, SharedMcp3008};

    // MCP3008 channel assignment for the touch sense lines
    const TOUCH_X_CHANNEL: u8 = 0;
    const TOUCH_Y_CHANNEL: u8 = 1;
    const TOUCH_Z_CHANNEL: u8 = 2;
    const SPI_CLOCK_HZ: u32 = 1_350_000;

    pub fn assemble(cfg: &Config) -> Result<(SharedMcp3008, RelayPin, FourWireTouch)> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| eyre::eyre!("open gpio: {e}"))?;
        let relay = RelayPin::new(&gpio, cfg.pins.heater_pin)?;
        let adc = SharedMcp3008::new(Mcp3008::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ)?);
        let touch = FourWireTouch::new(
            GpioBus::new()?,
            adc.clone(),
            &cfg.pins,
            TOUCH_X_CHANNEL,
            TOUCH_Y_CHANNEL,
            TOUCH_Z_CHANNEL,
        );
        Ok((adc, relay, touch))
    }

    pub fn adc_only() -> Result<Mcp3008> {
        Ok(Mcp3008::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ)?)
    }
}
