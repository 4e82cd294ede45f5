//! Full poll-cycle tests: sense -> control -> actuate -> input ->
//! render, driven through the mock seams with a deterministic clock.
//!
//! Fixture: 10-bit ADC, 5.0 V reference and supply, 10 kOhm low-side
//! divider, Steinhart-Hart coefficients for a standard 10 kOhm NTC.
//! Precomputed counts:
//!   512  -> ~25.0 C (inside the 24..26 band)
//!   600  -> ~17.2 C (below band, heat demand)
//!   420  -> ~33.4 C (above band, cool demand)
//!   1023 -> divider rail, infinite resistance, invalid

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use therm_config::{Adc, Config, Control, PolynomialCfg, Topology, Touch};
use therm_core::mocks::{DisplayLog, NullDisplay, ScriptedAnalog, ScriptedTouch, SpyHeater};
use therm_core::{Controller, HeaterMode, PollOutcome, build_controller, run_loop};
use therm_traits::RawTouch;
use therm_traits::clock::test_clock::TestClock;

const COUNT_IN_BAND: u16 = 512;
const COUNT_COLD: u16 = 600;
const COUNT_HOT: u16 = 420;
const COUNT_RAIL: u16 = 1023;

fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.adc = Adc {
        resolution_bits: 10,
        reference_voltage: 5.0,
        samples: 1,
        settle_ms: 0,
    };
    cfg.sensor.supply_voltage = 5.0;
    cfg.sensor.fixed_resistance_ohms = 10_000.0;
    cfg.sensor.topology = Topology::Low;
    cfg.sensor.polynomial = PolynomialCfg::SteinhartHart {
        a: 1.129148e-3,
        b: 2.34125e-4,
        c: 8.76741e-8,
    };
    cfg.control = Control {
        setpoint_c: 25.0,
        tolerance_c: 1.0,
        poll_ms: 1,
    };
    // Identity calibration: raw coordinates are already pixels
    cfg.touch = Touch {
        min_pressure: 10,
        max_pressure: 2000,
        x_min: 0,
        x_max: 320,
        y_min: 0,
        y_max: 240,
        swap_axes: false,
        invert_x: false,
        invert_y: false,
        width: 320,
        height: 240,
    };
    cfg
}

/// A touch landing on the center of a default-layout button.
fn touch_at(x: u16, y: u16) -> RawTouch {
    RawTouch {
        x,
        y,
        pressure: 100,
    }
}

fn no_touch() -> RawTouch {
    RawTouch {
        x: 0,
        y: 0,
        pressure: 0,
    }
}

type TestController = Controller<ScriptedAnalog, SpyHeater, ScriptedTouch, NullDisplay>;

fn build(
    adc: ScriptedAnalog,
    touch: ScriptedTouch,
) -> (TestController, Arc<Mutex<Vec<bool>>>, Arc<Mutex<DisplayLog>>) {
    let heater = SpyHeater::new();
    let relay_log = heater.log_handle();
    let display = NullDisplay::new();
    let display_log = display.log_handle();
    let controller = build_controller(
        adc,
        heater,
        touch,
        display,
        &test_config(),
        Some(Box::new(TestClock::new())),
    )
    .unwrap();
    (controller, relay_log, display_log)
}

#[test]
fn disabled_controller_never_drives_the_relay() {
    let (mut c, relay, _) = build(ScriptedAnalog::constant(COUNT_COLD), ScriptedTouch::idle());
    for _ in 0..5 {
        c.poll().unwrap();
        assert_eq!(c.mode(), HeaterMode::Idle);
    }
    let log = relay.lock().unwrap();
    assert_eq!(log.len(), 5);
    assert!(log.iter().all(|&on| !on));
}

#[test]
fn power_press_then_cold_reading_heats() {
    // Poll 1: the power press lands after the control step, so the
    // relay stays off until the next cycle evaluates a cold reading.
    let touch = ScriptedTouch::new([touch_at(70, 200), no_touch()]);
    let (mut c, relay, display) = build(ScriptedAnalog::constant(COUNT_COLD), touch);

    c.poll().unwrap();
    assert!(c.state().enabled);
    assert_eq!(c.mode(), HeaterMode::Idle);

    let outcome = c.poll().unwrap();
    match outcome {
        PollOutcome::Nominal {
            temperature_c,
            mode,
        } => {
            assert!(temperature_c < 24.0, "expected cold, got {temperature_c}");
            assert_eq!(mode, HeaterMode::Heating);
        }
        PollOutcome::SensorSkipped => panic!("reading should be valid"),
    }
    assert_eq!(*relay.lock().unwrap(), vec![false, true]);

    let log = display.lock().unwrap();
    assert!(log.button_draws.contains(&("ON".to_string(), true)));
    assert_eq!(log.labels, vec!["OFF", "HEAT"]);
}

#[test]
fn hot_reading_switches_to_cooling_and_releases_relay() {
    let touch = ScriptedTouch::new([touch_at(70, 200), no_touch()]);
    let (mut c, relay, _) = build(ScriptedAnalog::constant(COUNT_HOT), touch);
    c.poll().unwrap();
    c.poll().unwrap();
    assert_eq!(c.mode(), HeaterMode::Cooling);
    assert_eq!(*relay.lock().unwrap(), vec![false, false]);
}

#[test]
fn invalid_reading_holds_mode_and_relay() {
    // Enable, reach Heating on a cold reading, then rail the ADC. The
    // discarded reading must not disturb the mode or the relay.
    let touch = ScriptedTouch::new([touch_at(70, 200), no_touch()]);
    let adc = ScriptedAnalog::new([COUNT_COLD, COUNT_COLD, COUNT_RAIL]);
    let (mut c, relay, _) = build(adc, touch);

    c.poll().unwrap();
    c.poll().unwrap();
    assert_eq!(c.mode(), HeaterMode::Heating);

    let outcome = c.poll().unwrap();
    assert_eq!(outcome, PollOutcome::SensorSkipped);
    assert_eq!(c.mode(), HeaterMode::Heating);
    assert_eq!(c.skipped_reads(), 1);
    assert_eq!(*relay.lock().unwrap(), vec![false, true, true]);
}

#[test]
fn invalid_reading_while_disabled_forces_idle() {
    let (mut c, relay, _) = build(
        ScriptedAnalog::failing("adc offline"),
        ScriptedTouch::idle(),
    );
    let outcome = c.poll().unwrap();
    assert_eq!(outcome, PollOutcome::SensorSkipped);
    assert_eq!(c.mode(), HeaterMode::Idle);
    assert_eq!(c.skipped_reads(), 1);
    assert_eq!(*relay.lock().unwrap(), vec![false]);
}

#[test]
fn in_band_reading_holds_previous_mode() {
    let touch = ScriptedTouch::new([touch_at(70, 200), no_touch()]);
    let adc = ScriptedAnalog::new([COUNT_COLD, COUNT_COLD, COUNT_IN_BAND]);
    let (mut c, relay, _) = build(adc, touch);

    c.poll().unwrap();
    c.poll().unwrap();
    assert_eq!(c.mode(), HeaterMode::Heating);

    // Two in-band polls: heat demand persists until the band is exited
    c.poll().unwrap();
    c.poll().unwrap();
    assert_eq!(c.mode(), HeaterMode::Heating);
    assert_eq!(*relay.lock().unwrap(), vec![false, true, true, true]);
}

#[test]
fn setpoint_press_adjusts_and_redraws_the_button() {
    // "+1" sits at (130, 120) in the stock layout.
    let touch = ScriptedTouch::new([touch_at(130, 120), no_touch()]);
    let (mut c, _, display) = build(ScriptedAnalog::constant(COUNT_IN_BAND), touch);

    c.poll().unwrap();
    assert_eq!(c.state().setpoint_c, 26.0);
    c.poll().unwrap();
    assert_eq!(c.state().setpoint_c, 26.0);

    let log = display.lock().unwrap();
    assert_eq!(
        log.button_draws,
        vec![("+1".to_string(), true), ("+1".to_string(), false)]
    );
    assert_eq!(log.updates, 2);
}

#[test]
fn touch_fault_is_treated_as_no_touch() {
    struct FaultyTouch;
    impl therm_traits::TouchPanel for FaultyTouch {
        fn sample(&mut self) -> Result<RawTouch, Box<dyn std::error::Error + Send + Sync>> {
            Err(Box::new(std::io::Error::other("panel unresponsive")))
        }
    }

    let heater = SpyHeater::new();
    let display = NullDisplay::new();
    let mut c = build_controller(
        ScriptedAnalog::constant(COUNT_IN_BAND),
        heater,
        FaultyTouch,
        display,
        &test_config(),
        Some(Box::new(TestClock::new())),
    )
    .unwrap();

    let outcome = c.poll().unwrap();
    assert!(matches!(outcome, PollOutcome::Nominal { .. }));
    assert_eq!(c.mode(), HeaterMode::Idle);
}

#[test]
fn init_renders_status_and_every_button_at_rest() {
    let (mut c, _, display) = build(ScriptedAnalog::constant(COUNT_IN_BAND), ScriptedTouch::idle());
    c.init().unwrap();

    let t = c.last_temperature().unwrap();
    assert!((t - 25.0).abs() < 0.2, "startup reading {t}");

    let log = display.lock().unwrap();
    assert_eq!(log.inits, 1);
    assert_eq!(log.button_draws.len(), 5);
    assert!(log.button_draws.iter().all(|(_, pressed)| !pressed));
}

#[test]
fn init_survives_an_invalid_startup_reading() {
    let (mut c, _, display) = build(
        ScriptedAnalog::failing("adc offline"),
        ScriptedTouch::idle(),
    );
    c.init().unwrap();
    assert!(c.last_temperature().is_none());
    assert_eq!(display.lock().unwrap().inits, 1);
}

#[test]
fn rejected_display_bringup_aborts_init() {
    struct RejectingDisplay;
    impl therm_traits::Display for RejectingDisplay {
        fn init(
            &mut self,
            _temperature_c: f64,
            _setpoint_c: f64,
            _label: &str,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err(Box::new(std::io::Error::other("unknown controller 0x0000")))
        }
        fn update(
            &mut self,
            _temperature_c: f64,
            _setpoint_c: f64,
            _label: &str,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
        fn draw_button(
            &mut self,
            _label: &str,
            _pressed: bool,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    let mut c = build_controller(
        ScriptedAnalog::constant(COUNT_IN_BAND),
        SpyHeater::new(),
        ScriptedTouch::idle(),
        RejectingDisplay,
        &test_config(),
        Some(Box::new(TestClock::new())),
    )
    .unwrap();
    let err = c.init().unwrap_err();
    assert!(format!("{err:#}").contains("display bring-up"));
}

#[test]
fn bounded_run_loop_reports_a_summary_and_parks_the_heater() {
    let touch = ScriptedTouch::new([touch_at(70, 200), no_touch()]);
    let (mut c, relay, _) = build(ScriptedAnalog::constant(COUNT_COLD), touch);
    let shutdown = Arc::new(AtomicBool::new(false));

    let summary = run_loop(&mut c, &shutdown, Some(10)).unwrap();
    assert_eq!(summary.polls, 10);
    assert_eq!(summary.skipped_reads, 0);

    // 10 actuation writes plus the final park; last entry must be off
    let log = relay.lock().unwrap();
    assert_eq!(log.len(), 11);
    assert!(!log.last().copied().unwrap());
}

#[test]
fn shutdown_flag_stops_the_loop_before_polling() {
    let (mut c, relay, _) = build(ScriptedAnalog::constant(COUNT_COLD), ScriptedTouch::idle());
    let shutdown = Arc::new(AtomicBool::new(true));

    let summary = run_loop(&mut c, &shutdown, None).unwrap();
    assert_eq!(summary.polls, 0);
    // Only the park write happened
    assert_eq!(*relay.lock().unwrap(), vec![false]);
}

#[test]
fn build_rejects_a_zero_tolerance() {
    let mut cfg = test_config();
    cfg.control.tolerance_c = 0.0;
    let err = build_controller(
        ScriptedAnalog::constant(COUNT_IN_BAND),
        SpyHeater::new(),
        ScriptedTouch::idle(),
        NullDisplay::new(),
        &cfg,
        Some(Box::new(TestClock::new())),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("tolerance"));
}

#[test]
fn build_rejects_a_degenerate_touch_axis() {
    // A collapsed axis would otherwise divide by zero in the pixel
    // mapping on the first pressure-valid sample.
    let mut cfg = test_config();
    cfg.touch.x_min = 500;
    cfg.touch.x_max = 500;
    let err = build_controller(
        ScriptedAnalog::constant(COUNT_IN_BAND),
        SpyHeater::new(),
        ScriptedTouch::idle(),
        NullDisplay::new(),
        &cfg,
        Some(Box::new(TestClock::new())),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("touch axis"));
}

#[test]
fn build_rejects_an_inverted_pressure_band() {
    let mut cfg = test_config();
    cfg.touch.min_pressure = 2000;
    cfg.touch.max_pressure = 10;
    let err = build_controller(
        ScriptedAnalog::constant(COUNT_IN_BAND),
        SpyHeater::new(),
        ScriptedTouch::idle(),
        NullDisplay::new(),
        &cfg,
        Some(Box::new(TestClock::new())),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("pressure band"));
}

#[test]
fn build_rejects_an_empty_button_layout() {
    let mut cfg = test_config();
    cfg.buttons.clear();
    let err = build_controller(
        ScriptedAnalog::constant(COUNT_IN_BAND),
        SpyHeater::new(),
        ScriptedTouch::idle(),
        NullDisplay::new(),
        &cfg,
        Some(Box::new(TestClock::new())),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("button"));
}
