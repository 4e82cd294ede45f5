use proptest::prelude::*;
use therm_core::{ControlLoop, ControllerState, HeaterMode, Polynomial};

const SETPOINT: f64 = 25.0;
const TOLERANCE: f64 = 1.0;

prop_compose! {
    fn in_band_sequence()(
        temps in prop::collection::vec(
            (SETPOINT - TOLERANCE)..=(SETPOINT + TOLERANCE),
            1..200,
        ),
    ) -> Vec<f64> {
        temps
    }
}

proptest! {
    #[test]
    fn in_band_readings_never_change_mode(
        temps in in_band_sequence(),
        start_idx in 0usize..3,
    ) {
        let start = [HeaterMode::Idle, HeaterMode::Heating, HeaterMode::Cooling][start_idx];
        let c = ControlLoop::new();
        let mut s = ControllerState::new(SETPOINT, TOLERANCE);
        s.enabled = true;
        s.mode = start;
        for t in temps {
            prop_assert_eq!(c.tick(t, &mut s), start);
        }
    }

    #[test]
    fn disabled_is_idle_for_any_readings(
        temps in prop::collection::vec(-100.0f64..400.0, 1..200),
    ) {
        let c = ControlLoop::new();
        let mut s = ControllerState::new(SETPOINT, TOLERANCE);
        s.enabled = false;
        for t in temps {
            prop_assert_eq!(c.tick(t, &mut s), HeaterMode::Idle);
        }
    }

    #[test]
    fn mode_depends_only_on_band_side_and_history(
        below in -40.0f64..(SETPOINT - TOLERANCE - 0.01),
        above in (SETPOINT + TOLERANCE + 0.01)..200.0,
    ) {
        let c = ControlLoop::new();
        let mut s = ControllerState::new(SETPOINT, TOLERANCE);
        s.enabled = true;
        prop_assert_eq!(c.tick(below, &mut s), HeaterMode::Heating);
        prop_assert_eq!(c.tick(above, &mut s), HeaterMode::Cooling);
        prop_assert_eq!(c.tick(below, &mut s), HeaterMode::Heating);
    }

    #[test]
    fn steinhart_hart_temperature_decreases_with_resistance(
        lo in 500.0f64..50_000.0,
        ratio in 1.01f64..10.0,
    ) {
        let p = Polynomial::SteinhartHart {
            a: 1.129148e-3,
            b: 2.34125e-4,
            c: 8.76741e-8,
        };
        let hi = lo * ratio;
        let t_lo = 1.0 / p.inverse_temperature(lo.ln());
        let t_hi = 1.0 / p.inverse_temperature(hi.ln());
        // NTC: more resistance means colder
        prop_assert!(t_hi < t_lo);
    }
}
