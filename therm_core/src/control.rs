//! Hysteretic (bang-bang) heater control.
//!
//! Two strict thresholds around the setpoint; inside the band the mode
//! holds its previous value, which is what suppresses relay chatter.

use crate::state::ControllerState;

/// Heater actuation state. Exactly one variant is active per poll; it
/// drives both the relay and the display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterMode {
    Heating,
    Cooling,
    Idle,
}

impl HeaterMode {
    /// Actuator signal: on only while heating.
    #[inline]
    pub fn heater_on(self) -> bool {
        matches!(self, HeaterMode::Heating)
    }

    /// Display label. Render-boundary use only; logic never branches
    /// on these strings.
    pub fn label(self) -> &'static str {
        match self {
            HeaterMode::Heating => "HEAT",
            HeaterMode::Cooling => "COOL",
            HeaterMode::Idle => "OFF",
        }
    }
}

/// The hysteresis state machine. Holds no state of its own; the mode
/// lives in `ControllerState` so the whole poll record stays in one
/// place.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlLoop;

impl ControlLoop {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one transition with the latest valid temperature.
    ///
    /// Comparisons are strict: a reading exactly on `setpoint ±
    /// tolerance` falls into the hold branch and does not transition.
    pub fn tick(&self, temperature_c: f64, state: &mut ControllerState) -> HeaterMode {
        let next = if !state.enabled {
            HeaterMode::Idle
        } else if temperature_c < state.setpoint_c - state.tolerance_c {
            HeaterMode::Heating
        } else if temperature_c > state.setpoint_c + state.tolerance_c {
            HeaterMode::Cooling
        } else {
            // In-band: hold the previous mode
            state.mode
        };
        if next != state.mode {
            tracing::debug!(from = ?state.mode, to = ?next, temperature_c, "mode transition");
        }
        state.mode = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(setpoint: f64, enabled: bool) -> ControllerState {
        let mut s = ControllerState::new(setpoint, 1.0);
        s.enabled = enabled;
        s
    }

    #[test]
    fn cold_start_heats_once_below_band() {
        let mut s = state(25.0, true);
        let c = ControlLoop::new();
        assert_eq!(c.tick(23.9, &mut s), HeaterMode::Heating);
    }

    #[test]
    fn exact_boundary_does_not_transition() {
        let mut s = state(25.0, true);
        let c = ControlLoop::new();
        // 24.0 == setpoint - tolerance: strict compare holds Idle
        assert_eq!(c.tick(24.0, &mut s), HeaterMode::Idle);
        // 26.0 == setpoint + tolerance: same on the high side
        assert_eq!(c.tick(26.0, &mut s), HeaterMode::Idle);
    }

    #[test]
    fn boundary_holds_after_crossing() {
        let mut s = state(25.0, true);
        let c = ControlLoop::new();
        assert_eq!(c.tick(23.5, &mut s), HeaterMode::Heating);
        // Back to the exact lower boundary: stays heating
        assert_eq!(c.tick(24.0, &mut s), HeaterMode::Heating);
    }

    #[test]
    fn disabled_forces_idle_from_any_mode() {
        let mut s = state(25.0, true);
        let c = ControlLoop::new();
        c.tick(20.0, &mut s);
        assert_eq!(s.mode, HeaterMode::Heating);
        s.enabled = false;
        assert_eq!(c.tick(20.0, &mut s), HeaterMode::Idle);
    }

    #[test]
    fn scenario_cool_heat_hold() {
        // Setpoint 25.0, tolerance 1.0: a reading above the band cools,
        // one below it heats, and 25.5 (in-band) holds the heating mode.
        let mut s = state(25.0, true);
        let c = ControlLoop::new();
        let modes: Vec<HeaterMode> = [26.5, 23.9, 25.5]
            .iter()
            .map(|&t| c.tick(t, &mut s))
            .collect();
        assert_eq!(
            modes,
            [HeaterMode::Cooling, HeaterMode::Heating, HeaterMode::Heating]
        );
    }
}
