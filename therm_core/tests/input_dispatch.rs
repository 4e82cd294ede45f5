use therm_core::input::{Button, ButtonAction, Edge, InputController, Rect, TouchCalibration};
use therm_core::{ControllerState, HeaterMode};
use therm_traits::RawTouch;

/// Identity-like calibration: raw axes map straight onto a 320x240
/// screen, no swap, pressure band (10, 2000).
fn identity_cal() -> TouchCalibration {
    TouchCalibration {
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
    }
}

fn standard_buttons() -> Vec<Button> {
    vec![
        Button::new("+5", Rect::new(60, 120, 50, 50), ButtonAction::AdjustSetpoint(5.0)),
        Button::new("+1", Rect::new(130, 120, 50, 50), ButtonAction::AdjustSetpoint(1.0)),
        Button::new("-1", Rect::new(200, 120, 50, 50), ButtonAction::AdjustSetpoint(-1.0)),
        Button::new("-5", Rect::new(270, 120, 50, 50), ButtonAction::AdjustSetpoint(-5.0)),
        Button::new("ON", Rect::new(70, 200, 100, 50), ButtonAction::TogglePower),
    ]
}

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

#[test]
fn press_adjusts_setpoint_once() {
    let mut input = InputController::new(standard_buttons(), identity_cal());
    let mut state = ControllerState::new(25.0, 1.0);

    // Finger lands on "+1" and holds for three polls, then lifts.
    let events = input.poll(Some(&touch_at(130, 120)), &mut state);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].edge, Edge::Pressed);
    assert_eq!(state.setpoint_c, 26.0);

    for _ in 0..2 {
        let events = input.poll(Some(&touch_at(130, 120)), &mut state);
        assert!(events.is_empty(), "hold must not re-dispatch");
    }
    assert_eq!(state.setpoint_c, 26.0);

    let events = input.poll(Some(&no_touch()), &mut state);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].edge, Edge::Released);
    // Release mutates nothing.
    assert_eq!(state.setpoint_c, 26.0);
}

#[test]
fn coarse_and_fine_deltas_accumulate_unclamped() {
    let mut input = InputController::new(standard_buttons(), identity_cal());
    let mut state = ControllerState::new(25.0, 1.0);

    let tap = |input: &mut InputController, state: &mut ControllerState, x: u16, y: u16| {
        input.poll(Some(&touch_at(x, y)), state);
        input.poll(Some(&no_touch()), state);
    };

    tap(&mut input, &mut state, 60, 120); // +5
    tap(&mut input, &mut state, 60, 120); // +5
    tap(&mut input, &mut state, 200, 120); // -1
    assert_eq!(state.setpoint_c, 34.0);

    // No lower clamp either: drive it far negative.
    for _ in 0..20 {
        tap(&mut input, &mut state, 270, 120); // -5
    }
    assert_eq!(state.setpoint_c, -66.0);
}

#[test]
fn power_button_toggles_enable() {
    let mut input = InputController::new(standard_buttons(), identity_cal());
    let mut state = ControllerState::new(25.0, 1.0);
    assert!(!state.enabled);

    input.poll(Some(&touch_at(70, 200)), &mut state);
    assert!(state.enabled);
    input.poll(Some(&no_touch()), &mut state);

    input.poll(Some(&touch_at(70, 200)), &mut state);
    assert!(!state.enabled);
}

#[test]
fn out_of_band_pressure_is_no_touch() {
    let mut input = InputController::new(standard_buttons(), identity_cal());
    let mut state = ControllerState::new(25.0, 1.0);

    // Heavy palm press beyond max pressure: ignored entirely.
    let heavy = RawTouch {
        x: 130,
        y: 120,
        pressure: 3000,
    };
    let events = input.poll(Some(&heavy), &mut state);
    assert!(events.is_empty());
    assert_eq!(state.setpoint_c, 25.0);
    assert_eq!(state.mode, HeaterMode::Idle);
}

#[test]
fn touch_outside_every_button_is_inert() {
    let mut input = InputController::new(standard_buttons(), identity_cal());
    let mut state = ControllerState::new(25.0, 1.0);
    let events = input.poll(Some(&touch_at(319, 10)), &mut state);
    assert!(events.is_empty());
    assert_eq!(state.setpoint_c, 25.0);
}

#[test]
fn slide_between_buttons_releases_then_presses() {
    let mut input = InputController::new(standard_buttons(), identity_cal());
    let mut state = ControllerState::new(25.0, 1.0);

    input.poll(Some(&touch_at(130, 120)), &mut state); // press +1
    let events = input.poll(Some(&touch_at(200, 120)), &mut state); // slide to -1
    // One release (+1) and one press (-1) in the same poll.
    let pressed: Vec<_> = events.iter().filter(|e| e.edge == Edge::Pressed).collect();
    let released: Vec<_> = events.iter().filter(|e| e.edge == Edge::Released).collect();
    assert_eq!(pressed.len(), 1);
    assert_eq!(released.len(), 1);
    assert_eq!(state.setpoint_c, 25.0); // +1 then -1
}
