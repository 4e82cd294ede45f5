//! Touch input: pressure gating, raw-to-pixel calibration, per-button
//! edge debounce, and command dispatch.
//!
//! Buttons fire on the press edge only; releases trigger a redraw and
//! nothing else. Edge flags advance at most once per poll index, so a
//! repeated update within the same poll cannot re-fire an edge.

use therm_traits::RawTouch;

use crate::state::ControllerState;

/// Axis-aligned button footprint, center-based like the original
/// screen layout tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x - self.width / 2
            && px <= self.x + self.width / 2
            && py >= self.y - self.height / 2
            && py <= self.y + self.height / 2
    }
}

/// What a committed press does to the controller state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonAction {
    /// Add a (possibly negative) delta to the setpoint; no clamp
    AdjustSetpoint(f64),
    /// Toggle the master enable flag
    TogglePower,
}

impl From<therm_config::ActionCfg> for ButtonAction {
    fn from(a: therm_config::ActionCfg) -> Self {
        match a {
            therm_config::ActionCfg::Adjust { delta } => ButtonAction::AdjustSetpoint(delta),
            therm_config::ActionCfg::Power => ButtonAction::TogglePower,
        }
    }
}

/// One logical touch button with debounced edge detection.
#[derive(Debug, Clone)]
pub struct Button {
    label: String,
    rect: Rect,
    action: ButtonAction,
    contained: bool,
    was_contained: bool,
    last_poll: Option<u64>,
}

impl Button {
    pub fn new(label: impl Into<String>, rect: Rect, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            rect,
            action,
            contained: false,
            was_contained: false,
            last_poll: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn action(&self) -> ButtonAction {
        self.action
    }

    /// Feed one raw contained-and-touching flag for the given poll.
    ///
    /// The previous-state shift happens only when the poll index
    /// advances; calling this again with the same index updates the
    /// current flag but cannot re-fire an edge.
    pub fn update(&mut self, poll: u64, contained: bool) {
        if self.last_poll != Some(poll) {
            self.was_contained = self.contained;
            self.last_poll = Some(poll);
        }
        self.contained = contained;
    }

    pub fn is_pressed(&self) -> bool {
        self.contained
    }

    /// True for exactly the first poll of a false -> true transition.
    pub fn just_pressed(&self) -> bool {
        self.contained && !self.was_contained
    }

    /// True for exactly the first poll of a true -> false transition.
    pub fn just_released(&self) -> bool {
        !self.contained && self.was_contained
    }
}

/// Raw-axis to pixel calibration. All panel-specific constants live
/// here rather than scattered through the sampling code.
#[derive(Debug, Clone, Copy)]
pub struct TouchCalibration {
    pub min_pressure: u16,
    pub max_pressure: u16,
    pub x_min: u16,
    pub x_max: u16,
    pub y_min: u16,
    pub y_max: u16,
    pub swap_axes: bool,
    pub invert_x: bool,
    pub invert_y: bool,
    pub width: u16,
    pub height: u16,
}

impl From<&therm_config::Touch> for TouchCalibration {
    fn from(t: &therm_config::Touch) -> Self {
        Self {
            min_pressure: t.min_pressure,
            max_pressure: t.max_pressure,
            x_min: t.x_min,
            x_max: t.x_max,
            y_min: t.y_min,
            y_max: t.y_max,
            swap_axes: t.swap_axes,
            invert_x: t.invert_x,
            invert_y: t.invert_y,
            width: t.width,
            height: t.height,
        }
    }
}

impl TouchCalibration {
    /// Accept a raw sample as an actual touch and map it to pixels.
    ///
    /// Pressure must fall strictly inside the (min, max) band;
    /// anything else is "no touch this poll", not an error.
    pub fn to_pixels(&self, s: &RawTouch) -> Option<(i32, i32)> {
        if !(s.pressure > self.min_pressure && s.pressure < self.max_pressure) {
            return None;
        }
        let (raw_x, raw_y) = if self.swap_axes { (s.y, s.x) } else { (s.x, s.y) };
        let (x0, x1) = if self.invert_x {
            (self.x_max, self.x_min)
        } else {
            (self.x_min, self.x_max)
        };
        let (y0, y1) = if self.invert_y {
            (self.y_max, self.y_min)
        } else {
            (self.y_min, self.y_max)
        };
        let px = map_range(i32::from(raw_x), i32::from(x0), i32::from(x1), 0, i32::from(self.width));
        let py = map_range(i32::from(raw_y), i32::from(y0), i32::from(y1), 0, i32::from(self.height));
        Some((px, py))
    }
}

/// Linear remap of `v` from [in_min, in_max] onto [out_min, out_max].
fn map_range(v: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let num = i64::from(v - in_min) * i64::from(out_max - out_min);
    let den = i64::from(in_max - in_min);
    (num / den) as i32 + out_min
}

/// Press/release edge reported for a button this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub index: usize,
    pub edge: Edge,
}

/// Debounces raw touch samples into button edges and applies committed
/// actions to the controller state.
#[derive(Debug)]
pub struct InputController {
    buttons: Vec<Button>,
    calibration: TouchCalibration,
    poll: u64,
}

impl InputController {
    pub fn new(buttons: Vec<Button>, calibration: TouchCalibration) -> Self {
        Self {
            buttons,
            calibration,
            poll: 0,
        }
    }

    pub fn from_config(cfg: &therm_config::Config) -> Self {
        let buttons = cfg
            .buttons
            .iter()
            .map(|b| {
                Button::new(
                    b.label.clone(),
                    Rect::new(b.x, b.y, b.width, b.height),
                    b.action.into(),
                )
            })
            .collect();
        Self::new(buttons, TouchCalibration::from(&cfg.touch))
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// One input poll: gate the sample through the pressure band, feed
    /// every button, dispatch press actions, and report edges for the
    /// rendering layer.
    pub fn poll(
        &mut self,
        sample: Option<&RawTouch>,
        state: &mut ControllerState,
    ) -> Vec<ButtonEvent> {
        self.poll = self.poll.wrapping_add(1);
        let contact = sample.and_then(|s| self.calibration.to_pixels(s));

        let mut events = Vec::new();
        for (index, button) in self.buttons.iter_mut().enumerate() {
            let contained = contact.is_some_and(|(px, py)| button.rect.contains(px, py));
            button.update(self.poll, contained);

            if button.just_pressed() {
                match button.action {
                    ButtonAction::AdjustSetpoint(delta) => {
                        state.setpoint_c += delta;
                        tracing::info!(
                            button = %button.label,
                            delta,
                            setpoint_c = state.setpoint_c,
                            "setpoint adjusted"
                        );
                    }
                    ButtonAction::TogglePower => {
                        state.enabled = !state.enabled;
                        tracing::info!(enabled = state.enabled, "power toggled");
                    }
                }
                events.push(ButtonEvent {
                    index,
                    edge: Edge::Pressed,
                });
            } else if button.just_released() {
                // Redraw only; no state mutation on release
                events.push(ButtonEvent {
                    index,
                    edge: Edge::Released,
                });
            }
        }
        events
    }
}
