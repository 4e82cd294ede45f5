//! Mode management for the touch lines shared with the display bus.
//!
//! Two of the four resistive-touch lines double as display data lines.
//! Sampling switches them to analog inputs; they must be back in
//! digital output mode before the display is driven again, on every
//! exit path including errors mid-sample.

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    DigitalOutput,
    AnalogInput,
}

/// Backend-agnostic pin mode switching. The rppal backend implements
/// this over real GPIO registers; tests implement it over a map.
pub trait PinModeControl {
    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<()>;
}

/// Scoped analog-mode switch for a set of shared pins.
///
/// Construction flips every pin to `AnalogInput`; dropping the guard
/// flips them all back to `DigitalOutput`. Holding the borrow on the
/// bus for the guard's lifetime keeps display writes out of the
/// sampling window.
pub struct AnalogModeGuard<'a, B: PinModeControl> {
    bus: &'a mut B,
    pins: Vec<u8>,
}

impl<'a, B: PinModeControl> AnalogModeGuard<'a, B> {
    pub fn new(bus: &'a mut B, pins: &[u8]) -> Result<Self> {
        let mut switched = Vec::with_capacity(pins.len());
        for &pin in pins {
            if let Err(e) = bus.set_mode(pin, PinMode::AnalogInput) {
                // Partial switch: restore what already flipped
                for &done in &switched {
                    if let Err(e2) = bus.set_mode(done, PinMode::DigitalOutput) {
                        tracing::error!(pin = done, error = %e2, "failed to restore pin mode");
                    }
                }
                return Err(e);
            }
            switched.push(pin);
        }
        Ok(Self {
            bus,
            pins: switched,
        })
    }

    pub fn bus(&mut self) -> &mut B {
        self.bus
    }
}

impl<B: PinModeControl> Drop for AnalogModeGuard<'_, B> {
    fn drop(&mut self) {
        for &pin in &self.pins {
            if let Err(e) = self.bus.set_mode(pin, PinMode::DigitalOutput) {
                tracing::error!(pin, error = %e, "failed to restore pin mode");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HwError;
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingBus {
        modes: HashMap<u8, PinMode>,
        fail_on: Option<u8>,
    }

    impl PinModeControl for RecordingBus {
        fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
            if self.fail_on == Some(pin) && mode == PinMode::AnalogInput {
                return Err(HwError::Gpio(format!("pin {pin} stuck")));
            }
            self.modes.insert(pin, mode);
            Ok(())
        }
    }

    #[test]
    fn guard_switches_and_restores_all_pins() {
        let mut bus = RecordingBus::default();
        {
            let mut guard = AnalogModeGuard::new(&mut bus, &[2, 1]).unwrap();
            let modes = &guard.bus().modes;
            assert_eq!(modes[&2], PinMode::AnalogInput);
            assert_eq!(modes[&1], PinMode::AnalogInput);
        }
        assert_eq!(bus.modes[&2], PinMode::DigitalOutput);
        assert_eq!(bus.modes[&1], PinMode::DigitalOutput);
    }

    #[test]
    fn guard_restores_on_early_return() {
        fn sample(bus: &mut RecordingBus) -> Result<u16> {
            let _guard = AnalogModeGuard::new(bus, &[2, 1])?;
            Err(HwError::Gpio("read failed mid-sample".into()))
        }
        let mut bus = RecordingBus::default();
        assert!(sample(&mut bus).is_err());
        assert_eq!(bus.modes[&2], PinMode::DigitalOutput);
        assert_eq!(bus.modes[&1], PinMode::DigitalOutput);
    }

    #[rstest::rstest]
    #[case::first_pin(2)]
    #[case::second_pin(1)]
    fn partial_switch_failure_rolls_back(#[case] stuck: u8) {
        let mut bus = RecordingBus {
            fail_on: Some(stuck),
            ..Default::default()
        };
        assert!(AnalogModeGuard::new(&mut bus, &[2, 1]).is_err());
        // Every pin flipped before the failure must be back in output mode
        for (pin, mode) in &bus.modes {
            assert_eq!(*mode, PinMode::DigitalOutput, "pin {pin} left analog");
        }
    }
}
