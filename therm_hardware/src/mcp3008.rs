//! Raspberry Pi backend: MCP3008 SPI ADC for the thermistor divider
//! and touch sensing, a GPIO relay pin, and four-wire resistive touch
//! sampling over shared lines.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rppal::gpio::{Gpio, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use therm_traits::{AnalogInput, HeaterOutput, RawTouch, TouchPanel};

use crate::error::{HwError, Result};
use crate::pins::{AnalogModeGuard, PinMode, PinModeControl};

/// MCP3008 10-bit SPI ADC.
pub struct Mcp3008 {
    spi: Spi,
}

impl Mcp3008 {
    pub fn new(bus: Bus, slave: SlaveSelect, clock_hz: u32) -> Result<Self> {
        let spi = Spi::new(bus, slave, clock_hz, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi })
    }

    /// Single-ended conversion on `channel` (0..8).
    pub fn read_channel(&mut self, channel: u8) -> Result<u16> {
        if channel > 7 {
            return Err(HwError::BadChannel(channel));
        }
        // Start bit, single-ended mode + channel, then clock out data
        let tx = [0x01, 0x80 | (channel << 4), 0x00];
        let mut rx = [0u8; 3];
        let n = self
            .spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        if n < 3 {
            return Err(HwError::ShortTransfer(n));
        }
        Ok((u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]))
    }
}

impl AnalogInput for Mcp3008 {
    fn read(&mut self, channel: u8) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_channel(channel)?)
    }
}

/// Shared handle so the thermistor reader and the touch sampler can
/// use the same converter within the single-threaded loop.
#[derive(Clone)]
pub struct SharedMcp3008(Rc<RefCell<Mcp3008>>);

impl SharedMcp3008 {
    pub fn new(adc: Mcp3008) -> Self {
        Self(Rc::new(RefCell::new(adc)))
    }
}

impl AnalogInput for SharedMcp3008 {
    fn read(&mut self, channel: u8) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.borrow_mut().read_channel(channel)?)
    }
}

/// Heater relay on a GPIO output, driven active-high.
pub struct RelayPin {
    pin: OutputPin,
}

impl RelayPin {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl HeaterOutput for RelayPin {
    fn set_on(&mut self, on: bool) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// GPIO-backed pin mode switching. A pin in digital output mode is a
/// held `OutputPin`; analog mode releases it so the line floats for
/// the ADC to sample.
pub struct GpioBus {
    gpio: Gpio,
    outputs: HashMap<u8, OutputPin>,
}

impl GpioBus {
    pub fn new() -> Result<Self> {
        Ok(Self {
            gpio: Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?,
            outputs: HashMap::new(),
        })
    }

    /// Ensure `pin` is an output and drive it to `high`.
    pub fn drive(&mut self, pin: u8, high: bool) -> Result<()> {
        self.set_mode(pin, PinMode::DigitalOutput)?;
        if let Some(p) = self.outputs.get_mut(&pin) {
            if high {
                p.set_high();
            } else {
                p.set_low();
            }
        }
        Ok(())
    }
}

impl PinModeControl for GpioBus {
    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        match mode {
            PinMode::DigitalOutput => {
                if !self.outputs.contains_key(&pin) {
                    let p = self
                        .gpio
                        .get(pin)
                        .map_err(|e| HwError::Gpio(e.to_string()))?
                        .into_output_low();
                    self.outputs.insert(pin, p);
                }
                Ok(())
            }
            PinMode::AnalogInput => {
                self.outputs.remove(&pin);
                Ok(())
            }
        }
    }
}

/// Four-wire resistive touch sampled through the shared ADC.
///
/// XM and YP are shared with the display bus: each sample switches
/// them to analog mode behind `AnalogModeGuard`, so they are restored
/// to outputs afterwards even if a conversion fails.
pub struct FourWireTouch {
    bus: GpioBus,
    adc: SharedMcp3008,
    xp: u8,
    xm: u8,
    yp: u8,
    ym: u8,
    x_channel: u8,
    y_channel: u8,
    z_channel: u8,
}

impl FourWireTouch {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bus: GpioBus,
        adc: SharedMcp3008,
        pins: &therm_config::Pins,
        x_channel: u8,
        y_channel: u8,
        z_channel: u8,
    ) -> Self {
        Self {
            bus,
            adc,
            xp: pins.touch_xp,
            xm: pins.touch_xm,
            yp: pins.touch_yp,
            ym: pins.touch_ym,
            x_channel,
            y_channel,
            z_channel,
        }
    }

    fn sample_inner(&mut self) -> Result<RawTouch> {
        let (xp, xm, yp, ym) = (self.xp, self.xm, self.yp, self.ym);

        let mut guard = AnalogModeGuard::new(&mut self.bus, &[xm, yp])?;

        // X axis: energize the X plate, sense on the Y plate
        guard.bus().drive(xp, true)?;
        let x = self
            .adc
            .0
            .borrow_mut()
            .read_channel(self.x_channel)?;

        // Y axis: energize the Y plate, sense on the X plate
        guard.bus().drive(xp, false)?;
        guard.bus().drive(ym, true)?;
        let y = self
            .adc
            .0
            .borrow_mut()
            .read_channel(self.y_channel)?;

        // Pressure: cross-plate conduction
        let pressure = self.adc.0.borrow_mut().read_channel(self.z_channel)?;
        guard.bus().drive(ym, false)?;

        tracing::trace!(x, y, pressure, "touch sample");
        Ok(RawTouch { x, y, pressure })
    }
}

impl TouchPanel for FourWireTouch {
    fn sample(&mut self) -> std::result::Result<RawTouch, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.sample_inner()?)
    }
}
