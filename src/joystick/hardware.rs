//! Raspberry Pi hardware access through rppal
//!
//! The stick's two potentiometers are read through an MCP3208 12-bit ADC on
//! SPI; the push button sits on a GPIO input with the internal pull-up
//! enabled. An optional GPIO output drives the link status LED.

use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::{debug, info};

use super::sampler::{JoystickInput, RawSample};
use super::ADC_MAX;
use crate::config::HardwareConfig;
use crate::publish::push::{LinkStatus, StatusIndicator};

/// Number of single-ended inputs on the MCP3208.
const MCP3208_CHANNELS: u8 = 8;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("SPI error: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[error("Invalid ADC channel {0} (MCP3208 has channels 0-7)")]
    InvalidChannel(u8),

    #[error("Invalid SPI bus {0}")]
    InvalidBus(u8),

    #[error("Invalid SPI slave select {0}")]
    InvalidSlaveSelect(u8),

    #[error("Short SPI transfer: {0} of 3 bytes")]
    ShortTransfer(usize),
}

/// Joystick wired to an MCP3208 plus one active-low button pin.
pub struct Mcp3208Joystick {
    spi: Spi,
    button: InputPin,
    x_channel: u8,
    y_channel: u8,
}

impl Mcp3208Joystick {
    pub fn open(config: &HardwareConfig) -> Result<Self, HardwareError> {
        for channel in [config.x_channel, config.y_channel] {
            if channel >= MCP3208_CHANNELS {
                return Err(HardwareError::InvalidChannel(channel));
            }
        }

        let spi = Spi::new(
            spi_bus(config.spi_bus)?,
            slave_select(config.slave_select)?,
            config.spi_clock_hz,
            Mode::Mode0,
        )?;
        let button = Gpio::new()?.get(config.button_pin)?.into_input_pullup();

        info!(
            "Joystick on SPI{} CE{} (x: ch{}, y: ch{}), button on GPIO{}",
            config.spi_bus, config.slave_select, config.x_channel, config.y_channel,
            config.button_pin
        );

        Ok(Self {
            spi,
            button,
            x_channel: config.x_channel,
            y_channel: config.y_channel,
        })
    }

    fn read_channel(&mut self, channel: u8) -> Result<u16, HardwareError> {
        let command = mcp3208_command(channel);
        let mut response = [0u8; 3];
        let transferred = self.spi.transfer(&mut response, &command)?;
        if transferred < response.len() {
            return Err(HardwareError::ShortTransfer(transferred));
        }
        Ok(decode_mcp3208(response))
    }
}

impl JoystickInput for Mcp3208Joystick {
    fn read_raw(&mut self) -> Result<RawSample, HardwareError> {
        let x = self.read_channel(self.x_channel)?;
        let y = self.read_channel(self.y_channel)?;
        Ok(RawSample {
            x,
            y,
            button_level_high: self.button.is_high(),
        })
    }
}

/// Link status LED on a GPIO output. Lit while sends are going through.
pub struct GpioStatusLed {
    pin: OutputPin,
}

impl GpioStatusLed {
    pub fn open(pin: u8) -> Result<Self, HardwareError> {
        let mut pin = Gpio::new()?.get(pin)?.into_output();
        pin.set_low();
        debug!("Status LED ready on GPIO{}", pin.pin());
        Ok(Self { pin })
    }
}

impl StatusIndicator for GpioStatusLed {
    fn show(&mut self, status: LinkStatus) {
        match status {
            LinkStatus::Ok => self.pin.set_high(),
            LinkStatus::Failing => self.pin.set_low(),
        }
    }
}

fn spi_bus(bus: u8) -> Result<Bus, HardwareError> {
    match bus {
        0 => Ok(Bus::Spi0),
        1 => Ok(Bus::Spi1),
        2 => Ok(Bus::Spi2),
        other => Err(HardwareError::InvalidBus(other)),
    }
}

fn slave_select(ss: u8) -> Result<SlaveSelect, HardwareError> {
    match ss {
        0 => Ok(SlaveSelect::Ss0),
        1 => Ok(SlaveSelect::Ss1),
        2 => Ok(SlaveSelect::Ss2),
        other => Err(HardwareError::InvalidSlaveSelect(other)),
    }
}

/// Three-byte single-ended conversion request for `channel`.
///
/// Start bit and SGL/DIFF go in the first byte together with D2, D1/D0 lead
/// the second byte; the conversion result clocks out over bytes two and
/// three.
fn mcp3208_command(channel: u8) -> [u8; 3] {
    [0x06 | ((channel & 0x04) >> 2), (channel & 0x03) << 6, 0x00]
}

/// Extracts the 12-bit result from a conversion response.
fn decode_mcp3208(response: [u8; 3]) -> u16 {
    let value = (u16::from(response[1] & 0x0F) << 8) | u16::from(response[2]);
    value.min(ADC_MAX)
}
