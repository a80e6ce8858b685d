//! ES8156 audio DAC driver
//!
//! I2C control only; samples arrive over the shared I2S stream.
//! The board runs the DAC as I2S slave with MCLK from the ESP32-S3, so a
//! sample-rate change needs no register update here.

use super::bus::{apply_sequence, BusError, ControlBus, RegWrite};
use super::codec::{CodecDevice, CodecRole, PowerState};

/// ES8156 I2C address (7-bit, 0x10 in 8-bit write form)
pub const ES8156_ADDR: u8 = 0x08;

/// ES8156 register addresses
#[allow(dead_code)]
mod regs {
    pub const RESET: u8 = 0x00;
    pub const SCLK_MODE: u8 = 0x02;
    pub const CLOCK_ON_OFF: u8 = 0x08;
    pub const MISC_CONTROL2: u8 = 0x09;
    pub const TIME_CONTROL1: u8 = 0x0A;
    pub const TIME_CONTROL2: u8 = 0x0B;
    pub const P2S_CONTROL: u8 = 0x0D;
    pub const DAC_SDP: u8 = 0x11;
    pub const VOLUME: u8 = 0x14;
    pub const MISC_CONTROL3: u8 = 0x18;
    pub const EQ_CONTROL1: u8 = 0x19;
    pub const ANALOG_SYS1: u8 = 0x20;
    pub const ANALOG_SYS2: u8 = 0x21;
    pub const ANALOG_SYS3: u8 = 0x22;
    pub const ANALOG_SYS4: u8 = 0x23;
    pub const ANALOG_SYS5: u8 = 0x24;
    pub const ANALOG_SYS6: u8 = 0x25;
}

use regs::*;

/// Power-on configuration (slave mode, 16-bit I2S, analog path up)
pub static BRING_UP: [RegWrite; 16] = [
    RegWrite::new(SCLK_MODE, 0x04),
    RegWrite::new(ANALOG_SYS1, 0x2A),
    RegWrite::new(ANALOG_SYS2, 0x3C),
    RegWrite::new(ANALOG_SYS3, 0x00),
    RegWrite::new(ANALOG_SYS5, 0x07),
    RegWrite::new(ANALOG_SYS4, 0x00),
    RegWrite::new(TIME_CONTROL1, 0x01),
    RegWrite::new(TIME_CONTROL2, 0x01),
    RegWrite::new(DAC_SDP, 0x00),
    RegWrite::new(VOLUME, 179),
    RegWrite::new(P2S_CONTROL, 0x14),
    RegWrite::new(MISC_CONTROL3, 0x00),
    RegWrite::new(CLOCK_ON_OFF, 0x3F),
    RegWrite::new(RESET, 0x02),
    RegWrite::new(RESET, 0x03),
    RegWrite::new(ANALOG_SYS6, 0x20),
];

/// Start sequence: clocks on, unmute, output stage enabled
pub static START: [RegWrite; 8] = [
    RegWrite::new(CLOCK_ON_OFF, 0x3F),
    RegWrite::new(MISC_CONTROL2, 0x00),
    RegWrite::new(MISC_CONTROL3, 0x00),
    RegWrite::new(ANALOG_SYS6, 0x20),
    RegWrite::new(ANALOG_SYS3, 0x00),
    RegWrite::new(ANALOG_SYS2, 0x3C),
    RegWrite::new(EQ_CONTROL1, 0x20),
    RegWrite::new(VOLUME, 179),
];

/// Map 0-100% onto the 0-255 volume register, rounding to nearest.
///
/// Values above 100 clamp to 100.
#[inline]
pub fn volume_register(percent: u8) -> u8 {
    let percent = percent.min(100) as u32;
    ((percent * 255 + 50) / 100) as u8
}

/// ES8156 driver
pub struct Es8156 {
    device: CodecDevice,
    volume: u8,
}

impl Es8156 {
    /// Create new ES8156 driver (unpowered)
    pub fn new(volume: u8) -> Self {
        Self {
            device: CodecDevice::new(CodecRole::Output, ES8156_ADDR),
            volume: volume.min(100),
        }
    }

    pub fn device(&self) -> &CodecDevice {
        &self.device
    }

    /// Run the power-on table
    pub fn configure(&mut self, bus: &mut impl ControlBus) -> Result<(), BusError> {
        self.device.set_state(PowerState::Powering);
        let result = apply_sequence(bus, ES8156_ADDR, &BRING_UP);
        self.device.track(result)
    }

    /// Run the start table. The amplifier line is the caller's job.
    pub fn start(&mut self, bus: &mut impl ControlBus) -> Result<(), BusError> {
        let result = apply_sequence(bus, ES8156_ADDR, &START);
        self.device.track(result)?;
        self.device.set_level_reg(179);
        self.device.set_state(PowerState::Ready);
        Ok(())
    }

    /// Set DAC volume (0-100%)
    pub fn set_volume(&mut self, bus: &mut impl ControlBus, volume: u8) -> Result<(), BusError> {
        self.volume = volume.min(100);
        let reg_val = volume_register(self.volume);
        let result = bus.write_register(ES8156_ADDR, VOLUME, reg_val);
        self.device.track(result)?;
        self.device.set_level_reg(reg_val);
        self.device.set_state(PowerState::Ready);
        Ok(())
    }

    /// Get current volume
    pub fn volume(&self) -> u8 {
        self.volume
    }
}
