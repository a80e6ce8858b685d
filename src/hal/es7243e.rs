//! ES7243E audio ADC driver
//!
//! Microphone front end. Only the PGA gain is touched after bring-up.

use super::bus::{apply_sequence, BusError, ControlBus, RegWrite};
use super::codec::{CodecDevice, CodecRole, PowerState};

/// ES7243E I2C address (7-bit, 0x20 in 8-bit write form)
pub const ES7243E_ADDR: u8 = 0x10;

/// PGA gain registers (left / right input)
const PGA1_GAIN: u8 = 0x20;
const PGA2_GAIN: u8 = 0x21;

/// PGA enable bit, OR-ed with the gain code
const PGA_ENABLE: u8 = 0x10;

/// Highest gain code the PGA accepts
pub const MAX_GAIN_CODE: u8 = 14;

/// Vendor bring-up table.
///
/// Order matters: the chip is reset and its state machine restarted
/// (0x16 = 0x3F then 0x00) more than once.
pub static BRING_UP: [RegWrite; 46] = [
    RegWrite::new(0x01, 0x3A), RegWrite::new(0x00, 0x80), RegWrite::new(0xF9, 0x00),
    RegWrite::new(0x04, 0x02), RegWrite::new(0x04, 0x01), RegWrite::new(0xF9, 0x01),
    RegWrite::new(0x00, 0x1E), RegWrite::new(0x01, 0x00), RegWrite::new(0x02, 0x00),
    RegWrite::new(0x03, 0x20), RegWrite::new(0x04, 0x01), RegWrite::new(0x0D, 0x00),
    RegWrite::new(0x05, 0x00), RegWrite::new(0x06, 0x03), RegWrite::new(0x07, 0x00),
    RegWrite::new(0x08, 0xFF), RegWrite::new(0x09, 0xCA), RegWrite::new(0x0A, 0x85),
    RegWrite::new(0x0B, 0x00), RegWrite::new(0x0E, 0xBF), RegWrite::new(0x0F, 0x80),
    RegWrite::new(0x14, 0x0C), RegWrite::new(0x15, 0x0C), RegWrite::new(0x17, 0x02),
    RegWrite::new(0x18, 0x26), RegWrite::new(0x19, 0x77), RegWrite::new(0x1A, 0xF4),
    RegWrite::new(0x1B, 0x66), RegWrite::new(0x1C, 0x44), RegWrite::new(0x1E, 0x00),
    RegWrite::new(0x1F, 0x0C), RegWrite::new(0x20, 0x1A), RegWrite::new(0x21, 0x1A),
    RegWrite::new(0x00, 0x80), RegWrite::new(0x01, 0x3A), RegWrite::new(0x16, 0x3F),
    RegWrite::new(0x16, 0x00), RegWrite::new(0xF9, 0x00), RegWrite::new(0x04, 0x01),
    RegWrite::new(0x17, 0x01), RegWrite::new(0x20, 0x10), RegWrite::new(0x21, 0x10),
    RegWrite::new(0x00, 0x80), RegWrite::new(0x01, 0x3A), RegWrite::new(0x16, 0x3F),
    RegWrite::new(0x16, 0x00),
];

/// Map an analog gain request in dB to the PGA gain code.
///
/// Codes step every 3 dB up to 33 dB; the last three codes sit at 33,
/// 36 and 37 dB, matching the PGA's top gain stages. Requests are rounded
/// half a dB up before lookup. Result is monotonic and saturates at
/// [`MAX_GAIN_CODE`].
pub fn gain_code(db: f32) -> u8 {
    let db = db + 0.5;
    if db <= 33.0 {
        // Negative requests saturate to code 0
        (db / 3.0) as u8
    } else if db < 36.0 {
        12
    } else if db < 37.0 {
        13
    } else {
        MAX_GAIN_CODE
    }
}

/// ES7243E driver
pub struct Es7243e {
    device: CodecDevice,
    gain_db: f32,
}

impl Es7243e {
    /// Create new ES7243E driver (unpowered)
    pub fn new(gain_db: f32) -> Self {
        Self {
            device: CodecDevice::new(CodecRole::Input, ES7243E_ADDR),
            gain_db,
        }
    }

    pub fn device(&self) -> &CodecDevice {
        &self.device
    }

    /// Run the bring-up table
    pub fn configure(&mut self, bus: &mut impl ControlBus) -> Result<(), BusError> {
        self.device.set_state(PowerState::Powering);
        let result = apply_sequence(bus, ES7243E_ADDR, &BRING_UP);
        self.device.track(result)?;
        self.device.set_state(PowerState::Ready);
        Ok(())
    }

    /// Program both PGA channels for `db`
    pub fn set_gain(&mut self, bus: &mut impl ControlBus, db: f32) -> Result<(), BusError> {
        self.gain_db = db;
        let reg_val = PGA_ENABLE | gain_code(db);
        let result = bus
            .write_register(ES7243E_ADDR, PGA1_GAIN, reg_val)
            .and_then(|_| bus.write_register(ES7243E_ADDR, PGA2_GAIN, reg_val));
        self.device.track(result)?;
        self.device.set_level_reg(reg_val);
        self.device.set_state(PowerState::Ready);
        Ok(())
    }

    /// Last requested gain in dB
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_code_linear_region() {
        assert_eq!(gain_code(0.0), 0);
        assert_eq!(gain_code(3.0), 1);
        assert_eq!(gain_code(24.0), 8);
        assert_eq!(gain_code(30.0), 10);
        assert_eq!(gain_code(32.0), 10);
        assert_eq!(gain_code(32.5), 11);
    }

    #[test]
    fn test_gain_code_high_tail() {
        assert_eq!(gain_code(33.0), 12);
        assert_eq!(gain_code(35.0), 12);
        assert_eq!(gain_code(36.0), 13);
        assert_eq!(gain_code(37.0), 14);
        assert_eq!(gain_code(60.0), 14);
    }

    #[test]
    fn test_gain_code_negative_saturates() {
        assert_eq!(gain_code(-12.0), 0);
    }
}
