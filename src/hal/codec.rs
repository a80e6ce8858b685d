//! Codec device bookkeeping shared by the output and input drivers.

/// Which side of the audio path a codec serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecRole {
    /// DAC driving the speaker amplifier
    Output,
    /// ADC behind the microphone
    Input,
}

/// Codec power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Never configured
    Off,
    /// Bring-up table in progress
    Powering,
    /// Configured and running
    Ready,
    /// Last register transaction failed; the next successful level write
    /// or `begin()` clears it
    Faulted,
}

/// One codec on the control bus
#[derive(Debug, Clone)]
pub struct CodecDevice {
    role: CodecRole,
    address: u8,
    /// Last value programmed into the level register (volume or gain code)
    level_reg: u8,
    state: PowerState,
}

impl CodecDevice {
    pub const fn new(role: CodecRole, address: u8) -> Self {
        Self {
            role,
            address,
            level_reg: 0,
            state: PowerState::Off,
        }
    }

    #[inline]
    pub fn role(&self) -> CodecRole {
        self.role
    }

    /// 7-bit bus address
    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    #[inline]
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Last programmed level register value
    #[inline]
    pub fn level_reg(&self) -> u8 {
        self.level_reg
    }

    pub(crate) fn set_state(&mut self, state: PowerState) {
        if self.state != state {
            log::debug!("codec {:?}@0x{:02X}: {:?} -> {:?}", self.role, self.address, self.state, state);
        }
        self.state = state;
    }

    pub(crate) fn set_level_reg(&mut self, value: u8) {
        self.level_reg = value;
    }

    /// Pass `result` through, marking the device faulted on error.
    pub(crate) fn track<T, E>(&mut self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.set_state(PowerState::Faulted);
        }
        result
    }
}
