//! Control-bus transport
//!
//! Register access to the codecs over the shared two-wire bus.
//! Every call is one complete transaction; the bus itself is exclusive,
//! so callers serialize access (the engine owns the only handle).
//!
//! Register tables are applied with [`apply_sequence`], which stops at the
//! first failed write. Nothing is retried and nothing is rolled back.

use embedded_hal::i2c::{ErrorKind, I2c};
use thiserror::Error;

/// Control-bus failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Device did not acknowledge its address or a data byte
    #[error("no acknowledge from 0x{address:02X} at register 0x{reg:02X}")]
    Nack { address: u8, reg: u8 },
    /// Timeout, arbitration loss or any other transfer failure
    #[error("transaction with 0x{address:02X} failed at register 0x{reg:02X}")]
    Transaction { address: u8, reg: u8 },
    /// Bus driver could not be brought up
    #[error("control bus unavailable")]
    Unavailable,
}

/// Register-level access to codec devices.
///
/// Addresses are 7-bit.
pub trait ControlBus {
    /// Bring the bus up. Succeeds if it is already up.
    fn init(&mut self) -> Result<(), BusError>;

    /// Write one register.
    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), BusError>;

    /// Read one register.
    fn read_register(&mut self, address: u8, reg: u8) -> Result<u8, BusError>;
}

/// One entry of a vendor bring-up table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWrite {
    pub reg: u8,
    pub value: u8,
}

impl RegWrite {
    pub const fn new(reg: u8, value: u8) -> Self {
        Self { reg, value }
    }
}

/// Write a register table in order, aborting on the first failure.
///
/// Registers written before the failing entry keep their new values.
pub fn apply_sequence<B: ControlBus + ?Sized>(
    bus: &mut B,
    address: u8,
    sequence: &[RegWrite],
) -> Result<(), BusError> {
    for (step, entry) in sequence.iter().enumerate() {
        if let Err(e) = bus.write_register(address, entry.reg, entry.value) {
            log::warn!(
                "bus: 0x{:02X} sequence aborted at step {}/{}: {}",
                address,
                step + 1,
                sequence.len(),
                e
            );
            return Err(e);
        }
    }
    log::trace!("bus: 0x{:02X} applied {} registers", address, sequence.len());
    Ok(())
}

/// [`ControlBus`] over any embedded-hal I2C master.
///
/// The transaction timeout is a property of the underlying driver
/// (configured to [`BUS_TIMEOUT`](crate::config::BUS_TIMEOUT) on the board).
pub struct I2cControlBus<I> {
    i2c: I,
}

impl<I: I2c> I2cControlBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the I2C driver back
    pub fn release(self) -> I {
        self.i2c
    }
}

fn map_i2c_error<E: embedded_hal::i2c::Error>(e: E, address: u8, reg: u8) -> BusError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::Nack { address, reg },
        _ => BusError::Transaction { address, reg },
    }
}

impl<I: I2c> ControlBus for I2cControlBus<I> {
    fn init(&mut self) -> Result<(), BusError> {
        // Driver is configured on construction
        Ok(())
    }

    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(address, &[reg, value])
            .map_err(|e| map_i2c_error(e, address, reg))
    }

    fn read_register(&mut self, address: u8, reg: u8) -> Result<u8, BusError> {
        // Pointer write and data read are separate transactions (STOP between)
        self.i2c
            .write(address, &[reg])
            .map_err(|e| map_i2c_error(e, address, reg))?;

        let mut buf = [0u8; 1];
        self.i2c
            .read(address, &mut buf)
            .map_err(|e| map_i2c_error(e, address, reg))?;
        Ok(buf[0])
    }
}
