//! Control-bus transport tests

use boxlite_audio::hal::bus::{apply_sequence, BusError, ControlBus, I2cControlBus, RegWrite};
use boxlite_audio::hal::sim::SimBus;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// Register-file I2C device with an auto-incrementing pointer
struct FakeI2c {
    address: u8,
    regs: [u8; 256],
    pointer: u8,
    transactions: Vec<Vec<u8>>,
    arbitration_loss: bool,
}

impl FakeI2c {
    fn new(address: u8) -> Self {
        Self {
            address,
            regs: [0; 256],
            pointer: 0,
            transactions: Vec::new(),
            arbitration_loss: false,
        }
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if self.arbitration_loss {
            return Err(ErrorKind::ArbitrationLoss);
        }
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.transactions.push(bytes.to_vec());
                    if let Some((&reg, data)) = bytes.split_first() {
                        self.pointer = reg;
                        for &b in data {
                            self.regs[self.pointer as usize] = b;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.regs[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

const TABLE: [RegWrite; 4] = [
    RegWrite::new(0x00, 0x3F),
    RegWrite::new(0x01, 0x20),
    RegWrite::new(0x02, 0x04),
    RegWrite::new(0x03, 0x11),
];

#[test]
fn test_apply_sequence_writes_in_order() {
    let mut bus = SimBus::new();
    apply_sequence(&mut bus, 0x08, &TABLE).unwrap();

    let regs: Vec<u8> = bus.writes().iter().map(|w| w.reg).collect();
    assert_eq!(regs, vec![0x00, 0x01, 0x02, 0x03]);
    assert_eq!(bus.register(0x08, 0x03), Some(0x11));
}

#[test]
fn test_apply_sequence_aborts_on_first_failure() {
    let mut bus = SimBus::new();
    bus.fail_transaction(2);

    let result = apply_sequence(&mut bus, 0x08, &TABLE);
    assert_eq!(result, Err(BusError::Nack { address: 0x08, reg: 0x02 }));

    // Earlier writes stay, later ones never happen
    assert_eq!(bus.writes().len(), 2);
    assert_eq!(bus.transactions(), 3);
    assert_eq!(bus.register(0x08, 0x03), None);
}

#[test]
fn test_sim_bus_read_unwritten_register_nacks() {
    let mut bus = SimBus::new();
    assert_eq!(
        bus.read_register(0x10, 0xFD),
        Err(BusError::Nack { address: 0x10, reg: 0xFD })
    );
    bus.preload(0x10, 0xFD, 0x7A);
    assert_eq!(bus.read_register(0x10, 0xFD), Ok(0x7A));
}

#[test]
fn test_i2c_bus_write_register() {
    let mut bus = I2cControlBus::new(FakeI2c::new(0x08));
    bus.init().unwrap();
    bus.write_register(0x08, 0x14, 0xB3).unwrap();

    let i2c = bus.release();
    assert_eq!(i2c.transactions, vec![vec![0x14, 0xB3]]);
    assert_eq!(i2c.regs[0x14], 0xB3);
}

#[test]
fn test_i2c_bus_read_register_sets_pointer_first() {
    let mut i2c = FakeI2c::new(0x10);
    i2c.regs[0xFD] = 0x7A;
    let mut bus = I2cControlBus::new(i2c);

    assert_eq!(bus.read_register(0x10, 0xFD), Ok(0x7A));
    assert_eq!(bus.release().transactions, vec![vec![0xFD]]);
}

#[test]
fn test_i2c_bus_maps_nack() {
    let mut bus = I2cControlBus::new(FakeI2c::new(0x08));
    assert_eq!(
        bus.write_register(0x18, 0x00, 0x01),
        Err(BusError::Nack { address: 0x18, reg: 0x00 })
    );
}

#[test]
fn test_i2c_bus_maps_other_failures() {
    let mut i2c = FakeI2c::new(0x08);
    i2c.arbitration_loss = true;
    let mut bus = I2cControlBus::new(i2c);
    assert_eq!(
        bus.read_register(0x08, 0x14),
        Err(BusError::Transaction { address: 0x08, reg: 0x14 })
    );
}
