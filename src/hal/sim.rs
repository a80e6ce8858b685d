//! Simulated hardware for host builds.
//!
//! `SimBus` keeps a register file per address and can fail any single
//! transaction. `SimStream` plays back queued capture samples and records
//! everything written, call by call. `SimPin` records every level driven
//! on the amplifier line.

use core::convert::Infallible;
use core::time::Duration;
use std::collections::{HashMap, VecDeque};

use embedded_hal::digital::{ErrorType, OutputPin};

use super::bus::{BusError, ControlBus};
use super::i2s::{SampleStream, StreamError};

/// One logged control-bus write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub address: u8,
    pub reg: u8,
    pub value: u8,
}

/// In-memory control bus
#[derive(Debug, Default)]
pub struct SimBus {
    registers: HashMap<(u8, u8), u8>,
    writes: Vec<BusWrite>,
    transactions: usize,
    init_calls: usize,
    fail_at: Option<usize>,
    fail_init: bool,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the transaction with this zero-based index (counted over the
    /// bus lifetime, reads and writes alike).
    pub fn fail_transaction(&mut self, index: usize) {
        self.fail_at = Some(index);
    }

    /// Make `init` fail until cleared
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Stop injecting transaction failures
    pub fn clear_failures(&mut self) {
        self.fail_at = None;
        self.fail_init = false;
    }

    /// Every successful write, in order
    pub fn writes(&self) -> &[BusWrite] {
        &self.writes
    }

    /// Successful writes addressed to one device
    pub fn writes_to(&self, address: u8) -> Vec<BusWrite> {
        self.writes.iter().copied().filter(|w| w.address == address).collect()
    }

    /// Transactions attempted (including the failed one)
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls
    }

    /// Current register content, if ever written
    pub fn register(&self, address: u8, reg: u8) -> Option<u8> {
        self.registers.get(&(address, reg)).copied()
    }

    /// Preload a register (e.g. a chip ID)
    pub fn preload(&mut self, address: u8, reg: u8, value: u8) {
        self.registers.insert((address, reg), value);
    }

    fn begin_transaction(&mut self, address: u8, reg: u8) -> Result<(), BusError> {
        let index = self.transactions;
        self.transactions += 1;
        if self.fail_at == Some(index) {
            return Err(BusError::Nack { address, reg });
        }
        Ok(())
    }
}

impl ControlBus for SimBus {
    fn init(&mut self) -> Result<(), BusError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(BusError::Unavailable);
        }
        Ok(())
    }

    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.begin_transaction(address, reg)?;
        self.registers.insert((address, reg), value);
        self.writes.push(BusWrite { address, reg, value });
        Ok(())
    }

    fn read_register(&mut self, address: u8, reg: u8) -> Result<u8, BusError> {
        self.begin_transaction(address, reg)?;
        self.registers
            .get(&(address, reg))
            .copied()
            .ok_or(BusError::Nack { address, reg })
    }
}

/// In-memory sample stream
#[derive(Debug, Default)]
pub struct SimStream {
    sample_rate: Option<u32>,
    rate_history: Vec<u32>,
    capture: VecDeque<i16>,
    played: Vec<i16>,
    write_calls: Vec<usize>,
    read_calls: Vec<(usize, Option<Duration>)>,
    /// Remaining samples the playback side accepts; `None` = unlimited
    write_budget: Option<usize>,
    fail_install: bool,
    loopback: bool,
}

impl SimStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream whose playback side feeds its capture side
    pub fn loopback() -> Self {
        Self {
            loopback: true,
            ..Self::default()
        }
    }

    /// Queue samples for the capture side
    pub fn push_capture(&mut self, samples: &[i16]) {
        self.capture.extend(samples.iter().copied());
    }

    /// Accept only `samples` more playback samples, then stall
    pub fn limit_writes(&mut self, samples: usize) {
        self.write_budget = Some(samples);
    }

    pub fn set_fail_install(&mut self, fail: bool) {
        self.fail_install = fail;
    }

    /// Installed rate, `None` before `install`
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Every rate applied, in order (install included)
    pub fn rate_history(&self) -> &[u32] {
        &self.rate_history
    }

    /// All samples accepted by the playback side
    pub fn played(&self) -> &[i16] {
        &self.played
    }

    /// Samples accepted per `write` call
    pub fn write_calls(&self) -> &[usize] {
        &self.write_calls
    }

    /// Requested length and timeout per `read` call
    pub fn read_calls(&self) -> &[(usize, Option<Duration>)] {
        &self.read_calls
    }

    /// Capture samples still queued
    pub fn pending_capture(&self) -> usize {
        self.capture.len()
    }

    fn installed(&self) -> Result<(), StreamError> {
        self.sample_rate.map(|_| ()).ok_or(StreamError::NotInstalled)
    }
}

impl SampleStream for SimStream {
    fn install(&mut self, sample_rate: u32) -> Result<(), StreamError> {
        if self.fail_install {
            return Err(StreamError::Io(-1));
        }
        self.set_sample_rate(sample_rate)
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), StreamError> {
        if sample_rate == 0 {
            return Err(StreamError::UnsupportedRate(sample_rate));
        }
        self.sample_rate = Some(sample_rate);
        self.rate_history.push(sample_rate);
        Ok(())
    }

    fn read(&mut self, buf: &mut [i16], timeout: Option<Duration>) -> Result<usize, StreamError> {
        self.installed()?;
        self.read_calls.push((buf.len(), timeout));
        let n = buf.len().min(self.capture.len());
        for (slot, sample) in buf.iter_mut().zip(self.capture.drain(..n)) {
            *slot = sample;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[i16]) -> Result<usize, StreamError> {
        self.installed()?;
        let n = match self.write_budget {
            Some(budget) => buf.len().min(budget),
            None => buf.len(),
        };
        if let Some(budget) = self.write_budget.as_mut() {
            *budget -= n;
        }
        self.write_calls.push(n);
        self.played.extend_from_slice(&buf[..n]);
        if self.loopback {
            self.capture.extend(buf[..n].iter().copied());
        }
        Ok(n)
    }
}

/// Amplifier enable line
#[derive(Debug, Default)]
pub struct SimPin {
    high: bool,
    history: Vec<bool>,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Every level driven, in order (`true` = high)
    pub fn history(&self) -> &[bool] {
        &self.history
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        self.history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        self.history.push(true);
        Ok(())
    }
}
