//! Hardware Abstraction Layer for the Box-Lite audio path.
//!
//! Traits at the seams, drivers on top of them.
//! The engine only sees [`ControlBus`], [`SampleStream`] and an
//! embedded-hal `OutputPin`; the board backend and the host simulation
//! both plug in here.

pub mod bus;
pub mod codec;
pub mod es7243e;
pub mod es8156;
pub mod i2s;

#[cfg(target_os = "espidf")]
pub mod esp;

#[cfg(not(target_os = "espidf"))]
pub mod sim;

pub use bus::{apply_sequence, BusError, ControlBus, I2cControlBus, RegWrite};
pub use codec::{CodecDevice, CodecRole, PowerState};
pub use es7243e::{Es7243e, ES7243E_ADDR};
pub use es8156::{Es8156, ES8156_ADDR};
pub use i2s::{SampleStream, StreamError};
