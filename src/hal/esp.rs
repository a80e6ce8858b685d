//! ESP-IDF backend for the ESP32-S3-Box-Lite.
//!
//! Control bus: native `I2cDriver` calls bounded by [`BUS_TIMEOUT`]. Sample stream: one
//! full-duplex I2S standard-mode channel pair on I2S0, master, 16-bit mono
//! (left slot), MCLK = 256 x fs. Amplifier: push-pull GPIO46.

use core::ffi::c_void;
use core::ptr;
use core::time::Duration;

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Gpio18, Gpio8, Output, PinDriver};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver, I2C0};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{self, esp, EspError};

use super::bus::{BusError, ControlBus};
use super::i2s::{retune_both, Direction, SampleStream, StreamError};
use crate::config::{BoardPins, BOX_LITE_PINS, BUS_TIMEOUT, I2C_CLOCK_HZ};

/// Amplifier enable line of the board
pub type BoardAmp = PinDriver<'static, AnyOutputPin, Output>;

/// Mount point of the SPIFFS data partition
pub const STORAGE_ROOT: &str = "/spiffs";

/// Codec control bus on I2C0
pub struct EspControlBus {
    driver: I2cDriver<'static>,
    timeout: u32,
}

impl EspControlBus {
    /// Open I2C0 on the board's SDA (GPIO8) and SCL (GPIO18).
    pub fn new(i2c: I2C0, sda: Gpio8, scl: Gpio18) -> Result<Self, EspError> {
        let config = I2cConfig::new()
            .baudrate(Hertz(I2C_CLOCK_HZ))
            .sda_enable_pullup(true)
            .scl_enable_pullup(true);
        let driver = I2cDriver::new(i2c, sda, scl, &config)?;
        Ok(Self {
            driver,
            timeout: TickType::new_millis(BUS_TIMEOUT.as_millis() as u64).ticks(),
        })
    }
}

/// ESP-IDF reports a missing ACK as `ESP_FAIL`
fn bus_error(e: EspError, address: u8, reg: u8) -> BusError {
    if e.code() == sys::ESP_FAIL {
        BusError::Nack { address, reg }
    } else {
        BusError::Transaction { address, reg }
    }
}

impl ControlBus for EspControlBus {
    fn init(&mut self) -> Result<(), BusError> {
        // Driver is installed by `new`
        Ok(())
    }

    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.driver
            .write(address, &[reg, value], self.timeout)
            .map_err(|e| bus_error(e, address, reg))
    }

    fn read_register(&mut self, address: u8, reg: u8) -> Result<u8, BusError> {
        self.driver
            .write(address, &[reg], self.timeout)
            .map_err(|e| bus_error(e, address, reg))?;
        let mut buf = [0u8; 1];
        self.driver
            .read(address, &mut buf, self.timeout)
            .map_err(|e| bus_error(e, address, reg))?;
        Ok(buf[0])
    }
}

/// Amplifier line, driven low until the engine raises it
pub fn board_amp(pin: AnyOutputPin) -> Result<BoardAmp, EspError> {
    let mut amp = PinDriver::output(pin)?;
    amp.set_low()?;
    Ok(amp)
}

/// Mount the SPIFFS partition at [`STORAGE_ROOT`], formatting it if needed.
pub fn mount_storage() -> Result<(), EspError> {
    let conf = sys::esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: ptr::null(),
        max_files: 5,
        format_if_mount_failed: true,
    };
    esp!(unsafe { sys::esp_vfs_spiffs_register(&conf) })?;
    log::info!("storage: SPIFFS mounted at {}", STORAGE_ROOT);
    Ok(())
}

fn stream_error(e: EspError) -> StreamError {
    StreamError::Io(e.code())
}

fn clock_config(sample_rate: u32) -> sys::i2s_std_clk_config_t {
    sys::i2s_std_clk_config_t {
        sample_rate_hz: sample_rate,
        clk_src: sys::soc_periph_i2s_clk_src_t_I2S_CLK_SRC_DEFAULT,
        mclk_multiple: sys::i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_256,
        ..Default::default()
    }
}

/// Full-duplex I2S stream (new channel API)
pub struct EspSampleStream {
    pins: BoardPins,
    tx: sys::i2s_chan_handle_t,
    rx: sys::i2s_chan_handle_t,
    /// Rate both channels are clocked at
    sample_rate: u32,
}

// SAFETY: channel handles are only used through `&mut self`
unsafe impl Send for EspSampleStream {}

impl EspSampleStream {
    pub fn new() -> Self {
        Self::with_pins(BOX_LITE_PINS)
    }

    pub fn with_pins(pins: BoardPins) -> Self {
        Self {
            pins,
            tx: ptr::null_mut(),
            rx: ptr::null_mut(),
            sample_rate: 0,
        }
    }

    fn installed(&self) -> bool {
        !self.tx.is_null() && !self.rx.is_null()
    }

    fn std_config(&self, sample_rate: u32) -> sys::i2s_std_config_t {
        let slot = sys::i2s_std_slot_config_t {
            data_bit_width: sys::i2s_data_bit_width_t_I2S_DATA_BIT_WIDTH_16BIT,
            slot_bit_width: sys::i2s_slot_bit_width_t_I2S_SLOT_BIT_WIDTH_AUTO,
            slot_mode: sys::i2s_slot_mode_t_I2S_SLOT_MODE_MONO,
            slot_mask: sys::i2s_std_slot_mask_t_I2S_STD_SLOT_LEFT,
            ws_width: 16,
            ws_pol: false,
            bit_shift: true,
            ..Default::default()
        };

        sys::i2s_std_config_t {
            clk_cfg: clock_config(sample_rate),
            slot_cfg: slot,
            gpio_cfg: sys::i2s_std_gpio_config_t {
                mclk: self.pins.i2s_mclk,
                bclk: self.pins.i2s_bclk,
                ws: self.pins.i2s_ws,
                dout: self.pins.i2s_dout,
                din: self.pins.i2s_din,
                ..Default::default()
            },
        }
    }

    /// Enable both channels; both are attempted even if TX fails
    fn enable(&mut self) -> Result<(), EspError> {
        let tx = esp!(unsafe { sys::i2s_channel_enable(self.tx) });
        let rx = esp!(unsafe { sys::i2s_channel_enable(self.rx) });
        tx.and(rx)
    }

    /// Disable both channels; both are attempted even if TX fails
    fn disable(&mut self) -> Result<(), EspError> {
        let tx = esp!(unsafe { sys::i2s_channel_disable(self.tx) });
        let rx = esp!(unsafe { sys::i2s_channel_disable(self.rx) });
        tx.and(rx)
    }

    fn handle(&self, dir: Direction) -> sys::i2s_chan_handle_t {
        match dir {
            Direction::Tx => self.tx,
            Direction::Rx => self.rx,
        }
    }

    fn install_channels(&mut self, sample_rate: u32) -> Result<(), EspError> {
        let chan = sys::i2s_chan_config_t {
            id: sys::i2s_port_t_I2S_NUM_0,
            role: sys::i2s_role_t_I2S_ROLE_MASTER,
            dma_desc_num: 6,
            dma_frame_num: 240,
            ..Default::default()
        };
        esp!(unsafe { sys::i2s_new_channel(&chan, &mut self.tx, &mut self.rx) })?;

        let std = self.std_config(sample_rate);
        esp!(unsafe { sys::i2s_channel_init_std_mode(self.tx, &std) })?;
        esp!(unsafe { sys::i2s_channel_init_std_mode(self.rx, &std) })?;
        self.enable()?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    fn release(&mut self) {
        if self.installed() {
            if let Err(e) = self.disable() {
                log::debug!("i2s: disable on release: {}", e);
            }
            unsafe {
                sys::i2s_del_channel(self.tx);
                sys::i2s_del_channel(self.rx);
            }
        }
        self.tx = ptr::null_mut();
        self.rx = ptr::null_mut();
        self.sample_rate = 0;
    }
}

impl Default for EspSampleStream {
    fn default() -> Self {
        Self::new()
    }
}

fn timeout_ms(timeout: Option<Duration>) -> u32 {
    match timeout {
        Some(t) => u32::try_from(t.as_millis()).unwrap_or(u32::MAX),
        None => u32::MAX, // portMAX_DELAY
    }
}

/// Samples moved by a read or write; a timeout still reports the partial count
fn transferred(err: sys::esp_err_t, bytes: usize) -> Result<usize, StreamError> {
    if err == sys::ESP_OK as sys::esp_err_t || err == sys::ESP_ERR_TIMEOUT as sys::esp_err_t {
        Ok(bytes / 2)
    } else {
        Err(StreamError::Io(err))
    }
}

impl SampleStream for EspSampleStream {
    fn install(&mut self, sample_rate: u32) -> Result<(), StreamError> {
        if self.installed() {
            return self.set_sample_rate(sample_rate);
        }
        if let Err(e) = self.install_channels(sample_rate) {
            self.release();
            return Err(stream_error(e));
        }
        log::info!("i2s: full duplex at {} Hz", sample_rate);
        Ok(())
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), StreamError> {
        if !self.installed() {
            return Err(StreamError::NotInstalled);
        }
        if sample_rate == 0 {
            return Err(StreamError::UnsupportedRate(sample_rate));
        }
        if sample_rate == self.sample_rate {
            return Ok(());
        }

        // Both directions share BCLK/WS: stop both, retune both or neither,
        // restart
        if let Err(e) = self.disable() {
            log::warn!("i2s: cannot stop channels for reclock: {}", e);
            // Whatever did stop must run again at the old rate
            if let Err(e) = self.enable() {
                log::warn!("i2s: restart after failed stop: {}", e);
            }
            return Err(stream_error(e));
        }

        let current = self.sample_rate;
        let retuned = retune_both(current, sample_rate, |dir, hz| {
            let clk = clock_config(hz);
            esp!(unsafe { sys::i2s_channel_reconfig_std_clock(self.handle(dir), &clk) })
        });
        if retuned.is_ok() {
            self.sample_rate = sample_rate;
        }

        let enabled = self.enable();
        retuned.map_err(|_| StreamError::UnsupportedRate(sample_rate))?;
        enabled.map_err(stream_error)
    }

    fn read(&mut self, buf: &mut [i16], timeout: Option<Duration>) -> Result<usize, StreamError> {
        if !self.installed() {
            return Err(StreamError::NotInstalled);
        }
        let mut bytes = 0usize;
        let err = unsafe {
            sys::i2s_channel_read(
                self.rx,
                buf.as_mut_ptr() as *mut c_void,
                core::mem::size_of_val(buf),
                &mut bytes,
                timeout_ms(timeout),
            )
        };
        transferred(err, bytes)
    }

    fn write(&mut self, buf: &[i16]) -> Result<usize, StreamError> {
        if !self.installed() {
            return Err(StreamError::NotInstalled);
        }
        let mut bytes = 0usize;
        let err = unsafe {
            sys::i2s_channel_write(
                self.tx,
                buf.as_ptr() as *const c_void,
                core::mem::size_of_val(buf),
                &mut bytes,
                u32::MAX,
            )
        };
        transferred(err, bytes)
    }
}

impl Drop for EspSampleStream {
    fn drop(&mut self) {
        self.release();
    }
}
