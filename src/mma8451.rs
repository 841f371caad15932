//! MMA8451 accelerometer driver
//!
//! Encapsulates the register-level protocol of the MMA8451 3-axis
//! accelerometer and presents a typed, unit-correct sampling interface over
//! any [`RegisterBus`].

use crate::bus::RegisterBus;
use crate::common::unix_timestamp;
use crate::error::{AccelError, Result};
use std::thread;
use std::time::Duration;

/// Default I2C address of the MMA8451
pub const DEFAULT_ADDRESS: u8 = 0x1D;

// MMA8451 register addresses
pub(crate) const REG_F_STATUS: u8 = 0x00;
pub(crate) const REG_OUT_X_MSB: u8 = 0x01;
pub(crate) const REG_F_SETUP: u8 = 0x09;
pub(crate) const REG_WHO_AM_I: u8 = 0x0D;
pub(crate) const REG_XYZ_DATA_CFG: u8 = 0x0E;
pub(crate) const REG_CTRL_REG1: u8 = 0x2A;
pub(crate) const REG_CTRL_REG2: u8 = 0x2B;
pub(crate) const REG_CTRL_REG4: u8 = 0x2D;
pub(crate) const REG_CTRL_REG5: u8 = 0x2E;

// CTRL_REG1 bits
const CTRL1_ACTIVE: u8 = 0x01;
const CTRL1_LOW_NOISE: u8 = 0x04;

// CTRL_REG2 bits
const CTRL2_SOFT_RESET: u8 = 0x40;
const CTRL2_HIGH_RESOLUTION: u8 = 0x02;

// CTRL_REG4/CTRL_REG5: data-ready interrupt enable and INT1 routing
const INT_EN_DATA_READY: u8 = 0x01;
const INT_CFG_DATA_READY_INT1: u8 = 0x01;

// F_SETUP bits
const F_SETUP_STOP_ON_OVERFLOW: u8 = 0x80;

// F_STATUS fields
const F_STATUS_OVERFLOW: u8 = 0x80;
const F_STATUS_COUNT_MASK: u8 = 0x3F;

/// Expected WHO_AM_I value
pub(crate) const WHO_AM_I_VALUE: u8 = 0x1A;

/// On-sensor FIFO capacity in samples. Once reached, the FIFO halts and the
/// hardware drops new samples.
pub const FIFO_CAPACITY: u8 = 32;

/// Minimum wait after reset and range-change writes before the device state
/// is guaranteed consistent.
const SETTLING_DELAY: Duration = Duration::from_millis(100);

/// Measurement range (full scale, ±g)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    G2,
    G4,
    G8,
}

impl Range {
    /// XYZ_DATA_CFG register value selecting this range
    fn cfg_bits(self) -> u8 {
        match self {
            Range::G2 => 0b00,
            Range::G4 => 0b01,
            Range::G8 => 0b10,
        }
    }

    /// Calibration scale converting 14-bit counts to g
    pub fn scale(self) -> f32 {
        match self {
            Range::G2 => 1.0 / 4096.0,
            Range::G4 => 1.0 / 2048.0,
            Range::G8 => 1.0 / 1024.0,
        }
    }

    pub fn from_label(label: &str) -> Option<Range> {
        match label {
            "2g" => Some(Range::G2),
            "4g" => Some(Range::G4),
            "8g" => Some(Range::G8),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Range::G2 => "2g",
            Range::G4 => "4g",
            Range::G8 => "8g",
        }
    }
}

/// Output data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRate {
    Hz50,
    Hz200,
    Hz400,
    Hz800,
}

impl OutputRate {
    /// CTRL_REG1 rate bits selecting this output rate
    fn ctrl1_bits(self) -> u8 {
        match self {
            OutputRate::Hz50 => 0x20,
            OutputRate::Hz200 => 0x10,
            OutputRate::Hz400 => 0x08,
            OutputRate::Hz800 => 0x00,
        }
    }

    pub fn hz(self) -> f32 {
        match self {
            OutputRate::Hz50 => 50.0,
            OutputRate::Hz200 => 200.0,
            OutputRate::Hz400 => 400.0,
            OutputRate::Hz800 => 800.0,
        }
    }

    pub fn from_hz(hz: u16) -> Option<OutputRate> {
        match hz {
            50 => Some(OutputRate::Hz50),
            200 => Some(OutputRate::Hz200),
            400 => Some(OutputRate::Hz400),
            800 => Some(OutputRate::Hz800),
            _ => None,
        }
    }
}

/// Sensor configuration, immutable once constructed
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    /// I2C address of the device
    pub address: u8,
    /// Measurement range; determines the calibration scale
    pub range: Range,
    /// Output data rate
    pub rate: OutputRate,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            range: Range::G2,
            rate: OutputRate::Hz400,
        }
    }
}

/// One calibrated accelerometer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedSample {
    /// X-axis acceleration in g
    pub x: f32,
    /// Y-axis acceleration in g
    pub y: f32,
    /// Z-axis acceleration in g
    pub z: f32,
    /// UNIX epoch seconds at read time
    pub timestamp: f64,
}

/// Snapshot of the sensor-side FIFO state
#[derive(Debug, Clone, Copy)]
pub struct FifoStatus {
    /// Overflow flag from F_STATUS. Never observed to latch with the
    /// stop-on-overflow setup used here; do not rely on it. `pending_count`
    /// is the signal that matters.
    pub overflowed: bool,
    /// Samples currently piled up in the FIFO (0 to 32)
    pub pending_count: u8,
}

/// Decode one axis from its big-endian register pair: the top 14 bits are
/// significant, two's complement, low 2 bits discarded.
fn decode_axis(msb: u8, lsb: u8) -> i16 {
    let raw = (u16::from_be_bytes([msb, lsb])) >> 2;
    if raw > 0x1FFF {
        raw as i16 - 0x4000
    } else {
        raw as i16
    }
}

/// MMA8451 sensor interface
///
/// Starts uninitialized; [`initialize`](Mma8451::initialize) must succeed
/// before any read or poll operation is valid.
pub struct Mma8451<B> {
    bus: B,
    config: SensorConfig,
    active: bool,
}

impl<B: RegisterBus> Mma8451<B> {
    /// Create an uninitialized driver over the given bus.
    pub fn new(bus: B, config: SensorConfig) -> Self {
        Self {
            bus,
            config,
            active: false,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Write a single byte to a device register on the configured address.
    fn write(&mut self, reg: u8, value: u8) -> Result<()> {
        self.bus.write_register(self.config.address, reg, value)
    }

    /// Verify the device identity and run the configuration write sequence.
    ///
    /// Acquisition fails without this: the device powers up in standby. On
    /// success the driver is active and [`read_sample`](Mma8451::read_sample)
    /// / [`poll_fifo`](Mma8451::poll_fifo) become valid.
    ///
    /// # Errors
    /// * [`AccelError::IdentityMismatch`] if WHO_AM_I does not read 0x1A
    /// * [`AccelError::Bus`] if any register transaction fails
    pub fn initialize(&mut self) -> Result<()> {
        let device_id = self.bus.read_register(self.config.address, REG_WHO_AM_I)?;
        if device_id != WHO_AM_I_VALUE {
            return Err(AccelError::IdentityMismatch(device_id));
        }

        // Soft reset, then let the device settle
        self.write(REG_CTRL_REG2, CTRL2_SOFT_RESET)?;
        thread::sleep(SETTLING_DELAY);

        // Active, low-noise, selected output rate
        self.write(REG_CTRL_REG1, 0x00)?;
        self.write(
            REG_CTRL_REG1,
            CTRL1_ACTIVE | CTRL1_LOW_NOISE | self.config.rate.ctrl1_bits(),
        )?;

        // Measurement range; range changes need the same settling time as reset
        self.write(REG_XYZ_DATA_CFG, self.config.range.cfg_bits())?;
        thread::sleep(SETTLING_DELAY);

        // High-resolution mode
        self.write(REG_CTRL_REG2, CTRL2_HIGH_RESOLUTION)?;

        // Enable the data-ready interrupt and route it to pin INT1
        self.write(REG_CTRL_REG4, 0x00)?;
        self.write(REG_CTRL_REG4, INT_EN_DATA_READY)?;
        self.write(REG_CTRL_REG5, 0x00)?;
        self.write(REG_CTRL_REG5, INT_CFG_DATA_READY_INT1)?;

        // FIFO halts on overflow rather than wrapping
        self.write(REG_F_SETUP, 0x00)?;
        self.write(REG_F_SETUP, F_SETUP_STOP_ON_OVERFLOW)?;

        self.active = true;
        Ok(())
    }

    /// Check the status of the FIFO buffer on the accelerometer.
    pub fn poll_fifo(&mut self) -> Result<FifoStatus> {
        assert!(self.active, "poll_fifo called before initialize");
        let status = self.bus.read_register(self.config.address, REG_F_STATUS)?;
        Ok(FifoStatus {
            overflowed: status & F_STATUS_OVERFLOW != 0,
            pending_count: status & F_STATUS_COUNT_MASK,
        })
    }

    /// Read one sample from the accelerometer.
    ///
    /// Returns `Ok(None)` when the FIFO has nothing pending; that is not an
    /// error. Otherwise decodes the three axes, applies the range calibration
    /// and stamps the sample with the current UNIX time.
    pub fn read_sample(&mut self) -> Result<Option<CalibratedSample>> {
        assert!(self.active, "read_sample called before initialize");
        let status = self.poll_fifo()?;
        if status.pending_count == 0 {
            return Ok(None);
        }

        let mut raw = [0u8; 6];
        self.bus
            .read_registers(self.config.address, REG_OUT_X_MSB, &mut raw)?;

        let scale = self.config.range.scale();
        Ok(Some(CalibratedSample {
            x: decode_axis(raw[0], raw[1]) as f32 * scale,
            y: decode_axis(raw[2], raw[3]) as f32 * scale,
            z: decode_axis(raw[4], raw[5]) as f32 * scale,
            timestamp: unix_timestamp(),
        }))
    }
}
