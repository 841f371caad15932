//! Register-bus abstraction over the sensor's I2C transport
//!
//! The MMA8451 protocol is plain register reads and writes, so everything the
//! driver needs from the transport is captured by [`RegisterBus`]. The
//! production implementation drives a Linux i2c-dev node through
//! `linux-embedded-hal`; tests substitute a scripted bus.

use crate::error::{AccelError, Result};
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;

/// Blocking register-level transactions against a single bus device.
///
/// Each call is one complete bus round-trip: it either completes or fails
/// outright. No timeouts or retries are modeled; a failure surfaces as
/// [`AccelError::Bus`] and indicates a wiring or hardware condition.
pub trait RegisterBus {
    /// Write a single byte to a register.
    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<()>;

    /// Read a single byte from a register.
    fn read_register(&mut self, address: u8, reg: u8) -> Result<u8>;

    /// Read consecutive registers starting at `reg` into `buf`.
    fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<()>;
}

impl RegisterBus for I2cdev {
    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<()> {
        self.write(address, &[reg, value])
            .map_err(|e| AccelError::Bus(format!("{e:?}")))
    }

    fn read_register(&mut self, address: u8, reg: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.write_read(address, &[reg], &mut buf)
            .map_err(|e| AccelError::Bus(format!("{e:?}")))?;
        Ok(buf[0])
    }

    fn read_registers(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<()> {
        self.write_read(address, &[reg], buf)
            .map_err(|e| AccelError::Bus(format!("{e:?}")))
    }
}
