//! MMA8451 accelerometer data acquisition
//!
//! This library continuously samples a 3-axis MMA8451 accelerometer over I2C
//! and records timestamped, calibrated samples to rotating binary files. The
//! sensor's 32-sample FIFO is monitored on every loop iteration: a growing
//! backlog is surfaced as a warning, a full FIFO stops acquisition so that
//! data loss is explicit rather than silent.
//!
//! # Quick Start
//!
//! ```no_run
//! use linux_embedded_hal::I2cdev;
//! use mma8451_daq::{Mma8451, Recorder, SensorConfig};
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! let bus = I2cdev::new("/dev/i2c-1")?;
//! let mut driver = Mma8451::new(bus, SensorConfig::default());
//! driver.initialize()?;
//!
//! let running = Arc::new(AtomicBool::new(true));
//! let mut recorder = Recorder::new(driver, "/var/data", running);
//! let summary = recorder.run()?;
//! println!("{} samples written", summary.samples_written);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading recorded data back
//!
//! ```no_run
//! use mma8451_daq::read_time_range;
//!
//! let samples = read_time_range("/var/data", 1_704_110_400.0, 1_704_110_460.0)?;
//! for sample in &samples {
//!     println!("{:.3}: {:+.4} g", sample.timestamp, sample.z);
//! }
//! # Ok::<(), mma8451_daq::AccelError>(())
//! ```

pub mod bus;
pub mod common;
pub mod error;
pub mod format;
pub mod mma8451;
pub mod readback;
pub mod recorder;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export public API
pub use bus::RegisterBus;
pub use error::{AccelError, Result};
pub use format::{
    read_data_file, read_file_header, DataFileWriter, FileHeader, HEADER_SIZE, RECORD_SIZE,
};
pub use mma8451::{
    CalibratedSample, FifoStatus, Mma8451, OutputRate, Range, SensorConfig, DEFAULT_ADDRESS,
    FIFO_CAPACITY,
};
pub use readback::read_time_range;
pub use recorder::{Recorder, RecordingSummary, DEFAULT_FILE_PREFIX, DEFAULT_MAX_FILE_SIZE};
