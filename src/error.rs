//! Error types for the MMA8451 acquisition pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Error type for sensor and recording operations
#[derive(Error, Debug)]
pub enum AccelError {
    /// Transport-level failure talking to the sensor. Not retried: a bus
    /// fault indicates a wiring or hardware condition.
    #[error("I2C bus error: {0}")]
    Bus(String),

    /// Invalid WHO_AM_I response at initialization
    #[error("invalid WHO_AM_I response: expected 0x1A, got 0x{0:02X}")]
    IdentityMismatch(u8),

    /// Sensor-side FIFO reached capacity; the hardware is dropping samples
    /// that can never be recovered.
    #[error("sensor FIFO at capacity ({pending} of 32 samples), data loss imminent")]
    BufferOverrun { pending: u8 },

    /// Output file error, with the offending path
    #[error("file I/O error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AccelError {
    /// Attach path context to an I/O error.
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AccelError::FileIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type for sensor and recording operations
pub type Result<T> = std::result::Result<T, AccelError>;
