//! Scripted register bus shared by driver and recorder tests

use crate::bus::RegisterBus;
use crate::error::{AccelError, Result};
use crate::mma8451::{REG_F_STATUS, REG_OUT_X_MSB, REG_WHO_AM_I, WHO_AM_I_VALUE};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory bus that replays scripted F_STATUS bytes and sample frames and
/// records every register write.
pub(crate) struct MockBus {
    pub whoami: u8,
    /// F_STATUS bytes returned in order. Once drained, reads return 0 and
    /// `stop_when_drained` (if set) is cleared, simulating an operator
    /// interrupt at the end of the scripted data.
    pub statuses: VecDeque<u8>,
    /// 6-byte OUT_X_MSB blocks returned in order
    pub frames: VecDeque<[u8; 6]>,
    /// Log of (register, value) writes
    pub writes: Vec<(u8, u8)>,
    /// Any access to this register fails with a scripted bus fault
    pub fail_register: Option<u8>,
    pub stop_when_drained: Option<Arc<AtomicBool>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            whoami: WHO_AM_I_VALUE,
            statuses: VecDeque::new(),
            frames: VecDeque::new(),
            writes: Vec::new(),
            fail_register: None,
            stop_when_drained: None,
        }
    }

    fn check_fault(&self, reg: u8) -> Result<()> {
        if self.fail_register == Some(reg) {
            return Err(AccelError::Bus("scripted fault".into()));
        }
        Ok(())
    }
}

impl RegisterBus for MockBus {
    fn write_register(&mut self, _address: u8, reg: u8, value: u8) -> Result<()> {
        self.check_fault(reg)?;
        self.writes.push((reg, value));
        Ok(())
    }

    fn read_register(&mut self, _address: u8, reg: u8) -> Result<u8> {
        self.check_fault(reg)?;
        match reg {
            REG_WHO_AM_I => Ok(self.whoami),
            REG_F_STATUS => match self.statuses.pop_front() {
                Some(status) => Ok(status),
                None => {
                    if let Some(flag) = &self.stop_when_drained {
                        flag.store(false, Ordering::SeqCst);
                    }
                    Ok(0)
                }
            },
            _ => Ok(0),
        }
    }

    fn read_registers(&mut self, _address: u8, reg: u8, buf: &mut [u8]) -> Result<()> {
        self.check_fault(reg)?;
        assert_eq!(reg, REG_OUT_X_MSB, "unexpected block read at 0x{reg:02X}");
        let frame = self.frames.pop_front().expect("no scripted sample frame");
        buf.copy_from_slice(&frame);
        Ok(())
    }
}
