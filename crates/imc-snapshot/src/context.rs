//! `HardwareContext` owns the driver handle and mutex broker explicitly
//! (design note §9: "no process-wide statics"); S/X/P all borrow it rather
//! than reaching for globals.

use imc_kio::DriverHandle;
use imc_lock::MutexBroker;

use crate::error::{Error, Result};

pub struct HardwareContext {
    pub driver: DriverHandle,
    pub lock: MutexBroker,
}

impl HardwareContext {
    /// Opens the kernel-helper device. Failure here is fatal to the whole
    /// snapshot (spec §4.1: "failure to open the driver handle is fatal").
    pub fn open() -> Result<Self> {
        let driver = DriverHandle::open_default().map_err(|_| Error::DriverUnavailable)?;
        Ok(Self { driver, lock: MutexBroker::new() })
    }
}
