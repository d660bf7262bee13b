//! SMBus engine (component S, spec §4.4): controller discovery, a
//! strategy-selected transport (driver "smart" IOCTLs or raw i801 port
//! sequencing), the SPD5 hub driver and the Richtek PMIC driver.

mod discover;
mod error;
mod i801;
mod method;
mod pmic;
mod spd5;

pub use discover::{find_controller, smbus_name, SmbusController, PCI_ID_SMBUS_INTEL};
pub use error::{Error, Result};
pub use method::{DriverMethod, PortMethod, SmbusMethod, Xact};
pub use pmic::{Channel, Identity, RichtekPmic, PMIC_BASE_ADDRESS, PMIC_BASE_ADDRESS_ALT};
pub use spd5::{Spd5Hub, FULL_DUMP_LEN, SMBUS_SPD_ADDRESS, SPD5_MR11, SPD5_MR18, SPD5_MR3, SPD5_MR49};

use std::time::{Duration, Instant};

use imc_kio::KernelIo;
use imc_lock::{LockBroker, Resource};

use crate::i801::{SMBHSTSTS, SMBHSTSTS_INUSE_STS};

/// How often [`SmbusEngine::wait_for_inuse_clear`] re-polls the host
/// controller's INUSE_STS bit while waiting for it to clear.
const INUSE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Owns the discovered controller and picks a transport method once, at
/// construction (design note §9). Every public operation acquires the
/// SMBus mutex for its duration and releases it before returning.
pub struct SmbusEngine<'a, L: LockBroker> {
    kio: &'a dyn KernelIo,
    lock: &'a L,
    controller: SmbusController,
    use_driver_method: bool,
    inuse_timeout: Duration,
}

impl<'a, L: LockBroker> SmbusEngine<'a, L> {
    /// Discovers the controller and probes whether the driver's "smart"
    /// IOCTLs are implemented; falls back to raw port sequencing if not
    /// (spec §4.4 "Method A ... Use when the driver supports these").
    ///
    /// `inuse_timeout` bounds the host-controller INUSE handshake every
    /// [`Self::with_lock`] call performs (spec §4.2): independent of, and
    /// nested inside, the OS mutex acquired per call.
    pub fn discover(kio: &'a dyn KernelIo, lock: &'a L, inuse_timeout: Duration) -> Result<Self> {
        let controller = find_controller(kio)?;
        let use_driver_method = kio
            .smbus_read_byte(controller.io_base, SMBUS_SPD_ADDRESS, SPD5_MR3)
            .is_ok();
        Ok(Self { kio, lock, controller, use_driver_method, inuse_timeout })
    }

    fn with_method<T>(&self, f: impl FnOnce(&dyn SmbusMethod) -> Result<T>) -> Result<T> {
        if self.use_driver_method {
            f(&DriverMethod { kio: self.kio })
        } else {
            f(&PortMethod { kio: self.kio })
        }
    }

    /// Polls `SMBHSTSTS.INUSE_STS` until it clears or `self.inuse_timeout`
    /// elapses, returning the status byte observed at the moment it cleared
    /// (spec §4.2: "waits up to `inuse_timeout` (~500 ms) for the host
    /// controller's INUSE bit to clear"). A deadline with no clear is
    /// `imc_lock::Error::InUseTimeout`, the same error kind spec §7 assigns
    /// this handshake.
    fn wait_for_inuse_clear(&self) -> Result<u8> {
        let base = self.controller.io_base;
        let deadline = Instant::now() + self.inuse_timeout;
        loop {
            let status = self.kio.port_read(base + SMBHSTSTS, 1)? as u8;
            if status & SMBHSTSTS_INUSE_STS == 0 {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                return Err(imc_lock::Error::InUseTimeout.into());
            }
            std::thread::sleep(INUSE_POLL_INTERVAL);
        }
    }

    /// Runs `f` under the SMBus mutex, bounded by `mutex_wait` (spec §5:
    /// every SMBus access is serialised by the named mutex for its whole
    /// duration, released before returning). Inside the mutex, also waits
    /// out the host controller's own INUSE handshake (spec §4.2), claims it
    /// by writing the status register back with INUSE_STS set, and restores
    /// the pre-claim value once `f` returns.
    fn with_lock<T>(&self, mutex_wait: Duration, f: impl FnOnce(&dyn SmbusMethod) -> Result<T>) -> Result<T> {
        self.lock.with_lock(Resource::Smbus, mutex_wait, || {
            let base = self.controller.io_base;
            let original = self.wait_for_inuse_clear()?;
            self.kio.port_write(base + SMBHSTSTS, 1, u32::from(original | SMBHSTSTS_INUSE_STS))?;
            let result = self.with_method(f);
            let _ = self.kio.port_write(base + SMBHSTSTS, 1, u32::from(original));
            result
        })
    }

    pub fn port(&self) -> u16 {
        self.controller.io_base
    }

    pub fn spd5(&self, slot: u8) -> Spd5HubHandle<'_, L> {
        Spd5HubHandle { engine: self, slot }
    }

    pub fn pmic(&self, dev_addr: u8) -> PmicHandle<'_, L> {
        PmicHandle { engine: self, dev_addr }
    }
}

/// Thin per-slot wrapper so callers don't re-thread method selection
/// through every SPD call. Every operation acquires the SMBus mutex for
/// its own duration, bounded by `mutex_wait`.
pub struct Spd5HubHandle<'a, L: LockBroker> {
    engine: &'a SmbusEngine<'a, L>,
    slot: u8,
}

impl<'a, L: LockBroker> Spd5HubHandle<'a, L> {
    pub fn read_byte(&self, mutex_wait: Duration, offset: u16) -> Result<u8> {
        self.engine
            .with_lock(mutex_wait, |m| Spd5Hub::new(m, self.engine.port(), self.slot).read_byte(offset))
    }

    pub fn read_word_reg(&self, mutex_wait: Duration, reg: u8) -> Result<u16> {
        self.engine
            .with_lock(mutex_wait, |m| Spd5Hub::new(m, self.engine.port(), self.slot).read_word_reg(reg))
    }

    pub fn dump(&self, mutex_wait: Duration) -> Result<(Vec<u8>, bool)> {
        self.engine
            .with_lock(mutex_wait, |m| Ok(Spd5Hub::new(m, self.engine.port(), self.slot).dump()))
    }

    pub fn vendor_id(&self, mutex_wait: Duration) -> Result<u16> {
        self.engine
            .with_lock(mutex_wait, |m| Spd5Hub::new(m, self.engine.port(), self.slot).vendor_id())
    }

    pub fn temperature_celsius(&self, mutex_wait: Duration) -> Result<f64> {
        self.engine
            .with_lock(mutex_wait, |m| Spd5Hub::new(m, self.engine.port(), self.slot).temperature_celsius())
    }
}

/// Richtek PMIC wrapper, mutex-scoped per operation like [`Spd5HubHandle`].
pub struct PmicHandle<'a, L: LockBroker> {
    engine: &'a SmbusEngine<'a, L>,
    dev_addr: u8,
}

impl<'a, L: LockBroker> PmicHandle<'a, L> {
    pub fn probe(&self, mutex_wait: Duration) -> Result<Identity> {
        self.engine
            .with_lock(mutex_wait, |m| RichtekPmic::new(m, self.engine.port(), self.dev_addr).probe())
    }

    pub fn read_channel(&self, mutex_wait: Duration, channel: Channel) -> Result<Option<f64>> {
        self.engine
            .with_lock(mutex_wait, |m| RichtekPmic::new(m, self.engine.port(), self.dev_addr).read_channel(channel))
    }
}
