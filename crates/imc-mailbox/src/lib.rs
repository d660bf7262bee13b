//! Mailbox service (component X, spec §4.6).
//!
//! Two co-located protocols share one command/data shape: the PCODE/MRC
//! "BIOS mailbox" (MCHBAR MMIO, 13-bit Param2) and the OC/SVID mailbox (MSR
//! space, 8-bit Param2). Both poll a `RunBusy` bit under a deadline; neither
//! is reachable without first holding the matching named mutex from
//! `imc-lock` (spec §5's fixed lock order, SMBus → BIOS mailbox → OC
//! mailbox, is enforced by callers composing this crate with `imc-lock`,
//! not by this crate itself).

mod carrier;
pub mod commands;
mod error;
mod word;

pub use error::{Error, Result};
pub use word::{bios_command_word, oc_command_word, run_busy};

use std::time::Duration;

use imc_kio::KernelIo;
use imc_lock::{LockBroker, Resource};

/// Thin façade over the two carriers, scoped to one `KernelIo` and one
/// `LockBroker` (design note §9: owned resources passed explicitly, no
/// process-wide statics).
pub struct MailboxService<'a, L: LockBroker> {
    kio: &'a dyn KernelIo,
    lock: &'a L,
}

impl<'a, L: LockBroker> MailboxService<'a, L> {
    pub fn new(kio: &'a dyn KernelIo, lock: &'a L) -> Self {
        Self { kio, lock }
    }

    /// PCODE/MRC "BIOS mailbox" read, MMIO carrier. Returns `(response,
    /// status)`; a non-zero `status` is reported verbatim to the caller
    /// rather than folded into `Err` (spec §4.6: "Zero status = success;
    /// non-zero status is reported verbatim to the caller and the command
    /// returns absent" — the "absent" mapping is the caller's job, since
    /// only it knows which field this was for).
    pub fn bios_mmio_read(
        &self,
        command: u8,
        param1: u8,
        param2: u16,
        mutex_wait: Duration,
        mailbox_wait: Duration,
    ) -> Result<(u32, u32)> {
        let word = word::bios_command_word(command, param1, param2, true);
        let kio = self.kio;
        self.lock
            .with_lock(Resource::BiosMailbox, mutex_wait, || carrier::mmio::transact(kio, word, 0, mailbox_wait))
    }

    /// PCODE-over-MSR variant of the BIOS mailbox (same command class, used
    /// on platforms that expose it only through MSR 0x607/0x608).
    pub fn bios_msr_read(
        &self,
        command: u8,
        param1: u8,
        param2: u16,
        mutex_wait: Duration,
        mailbox_wait: Duration,
    ) -> Result<u32> {
        let word = word::bios_command_word(command, param1, param2, true);
        let kio = self.kio;
        self.lock
            .with_lock(Resource::BiosMailbox, mutex_wait, || carrier::msr::pcode_transact(kio, word, 0, mailbox_wait))
    }

    /// OC/SVID mailbox read, single-MSR carrier.
    pub fn oc_read(
        &self,
        command: u8,
        param1: u8,
        param2: u8,
        mutex_wait: Duration,
        mailbox_wait: Duration,
    ) -> Result<u32> {
        let word = word::oc_command_word(command, param1, param2, true);
        let kio = self.kio;
        self.lock
            .with_lock(Resource::OcMailbox, mutex_wait, || carrier::msr::oc_transact(kio, word, 0, mailbox_wait))
    }

    /// Plain MSR reads the spec groups with the mailbox section because
    /// they report the same VR/power telemetry (PL4/current config, DDR
    /// RAPL, platform info, IA32 perf status) — no command word, no mutex,
    /// just `msr_read`.
    pub fn read_msr(&self, reg: u32) -> Result<(u32, u32)> {
        self.kio.msr_read(reg).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Minimal fake satisfying `KernelIo` for the OC/BIOS mailbox paths
    /// only; every other method is unreachable in these tests.
    struct FakeKio {
        msrs: StdMutex<std::collections::HashMap<u32, (u32, u32)>>,
        clear_after_polls: u32,
        polls: StdMutex<u32>,
    }

    impl FakeKio {
        fn new(clear_after_polls: u32) -> Self {
            Self {
                msrs: StdMutex::new(std::collections::HashMap::new()),
                clear_after_polls,
                polls: StdMutex::new(0),
            }
        }
    }

    impl KernelIo for FakeKio {
        fn port_read(&self, _: u16, _: u8) -> imc_kio::Result<u32> { unimplemented!() }
        fn port_write(&self, _: u16, _: u8, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn pci_cfg_read(&self, _: u8, _: u8, _: u8, _: u16, _: u8) -> imc_kio::Result<u32> { unimplemented!() }
        fn pci_cfg_write(&self, _: u8, _: u8, _: u8, _: u16, _: u8, _: u32) -> imc_kio::Result<()> { unimplemented!() }

        fn msr_read(&self, reg: u32) -> imc_kio::Result<(u32, u32)> {
            let mut polls = self.polls.lock().unwrap();
            *polls += 1;
            let msrs = self.msrs.lock().unwrap();
            let (hi, lo) = *msrs.get(&reg).unwrap_or(&(0, 0));
            if *polls > self.clear_after_polls {
                Ok((hi & 0x7FFF_FFFF, lo))
            } else {
                Ok((hi, lo))
            }
        }

        fn msr_write(&self, reg: u32, hi: u32, lo: u32) -> imc_kio::Result<()> {
            self.msrs.lock().unwrap().insert(reg, (hi, lo));
            Ok(())
        }

        fn phymem_read(&self, _: u64, _: u32) -> imc_kio::Result<Vec<u8>> { unimplemented!() }
        fn phymem_pc_read64(&self, _: u8, _: u8, _: u8, _: u16, _: u64, _: u64) -> imc_kio::Result<u64> { unimplemented!() }
        fn phymem_pc_write32(&self, _: u8, _: u8, _: u8, _: u16, _: u64, _: u64, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn phymem_map(&self, _: u64, _: u32) -> imc_kio::Result<u64> { unimplemented!() }
        fn phymem_unmap(&self, _: u64, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn smbus_read_byte(&self, _: u16, _: u8, _: u8) -> imc_kio::Result<u8> { unimplemented!() }
        fn smbus_write_byte(&self, _: u16, _: u8, _: u8, _: u8) -> imc_kio::Result<()> { unimplemented!() }
        fn smbus_proc_call(&self, _: u16, _: u8, _: u8, _: u16) -> imc_kio::Result<u16> { unimplemented!() }
    }

    struct NoopBroker;
    impl LockBroker for NoopBroker {
        fn with_lock<T, E: From<imc_lock::Error>>(
            &self,
            _which: Resource,
            _wait: Duration,
            f: impl FnOnce() -> std::result::Result<T, E>,
        ) -> std::result::Result<T, E> {
            f()
        }
    }

    #[test]
    fn oc_read_succeeds_once_run_busy_clears() {
        let kio = FakeKio::new(2);
        let lock = NoopBroker;
        let svc = MailboxService::new(&kio, &lock);
        let value = svc
            .oc_read(commands::oc::GET_ICCMAX, commands::oc::DOMAIN_ID_IA_CORE, 0, Duration::from_millis(10), Duration::from_millis(50))
            .expect("oc read should succeed once busy clears");
        assert_eq!(value, 0);
    }

    #[test]
    fn oc_read_times_out_if_run_busy_never_clears() {
        let kio = FakeKio::new(u32::MAX);
        let lock = NoopBroker;
        let svc = MailboxService::new(&kio, &lock);
        let err = svc
            .oc_read(commands::oc::GET_ICCMAX, 0, 0, Duration::from_millis(1), Duration::from_millis(5))
            .unwrap_err();
        assert_eq!(err, Error::Timeout);
    }
}
