//! VR/PCODE mailbox carriers addressed through MSRs instead of MCHBAR MMIO
//! (spec §4.6: "MSR mailbox. Data at MSR 0x608, interface at MSR 0x607
//! (PCODE over MSR); OC mailbox shares one MSR (0x150) carrying
//! `{data[31:0], cmd[63:32]}`. Same poll discipline.").
//!
//! Unlike the MMIO carrier there is no separate status word: a combined
//! 64-bit read at one address does not exist for these registers, so
//! success here is "RunBusy cleared before the deadline" and nothing more.
//! This MSR-mailbox has-no-status decision is recorded as an explicit open
//! question in the design ledger.

use std::time::{Duration, Instant};

use imc_kio::KernelIo;

use crate::commands::msr::{OC_MAILBOX, PCODE_MAILBOX_DATA, PCODE_MAILBOX_INTERFACE};
use crate::error::{Error, Result};
use crate::word::run_busy;

/// PCODE-over-MSR: interface and data live in separate 64-bit MSRs, command
/// word packed into the low 32 bits of the interface MSR.
pub fn pcode_transact(kio: &dyn KernelIo, command_word: u32, data: u32, timeout: Duration) -> Result<u32> {
    kio.msr_write(PCODE_MAILBOX_DATA, 0, data)?;
    kio.msr_write(PCODE_MAILBOX_INTERFACE, 0, command_word)?;

    let deadline = Instant::now() + timeout;
    loop {
        let (_, interface_lo) = kio.msr_read(PCODE_MAILBOX_INTERFACE)?;
        if !run_busy(interface_lo) {
            let (_, response) = kio.msr_read(PCODE_MAILBOX_DATA)?;
            return Ok(response);
        }
        if Instant::now() >= deadline {
            tracing::debug!(command_word = %format!("{command_word:#x}"), "pcode msr mailbox RunBusy did not clear");
            return Err(Error::Timeout);
        }
        std::thread::yield_now();
    }
}

/// OC mailbox: one 64-bit MSR, command word in the high half, data in the
/// low half.
pub fn oc_transact(kio: &dyn KernelIo, command_word: u32, data: u32, timeout: Duration) -> Result<u32> {
    kio.msr_write(OC_MAILBOX, command_word, data)?;

    let deadline = Instant::now() + timeout;
    loop {
        let (hi, lo) = kio.msr_read(OC_MAILBOX)?;
        if !run_busy(hi) {
            return Ok(lo);
        }
        if Instant::now() >= deadline {
            tracing::debug!(command_word = %format!("{command_word:#x}"), "oc msr mailbox RunBusy did not clear");
            return Err(Error::Timeout);
        }
        std::thread::yield_now();
    }
}
