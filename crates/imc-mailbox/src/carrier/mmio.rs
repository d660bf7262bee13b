//! PCODE/MRC mailbox carrier: two MCHBAR MMIO dwords reached via the
//! config-space BAR the driver resolves per call (spec §4.6, grounded on
//! `original_source/memory.py`'s `MCHBAR_BASE = pci_cfg_read(0, 0, 0, 0x48,
//! '4')`, bit 0 masked off as the BAR "enable" flag).

use std::time::{Duration, Instant};

use imc_kio::KernelIo;

use crate::commands::mchbar::{MAILBOX_DATA, MAILBOX_INTERFACE};
use crate::error::{Error, Result};
use crate::word::run_busy;

const HOST_BRIDGE_BUS: u8 = 0;
const HOST_BRIDGE_DEV: u8 = 0;
const HOST_BRIDGE_FUN: u8 = 0;
const MCHBAR_CFG_OFFSET: u16 = 0x48;
/// Clears the BAR "enable" bit (bit 0); MCHBAR is always 32-byte aligned in
/// practice, but the driver only needs bit 0 masked off to recover the base.
const MCHBAR_ADDR_MASK: u64 = 0xFFFF_FFFE;

/// Runs one PCODE/MRC mailbox transaction: write `data`, write `command`
/// with `RunBusy=1`, poll until clear, then return the combined 8-byte read
/// at the data offset — low 32 bits are the response, high 32 bits are the
/// post-completion interface word the spec calls "status" (§4.6: "status is
/// the upper 32 bits of the 64-bit read").
pub fn transact(
    kio: &dyn KernelIo,
    command_word: u32,
    data: u32,
    timeout: Duration,
) -> Result<(u32, u32)> {
    kio.phymem_pc_write32(
        HOST_BRIDGE_BUS,
        HOST_BRIDGE_DEV,
        HOST_BRIDGE_FUN,
        MCHBAR_CFG_OFFSET,
        MCHBAR_ADDR_MASK,
        u64::from(MAILBOX_DATA),
        data,
    )?;
    kio.phymem_pc_write32(
        HOST_BRIDGE_BUS,
        HOST_BRIDGE_DEV,
        HOST_BRIDGE_FUN,
        MCHBAR_CFG_OFFSET,
        MCHBAR_ADDR_MASK,
        u64::from(MAILBOX_INTERFACE),
        command_word,
    )?;

    let deadline = Instant::now() + timeout;
    loop {
        let combined = kio.phymem_pc_read64(
            HOST_BRIDGE_BUS,
            HOST_BRIDGE_DEV,
            HOST_BRIDGE_FUN,
            MCHBAR_CFG_OFFSET,
            MCHBAR_ADDR_MASK,
            u64::from(MAILBOX_DATA),
        )?;
        let status_word = (combined >> 32) as u32;
        if !run_busy(status_word) {
            let response = combined as u32;
            return Ok((response, status_word));
        }
        if Instant::now() >= deadline {
            tracing::debug!(command_word = %format!("{command_word:#x}"), "mmio mailbox RunBusy did not clear");
            return Err(Error::Timeout);
        }
        std::thread::yield_now();
    }
}
