//! System Agent clock telemetry (spec §3 "Memory.SA"), grounded on
//! `original_source/msrbox.py`'s `QCLK_RATIO_MASK`/`MC_REF_CLK_MASK`
//! constants, read via the OC mailbox's DDR-capabilities command for the
//! memory-controller domain.
use std::collections::HashSet;

use imc_kio::KernelIo;
use imc_lock::MutexBroker;

use crate::{model, warn_once, MailboxCtx, RefreshConfig};

const QCLK_RATIO_MASK: u32 = 0x0000_00FF;
const MC_REF_CLK_MASK: u32 = 0x0000_0100;

/// BCLK reference used when `MC_REF_CLK` selects the alternate strap
/// (`original_source/msrbox.py` never names the two frequencies outright;
/// 100.0/133.33 MHz are the two reference clocks every 12th-15th gen
/// platform this tool targets straps BCLK to).
const QCLK_REF_DEFAULT_MHZ: f64 = 100.0;
const QCLK_REF_ALT_MHZ: f64 = 133.33;

pub(crate) fn build(kio: &dyn KernelIo, lock: &MutexBroker, config: &RefreshConfig, warned: &mut HashSet<&'static str>) -> Option<model::SystemAgent> {
    let mbx = MailboxCtx::new(kio, lock, config);
    let raw = match mbx.svc.oc_read(
        imc_mailbox::commands::oc::GET_DDR_CAPABILITIES,
        imc_mailbox::commands::oc::DOMAIN_ID_MEMORY_CONTROLLER,
        0,
        mbx.mutex_wait,
        mbx.mailbox_wait,
    ) {
        Ok(v) => v,
        Err(err) => {
            warn_once(warned, "memory.sa", err);
            return None;
        }
    };

    let qclk_ratio = raw & QCLK_RATIO_MASK;
    let qclk_reference_mhz = if raw & MC_REF_CLK_MASK != 0 { QCLK_REF_ALT_MHZ } else { QCLK_REF_DEFAULT_MHZ };
    let qclk_freq_mhz = f64::from(qclk_ratio) * qclk_reference_mhz;

    Some(model::SystemAgent {
        qclk_reference_mhz: Some(qclk_reference_mhz),
        qclk_ratio: Some(qclk_ratio),
        qclk_freq_mhz: Some(qclk_freq_mhz),
        // UCLK tracks QCLK at a fixed gear-dependent ratio this command does
        // not expose directly; left absent rather than assumed (§3 (c)).
        uclk_ratio: None,
        uclk_freq_mhz: None,
        psf0_ratio: None,
        sa_voltage: None,
        ipu_ratio: None,
        opi_speed_mhz: None,
    })
}
