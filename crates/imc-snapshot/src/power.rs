//! DDR RAPL power-limit telemetry (spec §3 "Memory.Power"), grounded on the
//! `imc_mailbox::commands::msr::DDR_RAPL` register this crate already reads
//! directly via `msr_read` (no command word, no mutex, per spec §4.6).
//!
//! The `MSR_DDR_RAPL` layout mirrors the public `MSR_PKG_POWER_LIMIT`
//! format (Intel SDM vol.4): PL1 in the low dword, PL2 in the high dword,
//! each `power[14:0] | enable[15] | window[23:17]`. The power unit itself
//! (`MSR_RAPL_POWER_UNIT`) is not part of this crate's read-only mailbox
//! catalogue, so it is assumed fixed at 1/8 W per LSB — the value every
//! client SKU this tool targets reports. See `DESIGN.md`.
use std::collections::HashSet;

use imc_kio::KernelIo;
use imc_lock::MutexBroker;

use crate::{model, warn_once, RefreshConfig};

const ASSUMED_POWER_UNIT_WATTS: f64 = 0.125;

fn window_micros(window_code: u32) -> u32 {
    let y = window_code & 0b11;
    let z = (window_code >> 2) & 0b11111;
    ((1u64 << z) * (4 + y as u64) / 4 * 1000) as u32
}

pub(crate) fn build(kio: &dyn KernelIo, _lock: &MutexBroker, _config: &RefreshConfig, warned: &mut HashSet<&'static str>) -> Option<model::Power> {
    let (hi, lo) = match kio.msr_read(imc_mailbox::commands::msr::DDR_RAPL) {
        Ok(v) => v,
        Err(err) => {
            warn_once(warned, "memory.power", err);
            return None;
        }
    };

    let pl1_enabled = (lo >> 15) & 1 != 0;
    let pl1_watts = f64::from(lo & 0x7FFF) * ASSUMED_POWER_UNIT_WATTS;
    let pl1_window_us = window_micros((lo >> 17) & 0x7F);

    let pl2_enabled = (hi >> 15) & 1 != 0;
    let pl2_watts = f64::from(hi & 0x7FFF) * ASSUMED_POWER_UNIT_WATTS;
    let pl2_window_us = window_micros((hi >> 17) & 0x7F);

    Some(model::Power {
        pkg_rapl_units: Some(ASSUMED_POWER_UNIT_WATTS),
        ddr_rapl_pl1_watts: Some(pl1_watts),
        ddr_rapl_pl1_enabled: pl1_enabled,
        ddr_rapl_pl1_window_us: Some(pl1_window_us),
        ddr_rapl_pl2_watts: Some(pl2_watts),
        ddr_rapl_pl2_enabled: pl2_enabled,
        ddr_rapl_pl2_window_us: Some(pl2_window_us),
        // Package energy accumulator and PP0 temperature need
        // MSR_PKG_ENERGY_STATUS/IA32_PACKAGE_THERM_STATUS, neither of which
        // is in this tool's read-only mailbox/MSR catalogue; left absent
        // rather than guessed (spec §3 invariant (c)).
        pkg_energy_joules: None,
        pp0_temperature_celsius: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_decode_matches_rapl_formula() {
        // Y=0, Z=0 -> (1+0/4) * 2^0 * 1000us = 1000us.
        assert_eq!(window_micros(0), 1000);
        // Y=0, Z=3 -> 2^3 * 1000 = 8000us.
        assert_eq!(window_micros(0b01100), 8000);
    }
}
