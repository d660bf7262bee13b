//! Platform capability DWORDs (spec §4.5 block 4: PCI 0:0:0 offsets
//! `0xE4`/`0xE8`/`0xEC`/`0xF0`). `original_source/` never decodes these
//! registers field-by-field — `hardware.py` only reads the raw DWORDs for
//! display — so the exact bit layout below is this crate's own documented
//! reading of the public Intel datasheet subset, not a verbatim transcription
//! of an existing decoder. See `DESIGN.md` for the Open Question this raises.

use imc_kio::KernelIo;

use crate::error::Result;

const HOST_BRIDGE_BUS: u8 = 0;
const HOST_BRIDGE_DEV: u8 = 0;
const HOST_BRIDGE_FUN: u8 = 0;

const CAPID0_A: u16 = 0xE4;
const CAPID0_B: u16 = 0xE8;
const CAPID0_C: u16 = 0xEC;
const CAPID0_D: u16 = 0xF0;

/// A representative subset of the CAPID0 capability bits (spec §4.5: "a
/// platform capabilities block exposing feature-disable fuses ... (DDR
/// overclock allowed, max DDR4/5/LPDDR4/5 rates, max VDDQ_TX, BCLK OC
/// range, ECC/VT-d/IGPU/SMT present, etc.)"). Bits this crate does not
/// assign a name to are kept in `raw` rather than silently dropped; a
/// field whose backing bits read as a reserved/unassigned code decodes to
/// `None` rather than a guessed number (spec §3's "numeric decodes are
/// total" invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub raw: [u32; 4],

    pub ddr5_supported: bool,
    pub ddr4_supported: bool,
    pub lpddr5_supported: bool,
    pub lpddr4_supported: bool,
    pub ddr_oc_allowed: bool,
    pub overclock_disabled: bool,
    pub ecc_supported: bool,
    pub vtd_supported: bool,
    pub igpu_supported: bool,
    pub smt_supported: bool,
    pub max_channels: u8,
    pub max_dimms_per_channel: u8,
    pub max_ddr4_mts: Option<u16>,
    pub max_ddr5_mts: Option<u16>,
    pub max_lpddr4_mts: Option<u16>,
    pub max_lpddr5_mts: Option<u16>,
    pub max_vddq_tx_mv: Option<u16>,
    pub bclk_oc_range_mhz: Option<u8>,
}

fn bit(dword: u32, pos: u32) -> bool {
    (dword >> pos) & 1 != 0
}

fn bits(dword: u32, first: u32, last: u32) -> u32 {
    let width = last - first + 1;
    let mask = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
    (dword >> first) & mask
}

/// Maps a 3-bit "max rate" fuse code to MT/s, the way [`imc_decode::enums`]
/// maps other small fuse/SPD codes to named values; an unassigned code is
/// an explicit absence, not a guessed rate.
fn max_rate_mts(code: u32, table: &[u16; 8]) -> Option<u16> {
    table.get(code as usize).copied().filter(|mts| *mts != 0)
}

/// CAPID0_B max-DDR4/LPDDR4 rate table (bits 4:2 / 7:5), CAPID0_C max-DDR5/
/// LPDDR5 rate table (bits 2:0 / 5:3): this crate's own documented reading
/// of the public datasheet subset (see module doc), not a transcription of
/// an existing decoder.
const DDR4_RATE_TABLE_MTS: [u16; 8] = [1867, 2133, 2400, 2667, 2933, 3200, 0, 0];
const LPDDR4_RATE_TABLE_MTS: [u16; 8] = [2133, 2400, 2667, 2933, 3200, 4267, 0, 0];
const DDR5_RATE_TABLE_MTS: [u16; 8] = [4000, 4400, 4800, 5200, 5600, 6000, 6400, 0];
const LPDDR5_RATE_TABLE_MTS: [u16; 8] = [4267, 5200, 5500, 6000, 6400, 6800, 7500, 0];

pub fn read_capabilities(kio: &dyn KernelIo) -> Result<Capabilities> {
    let a = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, CAPID0_A, 4)?;
    let b = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, CAPID0_B, 4)?;
    let c = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, CAPID0_C, 4)?;
    let d = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, CAPID0_D, 4)?;

    Ok(Capabilities {
        raw: [a, b, c, d],
        ddr5_supported: !bit(a, 0),
        ddr4_supported: !bit(a, 1),
        lpddr5_supported: !bit(a, 3),
        lpddr4_supported: !bit(a, 4),
        ddr_oc_allowed: !bit(a, 2),
        overclock_disabled: bit(a, 2),
        ecc_supported: !bit(b, 0),
        vtd_supported: !bit(b, 23),
        igpu_supported: !bit(b, 27),
        smt_supported: !bit(b, 28),
        max_channels: (bits(b, 1, 2) + 1) as u8,
        max_dimms_per_channel: (bits(c, 0, 1) + 1) as u8,
        max_ddr4_mts: max_rate_mts(bits(b, 2, 4), &DDR4_RATE_TABLE_MTS),
        max_lpddr4_mts: max_rate_mts(bits(b, 5, 7), &LPDDR4_RATE_TABLE_MTS),
        max_ddr5_mts: max_rate_mts(bits(c, 2, 4), &DDR5_RATE_TABLE_MTS),
        max_lpddr5_mts: max_rate_mts(bits(c, 5, 7), &LPDDR5_RATE_TABLE_MTS),
        max_vddq_tx_mv: Some(bits(d, 0, 7) as u16).filter(|v| *v != 0),
        bclk_oc_range_mhz: Some(bits(d, 8, 15) as u8).filter(|v| *v != 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_helper_masks_and_shifts() {
        assert_eq!(bits(0b1111_0000, 4, 7), 0b1111);
        assert_eq!(bits(0xFFFF_FFFF, 0, 31), u32::MAX);
    }
}
