//! Per-channel MC register map (spec §4.5 block 3): "the
//! `(register_offset, bit_range, field_name)` map is *different per
//! generation* ... maintain one decode table per family and never read a
//! field that is not in the active table" (design note §9: "model as one
//! core record per family behind a common trait/interface").

mod gen12;
mod gen15;

use imc_decode::{CommandRate, Gear};

use crate::cpu::CpuFamily;

/// Every timing/turnaround/ODT field of spec §3 "Info" sub-record, shared
/// across families: the *shape* is generation-independent even though the
/// register offsets that populate it are not. Fields this crate cannot
/// ground for a given family stay `None` (spec §3 invariant (c): "a field
/// that cannot be read yields an explicit absent marker").
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTimings {
    pub channel: u8,

    pub t_cl: u32,
    pub t_cwl: u32,
    pub t_rcd: u32,
    pub t_rcdw: Option<u32>,
    pub t_rp: u32,
    pub t_rpab_ext: u32,
    pub t_rdpre: u32,
    pub t_rtp: u32,
    pub t_ppd: u32,
    pub t_wrpre: u32,
    pub t_ras: u32,
    pub derating_ext: u32,

    pub t_refi: u32,
    pub t_rfc_raw: u32,
    /// `t_rfc` xor `t_rfc2` is populated per the FGR rule (spec §4.5: "if
    /// MR4.RefreshTrfcMode indicates Fine Granularity Refresh, the tRFC
    /// value is re-labelled as tRFC2 and tRFC is marked unknown"); resolved
    /// once MR4 is known, see [`crate::turnaround::apply_fgr_rule`].
    pub t_rfc: Option<u32>,
    pub t_rfc2: Option<u32>,
    pub t_refix9: u32,
    pub t_rfcpb: u32,
    pub t_rfm: u32,

    pub t_faw: u32,
    pub t_rrd_sg: u32,
    pub t_rrd_dg: u32,
    pub t_refsbrd: u32,

    pub t_cke: u32,
    pub t_xp: u32,
    pub t_xpdll: u32,
    pub t_rdpden: u32,
    pub t_wrpden: u32,
    pub t_csh: u32,
    pub t_csl: u32,
    pub t_prpden: u32,

    pub cmd_stretch: u8,
    pub n_to_1_ratio: u8,
    pub address_mirror: u8,
    pub gear2: bool,
    pub gear4: bool,

    pub t_rdrd_sg: u32,
    pub t_rdrd_dg: u32,
    pub t_rdrd_dr: u32,
    pub t_rdrd_dd: u32,
    pub t_rdwr_sg: u32,
    pub t_rdwr_dg: u32,
    pub t_rdwr_dr: u32,
    pub t_rdwr_dd: u32,
    pub t_wrrd_sg: u32,
    pub t_wrrd_dg: u32,
    pub t_wrrd_dr: u32,
    pub t_wrrd_dd: u32,
    pub t_wrwr_sg: u32,
    pub t_wrwr_dg: u32,
    pub t_wrwr_dr: u32,
    pub t_wrwr_dd: u32,

    pub t_xsdll: u32,
    pub t_zqoper: u32,
    pub t_mod: u32,

    pub dec_t_cwl: u32,
    pub add_t_cwl: u32,
    pub add_1qclk_delay: bool,

    pub t_xsr: u32,
    pub t_sr: u32,

    pub t_rtl: [u32; 4],

    pub banks: u32,

    pub mrs_storage: Vec<u8>,
}

impl ChannelTimings {
    pub fn gear(&self) -> Gear {
        Gear::from_12th_gen_bits(self.gear2, self.gear4)
    }

    pub fn command_rate(&self) -> Option<CommandRate> {
        CommandRate::from_cmd_stretch(self.cmd_stretch)
    }
}

/// One MC register block as read from hardware: `0x800` bytes starting at
/// `0xE000 + channel*0x800` (spec §4.5 block 3), plus the 240-byte MR
/// storage region at offset `0x200` within it.
pub trait RegisterMap: Send + Sync {
    fn decode(&self, channel: u8, block: &[u8]) -> ChannelTimings;
}

struct Gen12RegisterMap;
struct Gen15RegisterMap;

impl RegisterMap for Gen12RegisterMap {
    fn decode(&self, channel: u8, block: &[u8]) -> ChannelTimings {
        gen12::decode(channel, block)
    }
}

impl RegisterMap for Gen15RegisterMap {
    fn decode(&self, channel: u8, block: &[u8]) -> ChannelTimings {
        gen15::decode(channel, block)
    }
}

/// Selects the decode table for `family` (design note §9: selection behind
/// a trait/interface, never a record with per-generation `Option` fields
/// for the register layout itself).
pub fn for_family(family: CpuFamily) -> &'static dyn RegisterMap {
    match family {
        CpuFamily::TwelfthGen => &Gen12RegisterMap,
        CpuFamily::FifteenthGen => &Gen15RegisterMap,
    }
}

pub const MC_REGS_OFFSET: u64 = 0xE000;
pub const MC_REGS_SIZE: u64 = 0x800;
pub const MRS_STORAGE_OFFSET: usize = 0x200;
pub const MRS_STORAGE_LEN: usize = 240;
