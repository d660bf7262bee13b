//! The snapshot tree (spec §3): one immutable, freely-serialisable record
//! per refresh. Every field that this crate could not read is an explicit
//! `None`, never a silent zero (spec §3 invariant (c)).

use serde::Serialize;

use imc_decode::{CommandRate, DdrType, Gear};
use imc_platform::cpu::CpuIdentity;
use imc_platform::mrs::MrStorage;
use imc_platform::regmap::ChannelTimings;

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub time: String,
    pub tool_version: &'static str,
    pub cpu: Cpu,
    pub board: Option<Board>,
    pub cap: Option<Cap>,
    pub memory: Memory,
    pub vr_oc: Option<VrOc>,
    pub aborted: bool,
}

/// CPU identification (spec §3 "CPU"). Wraps [`CpuIdentity`] with the field
/// names the JSON schema uses.
#[derive(Debug, Clone, Serialize)]
pub struct Cpu {
    pub family: u8,
    pub model_id: u8,
    pub stepping: u8,
    pub vendor: String,
    pub marketing_name: Option<String>,
}

impl From<CpuIdentity> for Cpu {
    fn from(id: CpuIdentity) -> Self {
        Self { family: id.family, model_id: id.model_id, stepping: id.stepping, vendor: id.vendor, marketing_name: id.marketing_name }
    }
}

/// Opaque to the core (spec §3: "acquired from an OS query performed by an
/// external collaborator"); `refresh()` never populates this itself.
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub manufacturer: String,
    pub product: String,
}

/// A flat capability record (spec §3: "~60 booleans, small enums and
/// numeric limits"); this crate exposes the subset [`imc_platform::cap`]
/// decodes plus the four raw DWORDs so collaborators aren't blocked on
/// fields this crate doesn't yet name.
#[derive(Debug, Clone, Serialize)]
pub struct Cap {
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

impl From<imc_platform::cap::Capabilities> for Cap {
    fn from(c: imc_platform::cap::Capabilities) -> Self {
        Self {
            raw: c.raw,
            ddr5_supported: c.ddr5_supported,
            ddr4_supported: c.ddr4_supported,
            lpddr5_supported: c.lpddr5_supported,
            lpddr4_supported: c.lpddr4_supported,
            ddr_oc_allowed: c.ddr_oc_allowed,
            overclock_disabled: c.overclock_disabled,
            ecc_supported: c.ecc_supported,
            vtd_supported: c.vtd_supported,
            igpu_supported: c.igpu_supported,
            smt_supported: c.smt_supported,
            max_channels: c.max_channels,
            max_dimms_per_channel: c.max_dimms_per_channel,
            max_ddr4_mts: c.max_ddr4_mts,
            max_ddr5_mts: c.max_ddr5_mts,
            max_lpddr4_mts: c.max_lpddr4_mts,
            max_lpddr5_mts: c.max_lpddr5_mts,
            max_vddq_tx_mv: c.max_vddq_tx_mv,
            bclk_oc_range_mhz: c.bclk_oc_range_mhz,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    pub mc: Vec<McRecord>,
    pub dimm: Vec<Dimm>,
    pub power: Option<Power>,
    pub sa: Option<SystemAgent>,
    pub bios_request: Option<BiosRequest>,
    pub bios_data: Option<BiosData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McRecord {
    pub controller: u8,
    pub ddr_type: Option<DdrType>,
    pub channel_l_map: u8,
    pub channel_s_size: u8,
    pub half_cacheline_mode: bool,
    pub channels: Vec<ChannelRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelRecord {
    pub channel: u8,
    pub population: DimmPopulation,
    pub ecc: u8,
    pub crc: bool,
    pub info: Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimmPopulation {
    pub dimm_l_size_512mb: u8,
    pub dimm_s_size_512mb: u8,
    pub width_l: Option<u32>,
    pub width_s: Option<u32>,
    pub ranks_l: Option<u32>,
    pub ranks_s: Option<u32>,
    pub ddr5_ds_8gb: bool,
    pub ddr5_dl_8gb: bool,
}

/// Every timing/turnaround/ODT field of one channel (spec §3 "Info"
/// sub-record). Most fields come straight from [`ChannelTimings`]; the
/// derived ones (`tWTR_L/S`, `tRTP`, `tWR`) are computed once `ddr_type` and
/// gear/command-rate are known.
#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub t_cl: u32,
    pub t_cwl: u32,
    pub t_rcd: u32,
    pub t_rcdw: Option<u32>,
    pub t_rp: u32,
    pub t_ras: u32,
    pub t_rtp: u32,
    pub t_wr: Option<u32>,
    pub t_faw: u32,
    pub t_rrd_l: u32,
    pub t_rrd_s: u32,
    pub t_wtr_l: i64,
    pub t_wtr_s: i64,
    pub t_cke: u32,
    pub t_xp: u32,
    pub t_xpdll: u32,
    pub t_rdpre: u32,
    pub t_rdpden: u32,
    pub t_wrpre: u32,
    pub t_wrpden: u32,
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
    pub t_rfc: Option<u32>,
    pub t_rfc2: Option<u32>,
    pub t_rfcpb: u32,
    pub t_refi: u32,
    pub t_refix9: u32,
    pub t_xsr: u32,
    pub t_sr: u32,
    pub rtl: [u32; 4],
    pub gear: Gear,
    pub command_rate: Option<CommandRate>,
    pub banks: u32,
    pub mrs: Option<Mrs>,
}

impl Info {
    pub fn from_timings(t: &ChannelTimings, ddr_type: DdrType) -> Self {
        let turn = crate::derive::write_to_read(t, ddr_type);
        let t_wr = crate::derive::write_recovery(t, ddr_type);
        Self {
            t_cl: t.t_cl,
            t_cwl: t.t_cwl,
            t_rcd: t.t_rcd,
            t_rcdw: t.t_rcdw,
            t_rp: t.t_rp,
            t_ras: t.t_ras,
            t_rtp: crate::derive::read_to_precharge(t),
            t_wr,
            t_faw: t.t_faw,
            t_rrd_l: t.t_rrd_sg,
            t_rrd_s: t.t_rrd_dg,
            t_wtr_l: turn.jedec_long,
            t_wtr_s: turn.jedec_short,
            t_cke: t.t_cke,
            t_xp: t.t_xp,
            t_xpdll: t.t_xpdll,
            t_rdpre: t.t_rdpre,
            t_rdpden: t.t_rdpden,
            t_wrpre: t.t_wrpre,
            t_wrpden: t.t_wrpden,
            t_rdrd_sg: t.t_rdrd_sg,
            t_rdrd_dg: t.t_rdrd_dg,
            t_rdrd_dr: t.t_rdrd_dr,
            t_rdrd_dd: t.t_rdrd_dd,
            t_rdwr_sg: t.t_rdwr_sg,
            t_rdwr_dg: t.t_rdwr_dg,
            t_rdwr_dr: t.t_rdwr_dr,
            t_rdwr_dd: t.t_rdwr_dd,
            t_wrrd_sg: t.t_wrrd_sg,
            t_wrrd_dg: t.t_wrrd_dg,
            t_wrrd_dr: t.t_wrrd_dr,
            t_wrrd_dd: t.t_wrrd_dd,
            t_wrwr_sg: t.t_wrwr_sg,
            t_wrwr_dg: t.t_wrwr_dg,
            t_wrwr_dr: t.t_wrwr_dr,
            t_wrwr_dd: t.t_wrwr_dd,
            t_rfc: t.t_rfc,
            t_rfc2: t.t_rfc2,
            t_rfcpb: t.t_rfcpb,
            t_refi: t.t_refi,
            t_refix9: t.t_refix9,
            t_xsr: t.t_xsr,
            t_sr: t.t_sr,
            rtl: t.t_rtl,
            gear: t.gear(),
            command_rate: t.command_rate(),
            banks: t.banks,
            mrs: None,
        }
    }
}

/// The decoded MR storage blob (spec §3 "Memory.MC[i].Channel[j].Info.MRS":
/// MR13, MR4/5/6/8, Vref Dq/Ca/Cs, per-rank Rtt tables and per-group (A/B)
/// Rtt CK/CS/CA).
#[derive(Debug, Clone, Serialize)]
pub struct Mrs {
    pub mrs_size: usize,
    pub mr37_offset: Option<usize>,
    pub ambiguous_candidates: Vec<usize>,
    pub raw_hex: String,
    pub rtt_gen15: Option<imc_platform::mrs::RttFields>,
    pub rtt_gen12: Option<imc_platform::mrs::RttRankTemplate>,
    pub sequential: Option<imc_platform::mrs::SequentialMrs>,
    pub group_a: imc_platform::mrs::GroupRtt,
    pub group_b: imc_platform::mrs::GroupRtt,
    pub mr13: Option<imc_decode::Mr13Entry>,
}

impl From<MrStorage> for Mrs {
    fn from(m: MrStorage) -> Self {
        Self {
            mrs_size: m.mrs_size,
            mr37_offset: m.mr37_offset,
            ambiguous_candidates: m.ambiguous_candidates,
            raw_hex: m.raw.iter().map(|b| format!("{b:02x}")).collect(),
            rtt_gen15: m.rtt_gen15,
            rtt_gen12: m.rtt_gen12,
            sequential: m.sequential,
            group_a: m.group_a,
            group_b: m.group_b,
            mr13: m.mr13,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dimm {
    pub controller: u8,
    pub channel: u8,
    pub slot: u8,
    pub spd_vendorid: u16,
    pub spd_eeprom_hex: String,
    pub spd: Option<SpdInfo>,
    pub temperature_celsius: Option<f64>,
    pub pmic: Option<PmicInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpdInfo {
    pub revision: String,
    pub ram_type: Option<DdrType>,
    pub module_type_raw: u8,
    pub ranks: u8,
    pub rank_mix_asymmetrical: bool,
    pub part_number: String,
    pub serial_number: String,
    pub module_revision: u8,
    pub die_vendorid: u16,
    pub die_stepping: u8,
    pub is_page_protected: bool,
    /// Up to three on-module PMIC descriptor slots (SPEC_FULL §C.4), not to
    /// be confused with [`PmicInfo`] below, which is the *powered* PMIC this
    /// tool actually probed over SMBus.
    pub pmic_descriptors: Vec<imc_decode::PmicDescriptor>,
}

impl From<imc_decode::SpdDecode> for SpdInfo {
    fn from(s: imc_decode::SpdDecode) -> Self {
        Self {
            revision: s.revision,
            ram_type: s.ram_type.name,
            module_type_raw: s.module_type_raw,
            ranks: s.ranks,
            rank_mix_asymmetrical: s.rank_mix_asymmetrical,
            part_number: s.part_number,
            serial_number: s.serial_number,
            module_revision: s.module_revision,
            die_vendorid: s.die_vendorid,
            die_stepping: s.die_stepping,
            is_page_protected: false,
            pmic_descriptors: s.pmic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PmicInfo {
    pub vendor_id: u16,
    pub revision: u8,
    pub swa_volts: Option<f64>,
    pub swb_volts: Option<f64>,
    pub swc_volts: Option<f64>,
    pub swd_volts: Option<f64>,
    pub v18_volts: Option<f64>,
    pub v10_volts: Option<f64>,
    pub vin_volts: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Power {
    pub pkg_rapl_units: Option<f64>,
    pub ddr_rapl_pl1_watts: Option<f64>,
    pub ddr_rapl_pl1_enabled: bool,
    pub ddr_rapl_pl1_window_us: Option<u32>,
    pub ddr_rapl_pl2_watts: Option<f64>,
    pub ddr_rapl_pl2_enabled: bool,
    pub ddr_rapl_pl2_window_us: Option<u32>,
    pub pkg_energy_joules: Option<f64>,
    pub pp0_temperature_celsius: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemAgent {
    pub qclk_reference_mhz: Option<f64>,
    pub qclk_ratio: Option<u32>,
    pub qclk_freq_mhz: Option<f64>,
    pub uclk_ratio: Option<u32>,
    pub uclk_freq_mhz: Option<f64>,
    pub psf0_ratio: Option<u32>,
    pub sa_voltage: Option<f64>,
    pub ipu_ratio: Option<u32>,
    pub opi_speed_mhz: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiosRequest {
    pub mc_pll_ratio: Option<u32>,
    pub mc_pll_ref: Option<u32>,
    pub gear: Option<Gear>,
    pub vddq_tx_volts: Option<f64>,
    pub icc_max_amps: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiosData {
    pub mc_pll_ratio: Option<u32>,
    pub mc_pll_ref: Option<u32>,
    pub gear: Option<Gear>,
    pub vddq_tx_volts: Option<f64>,
    pub icc_max_amps: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VrOc {
    pub svid_ia_addr: Option<u8>,
    pub svid_gt_addr: Option<u8>,
    pub svid_sa_addr: Option<u8>,
    pub protocol_flags: Option<u32>,
    pub icc_max_amps: Option<f64>,
    pub vcc_in_aux_icc_max_amps: Option<f64>,
    pub ac_loadline: Option<f64>,
    pub dc_loadline: Option<f64>,
    pub vf_points: Vec<VfPoint>,
}

/// One voltage/frequency curve point (spec §3: "up to 15 V/F curve points
/// per domain").
#[derive(Debug, Clone, Serialize)]
pub struct VfPoint {
    pub domain: VfDomain,
    pub index: u8,
    pub frequency_mhz: f64,
    pub voltage: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum VfDomain {
    IaCore,
    Ring,
    SystemAgent,
    Reserved,
}
