//! 12th-gen-family MC register map, grounded verbatim on
//! `original_source/memory.py`'s `get_mchbar_info` (`ADL_FAM` branch), which
//! the original tool uses for Alder Lake through Meteor Lake alike.

use imc_decode::get_bits;

use super::{ChannelTimings, MRS_STORAGE_LEN, MRS_STORAGE_OFFSET};

const IMC_CR_TC_ACT: usize = 0x008;
const IMC_CR_TC_PRE: usize = 0x000;
const IMC_TC_PWDEN: usize = 0x050;
const IMC_CR_TC_ODT: usize = 0x070;
const IMC_SC_GS_CFG: usize = 0x088;
const IMC_RTL: usize = 0x020;
const IMC_RDRD: usize = 0x00C;
const IMC_RDWR: usize = 0x010;
const IMC_WRRD: usize = 0x014;
const IMC_WRWR: usize = 0x018;
const IMC_REFRESH_AUX: usize = 0x438;
const IMC_REFRESH_TC: usize = 0x43C;
const IMC_XSDLL: usize = 0x440;
const IMC_RFM: usize = 0x40C;
const IMC_REFRESH_EXT: usize = 0x488;
const IMC_DEC_ADD_CWL: usize = 0x478;
const IMC_XSR: usize = 0x4C0;

pub fn decode(channel: u8, data: &[u8]) -> ChannelTimings {
    let b = |off: usize, first: u32, last: u32| get_bits(data, off, first, Some(last)) as u32;
    let bit = |off: usize, pos: u32| get_bits(data, off, pos, Some(pos)) != 0;

    let t_cwl = b(IMC_CR_TC_ODT, 24, 31);
    let t_rdpre = b(IMC_CR_TC_PRE, 13, 19);
    let t_wrpre = b(IMC_CR_TC_PRE, 32, 41);

    let dec_t_cwl = b(IMC_DEC_ADD_CWL, 0, 5);
    let add_t_cwl = b(IMC_DEC_ADD_CWL, 6, 11);

    let t_rfc_raw = b(IMC_REFRESH_TC, 18, 30);

    let mrs_end = (MRS_STORAGE_OFFSET + MRS_STORAGE_LEN).min(data.len());
    let mrs_storage = data.get(MRS_STORAGE_OFFSET..mrs_end).unwrap_or(&[]).to_vec();

    ChannelTimings {
        channel,

        t_cl: b(IMC_CR_TC_ODT, 16, 22),
        t_cwl,
        t_rcd: b(IMC_CR_TC_PRE, 51, 58),
        t_rcdw: None, // not exposed distinctly from tRCD in the 12th-gen map
        t_rp: b(IMC_CR_TC_PRE, 0, 7),
        t_rpab_ext: b(IMC_CR_TC_PRE, 8, 12),
        t_rdpre,
        t_rtp: t_rdpre,
        t_ppd: b(IMC_CR_TC_PRE, 20, 23),
        t_wrpre,
        t_ras: b(IMC_CR_TC_PRE, 42, 50),
        derating_ext: b(IMC_CR_TC_PRE, 59, 62),

        t_refi: b(IMC_REFRESH_TC, 0, 17),
        t_rfc_raw,
        t_rfc: None, // resolved later against MR4.RefreshTrfcMode (FGR rule)
        t_rfc2: None,
        t_refix9: b(IMC_REFRESH_AUX, 24, 31),
        t_rfcpb: b(IMC_REFRESH_EXT, 10, 20),
        t_rfm: b(IMC_RFM, 0, 10),

        t_faw: b(IMC_CR_TC_ACT, 0, 8),
        t_rrd_sg: b(IMC_CR_TC_ACT, 9, 14),
        t_rrd_dg: b(IMC_CR_TC_ACT, 15, 21),
        t_refsbrd: b(IMC_CR_TC_ACT, 24, 31),

        t_cke: b(IMC_TC_PWDEN, 0, 6),
        t_xp: b(IMC_TC_PWDEN, 7, 13),
        t_xpdll: b(IMC_TC_PWDEN, 14, 20),
        t_rdpden: b(IMC_TC_PWDEN, 21, 28),
        t_wrpden: b(IMC_TC_PWDEN, 32, 41),
        t_csh: b(IMC_TC_PWDEN, 42, 47),
        t_csl: b(IMC_TC_PWDEN, 48, 53),
        t_prpden: b(IMC_TC_PWDEN, 59, 63),

        cmd_stretch: b(IMC_SC_GS_CFG, 3, 4) as u8,
        n_to_1_ratio: b(IMC_SC_GS_CFG, 5, 7) as u8,
        address_mirror: b(IMC_SC_GS_CFG, 8, 11) as u8,
        gear2: bit(IMC_SC_GS_CFG, 31),
        gear4: bit(IMC_SC_GS_CFG, 15),

        t_rdrd_sg: b(IMC_RDRD, 0, 6),
        t_rdrd_dg: b(IMC_RDRD, 8, 14),
        t_rdrd_dr: b(IMC_RDRD, 16, 23),
        t_rdrd_dd: b(IMC_RDRD, 24, 31),
        t_rdwr_sg: b(IMC_RDWR, 0, 7),
        t_rdwr_dg: b(IMC_RDWR, 8, 15),
        t_rdwr_dr: b(IMC_RDWR, 16, 23),
        t_rdwr_dd: b(IMC_RDWR, 24, 31),
        t_wrrd_sg: b(IMC_WRRD, 0, 8),
        t_wrrd_dg: b(IMC_WRRD, 9, 17),
        t_wrrd_dr: b(IMC_WRRD, 18, 24),
        t_wrrd_dd: b(IMC_WRRD, 25, 31),
        t_wrwr_sg: b(IMC_WRWR, 0, 6),
        t_wrwr_dg: b(IMC_WRWR, 8, 14),
        t_wrwr_dr: b(IMC_WRWR, 16, 22),
        t_wrwr_dd: b(IMC_WRWR, 24, 31),

        t_xsdll: b(IMC_XSDLL, 0, 12),
        t_zqoper: b(IMC_XSDLL, 16, 23),
        t_mod: b(IMC_XSDLL, 24, 31),

        dec_t_cwl,
        add_t_cwl,
        add_1qclk_delay: bit(IMC_DEC_ADD_CWL, 12),

        t_xsr: b(IMC_XSR, 0, 12),
        t_sr: b(IMC_XSR, 52, 57),

        t_rtl: [b(IMC_RTL, 0, 7), b(IMC_RTL, 8, 15), b(IMC_RTL, 16, 23), b(IMC_RTL, 24, 31)],

        banks: if b(IMC_SC_GS_CFG, 0, 2) != 0 { 8 } else { 16 },

        mrs_storage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_zeroed_block_without_panicking() {
        let block = vec![0u8; 0x800];
        let t = decode(0, &block);
        assert_eq!(t.channel, 0);
        assert_eq!(t.t_cl, 0);
        assert_eq!(t.banks, 16);
    }
}
