//! Timings the register map does not expose directly but derives from
//! adjacent fields (spec §4.5 "derived timings", design note §9).

use imc_decode::{CommandRate, DdrType};

use crate::regmap::ChannelTimings;

/// tWTR_L/tWTR_S, JEDEC-aligned: `tWRRD − tCWL − BL − 2` (spec §4.5, §9: "the
/// spec requires the JEDEC-aligned formula but the implementer should expose
/// both on request"). The `legacy_*` fields are `original_source/memory.py`'s
/// actual (undocumented, ASRock-observed) formula — present only as a
/// commented-out alternative in that file — folding `DEC_tCWL`/`ADD_tCWL`
/// into an effective CWL and subtracting a flat 10 cycles instead of `BL+2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteToReadTurnaround {
    pub jedec_long: i64,
    pub jedec_short: i64,
    pub legacy_long: i64,
    pub legacy_short: i64,
}

pub fn write_to_read_turnaround(t: &ChannelTimings, ddr_type: DdrType) -> WriteToReadTurnaround {
    let cwl = i64::from(t.t_cwl);
    let bl = i64::from(ddr_type.burst_length());

    let jedec_long = i64::from(t.t_wrrd_sg) - cwl - bl - 2;
    let jedec_short = i64::from(t.t_wrrd_dg) - cwl - bl - 2;

    let x_cwl = cwl - i64::from(t.dec_t_cwl) + i64::from(t.add_t_cwl);
    let legacy_long = i64::from(t.t_wrrd_sg) - x_cwl - 10;
    let legacy_short = i64::from(t.t_wrrd_dg) - x_cwl - 10;

    WriteToReadTurnaround { jedec_long, jedec_short, legacy_long, legacy_short }
}

/// tRTP with the 2N/3N/N:1 command-rate correction (spec §4.5: "tRTP =
/// tRDPRE (+1 if 2N command rate)").
pub fn read_to_precharge(t: &ChannelTimings) -> u32 {
    let slower_than_1n = matches!(t.command_rate(), Some(CommandRate::N2) | Some(CommandRate::N3) | Some(CommandRate::NTo1));
    if slower_than_1n {
        t.t_rdpre + 1
    } else {
        t.t_rdpre
    }
}

/// tWR, derived from tWRPRE (spec §4.5: `tWR = tWRPRE − tCWL − BL`, with
/// `+1` for LPDDR, `×4` for LPDDR5, and `−1` when DDR5 runs 2N command
/// rate). `None` when `tWRPRE` does not clear `tCWL + BL`, mirroring
/// `original_source/memory.py`'s guard before computing tWR at all.
pub fn write_recovery(t: &ChannelTimings, ddr_type: DdrType) -> Option<u32> {
    let bl = t.t_cwl + ddr_type.burst_length();
    if t.t_wrpre <= bl {
        return None;
    }
    let mut twr = t.t_wrpre - bl;

    match ddr_type {
        DdrType::Lpddr4 => twr += 1,
        DdrType::Lpddr5 => {
            twr += 1;
            twr *= 4;
        }
        DdrType::Ddr5 => {
            if matches!(t.command_rate(), Some(CommandRate::N2)) {
                twr = twr.saturating_sub(1);
            }
        }
        DdrType::Ddr4 => {}
    }
    Some(twr)
}

/// Resolves the FGR (Fine Granularity Refresh) mutual exclusion between
/// `tRFC` and `tRFC2` once MR4's `RefreshTrfcMode` bits are known (spec
/// §4.5: "when FGR is in effect the raw refresh value is tRFC2, not tRFC").
pub fn apply_fgr_rule(t: &mut ChannelTimings, fgr_enabled: bool) {
    if fgr_enabled {
        t.t_rfc2 = Some(t.t_rfc_raw);
        t.t_rfc = None;
    } else {
        t.t_rfc = Some(t.t_rfc_raw);
        t.t_rfc2 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_timings() -> ChannelTimings {
        crate::regmap::for_family(crate::cpu::CpuFamily::TwelfthGen).decode(0, &vec![0u8; 0x800])
    }

    #[test]
    fn fgr_rule_is_mutually_exclusive() {
        let mut t = blank_timings();
        t.t_rfc_raw = 42;
        apply_fgr_rule(&mut t, true);
        assert_eq!(t.t_rfc2, Some(42));
        assert_eq!(t.t_rfc, None);

        apply_fgr_rule(&mut t, false);
        assert_eq!(t.t_rfc, Some(42));
        assert_eq!(t.t_rfc2, None);
    }

    #[test]
    fn write_recovery_absent_when_wrpre_too_small() {
        let mut t = blank_timings();
        t.t_wrpre = 5;
        t.t_cwl = 10;
        assert_eq!(write_recovery(&t, DdrType::Ddr4), None);
    }

    #[test]
    fn write_recovery_present_for_ddr4() {
        let mut t = blank_timings();
        t.t_cwl = 14;
        t.t_wrpre = 30;
        assert_eq!(write_recovery(&t, DdrType::Ddr4), Some(30 - (14 + 4)));
    }

    #[test]
    fn jedec_turnaround_matches_scenario_from_spec() {
        // spec §8 scenario 1: tCWL=34, BL=8(DDR5) => tWTR_S = tWRRD_dg - 44.
        let mut t = blank_timings();
        t.t_cwl = 34;
        t.t_wrrd_dg = 100;
        t.t_wrrd_sg = 120;
        let turn = write_to_read_turnaround(&t, DdrType::Ddr5);
        assert_eq!(turn.jedec_short, 100 - 44);
    }
}
