//! Golden MR-storage blobs for both anchor templates `imc_platform::mrs`
//! searches for, each followed by the fixed-order sequential MR stream and
//! terminated with the `SELECT_ALL_PDA` (`0x7F`) end marker.

const SELECT_ALL_PDA: u8 = 0x7F;
const ANCHOR_12TH_GEN: [u8; 3] = [0x1B, 0x1B, 0x1B];
const ANCHOR_15TH_GEN: [u8; 3] = [0x09, 0x09, 0x12];

/// `mr4`'s upper nibble carries the FGR-enabled field this crate derives
/// (`imc_snapshot`'s `fgr_enabled`); `0x08` sets bit 3 so fixtures built with
/// this helper exercise the FGR-enabled branch of `turnaround::apply_fgr_rule`.
const MR4_FGR_ENABLED: u8 = 0x08;

fn sequential_stream(fgr_enabled: bool) -> [u8; 7] {
    let mr4 = if fgr_enabled { MR4_FGR_ENABLED } else { 0 };
    [mr4, 0x11, 0x22, 0x33, 0x40, 0x41, 0x42] // mr4, mr5, mr6, mr8, mr10, mr11, mr12
}

/// One rank's MR34/35/36 triplet (`imc_platform::mrs::rtt_fields_from`).
fn rtt_triplet(rtt_wr: u8, rtt_park: u8, rtt_nom_wr: u8, rtt_nom_rd: u8, rtt_loopback: u8) -> [u8; 3] {
    [(rtt_wr << 3) | rtt_park, (rtt_nom_rd << 3) | rtt_nom_wr, rtt_loopback]
}

/// 12th-gen single-rank MRS region: one MR34/35/36 triplet, the 3-byte
/// anchor, the sequential stream, then the end marker.
pub fn gen12_single_rank(fgr_enabled: bool) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&rtt_triplet(5, 3, 2, 2, 4));
    blob.extend_from_slice(&ANCHOR_12TH_GEN);
    blob.extend_from_slice(&sequential_stream(fgr_enabled));
    blob.push(SELECT_ALL_PDA);
    blob
}

/// 12th-gen dual-rank MRS region: two MR34/35/36 triplets back to back.
pub fn gen12_dual_rank(fgr_enabled: bool) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&rtt_triplet(5, 3, 2, 2, 4));
    blob.extend_from_slice(&rtt_triplet(1, 0, 1, 1, 0));
    blob.extend_from_slice(&ANCHOR_12TH_GEN);
    blob.extend_from_slice(&sequential_stream(fgr_enabled));
    blob.push(SELECT_ALL_PDA);
    blob
}

/// 15th-gen MRS region: one MR34/35/36 triplet directly ahead of its
/// distinct 3-byte anchor.
pub fn gen15(fgr_enabled: bool) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&rtt_triplet(5, 3, 2, 2, 4));
    blob.extend_from_slice(&ANCHOR_15TH_GEN);
    blob.extend_from_slice(&sequential_stream(fgr_enabled));
    blob.push(SELECT_ALL_PDA);
    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use imc_platform::cpu::CpuFamily;
    use imc_platform::mrs::decode;

    #[test]
    fn gen12_single_rank_decodes_one_rank_template() {
        let blob = gen12_single_rank(false);
        let mrs = decode(CpuFamily::TwelfthGen, &blob);
        assert_eq!(mrs.rtt_gen12.as_ref().map(|t| t.ranks), Some(1));
        assert!(mrs.ambiguous_candidates.is_empty());
    }

    #[test]
    fn gen15_decodes_rtt_directly_and_flags_fgr() {
        let blob = gen15(true);
        let mrs = decode(CpuFamily::FifteenthGen, &blob);
        assert!(mrs.rtt_gen15.is_some());
        let mr4 = mrs.sequential.expect("sequential MRs").mr4;
        assert_eq!((mr4 >> 3) & 0x7, 1);
    }
}
