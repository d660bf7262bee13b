//! MR storage ("MRS") blob parsing (spec §4.5, §9). Unlike every other
//! module in this crate this one has no grounding in `original_source/` —
//! `pyhwinfo` never implements MR-storage decoding at all. The algorithm
//! here follows spec.md's own description verbatim; see `DESIGN.md` for why
//! that is the cited source instead of a Python file.

use serde::Serialize;

use imc_decode::{mr13_entry, vref_percent, Mr13Entry};

use crate::cpu::CpuFamily;

const SELECT_ALL_PDA: u8 = 0x7F;
const ANCHOR_12TH_GEN: [u8; 3] = [0x1B, 0x1B, 0x1B];
const ANCHOR_15TH_GEN: [u8; 3] = [0x09, 0x09, 0x12];

/// MR34..MR37 sit at four consecutive byte offsets once MR37 is located, so
/// the "backward walk" spec.md describes for 12th-gen and the `MR37 - 3`
/// rule it states for 15th-gen are the same arithmetic; what differs between
/// families is how many per-rank Rtt values follow, not this offset.
const MR34_BEFORE_MR37: usize = 3;

/// High-nibble tag bytes the MRS byte stream uses to mark the group-A/B Rtt
/// CK/CS/CA values and the standalone ParkDqs/Park/MR13 entries (spec §4.5:
/// "Group A/B Rtt CK/CS/CA are recognised by their high nibble prefixes
/// (0x20/0x28/0x30/0x38/0x40/0x48); ParkDqs by 0x50; Park by 0x58; MR13/
/// tCCD_L by 0x80."). No original-tool or public JEDEC source documents the
/// byte that follows a tag, so this crate treats each tag as a one-byte
/// marker immediately followed by a one-byte 3-bit code, the same
/// convention every other Rtt/MR13 code in this module already uses; see
/// `DESIGN.md`.
const TAG_GROUP_A_RTT_CK: u8 = 0x20;
const TAG_GROUP_A_RTT_CS: u8 = 0x28;
const TAG_GROUP_A_RTT_CA: u8 = 0x30;
const TAG_GROUP_B_RTT_CK: u8 = 0x38;
const TAG_GROUP_B_RTT_CS: u8 = 0x40;
const TAG_GROUP_B_RTT_CA: u8 = 0x48;
const TAG_PARK_DQS: u8 = 0x50;
const TAG_PARK: u8 = 0x58;
const TAG_MR13: u8 = 0x80;

/// On-die termination values recovered from MR34/35/36 once MR37 is
/// unambiguously located (spec §4.5: "on 15th-gen one value each ..."), plus
/// `rtt_park_dqs` which is not part of the MR34/35/36 triplet and is instead
/// recovered from the tag-0x50 scan (spec §3 "per-rank Rtt tables (Wr, Park,
/// ParkDqs, NomRd, NomWr, Loopback)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RttFields {
    pub rtt_wr: u8,
    pub rtt_park: u8,
    pub rtt_park_dqs: Option<u8>,
    pub rtt_nom_wr: u8,
    pub rtt_nom_rd: u8,
    pub rtt_loopback: u8,
}

/// Per-group (A/B) Rtt CK/CS/CA (spec §3: "and per-group (A/B) Rtt CK/CS/CA";
/// §4.5's tag-byte scan).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupRtt {
    pub rtt_ck: Option<u8>,
    pub rtt_cs: Option<u8>,
    pub rtt_ca: Option<u8>,
}

/// 12th-gen Rtt region may repeat its fields once per populated rank (spec
/// §4.5: "the region may be 1x, 2x or 4x populated ... try the three
/// templates in order and accept the first whose total length matches the
/// remaining bytes").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RttRankTemplate {
    pub ranks: u8,
    pub values: Vec<RttFields>,
}

/// MR4/5/6/8/10/11/12, read as the fixed-order byte stream that follows the
/// Rtt block (spec §4.5: "after the Rtt block the stream continues with
/// MR4, MR5, MR6, MR8, MR10 (Vref Dq), MR11 (Vref Ca), MR12 (Vref Cs) in
/// fixed order"). This crate assumes that stream starts immediately after
/// the 3-byte MR37 anchor, since no original-tool grounding pins down the
/// exact byte gap; see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequentialMrs {
    pub mr4: u8,
    pub mr5: u8,
    pub mr6: u8,
    pub mr8: u8,
    pub mr10: u8,
    pub mr11: u8,
    pub mr12: u8,
    pub vref_dq_percent: Option<f64>,
    pub vref_ca_percent: Option<f64>,
    pub vref_cs_percent: Option<f64>,
}

fn sequential_mrs(raw: &[u8], mr37_offset: usize) -> Option<SequentialMrs> {
    let base = mr37_offset + 3;
    let byte = |i: usize| raw.get(base + i).copied();
    let (mr4, mr5, mr6, mr8, mr10, mr11, mr12) =
        (byte(0)?, byte(1)?, byte(2)?, byte(3)?, byte(4)?, byte(5)?, byte(6)?);
    Some(SequentialMrs {
        mr4,
        mr5,
        mr6,
        mr8,
        mr10,
        mr11,
        mr12,
        vref_dq_percent: vref_percent(mr10 & 0x7F),
        vref_ca_percent: vref_percent(mr11 & 0x7F),
        vref_cs_percent: vref_percent(mr12 & 0x7F),
    })
}

/// Decoded MR storage region: the anchor search is a heuristic over real
/// hardware bytes (spec §9 "open questions the implementer should not
/// guess"), so ambiguous results are surfaced as candidate offsets plus the
/// raw bytes rather than silently picking one.
#[derive(Debug, Clone, PartialEq)]
pub struct MrStorage {
    pub raw: Vec<u8>,
    pub mrs_size: usize,
    pub mr37_offset: Option<usize>,
    pub mr34_offset: Option<usize>,
    /// Populated instead of `mr37_offset` when the anchor search found more
    /// than one candidate location.
    pub ambiguous_candidates: Vec<usize>,
    pub rtt_gen15: Option<RttFields>,
    pub rtt_gen12: Option<RttRankTemplate>,
    pub sequential: Option<SequentialMrs>,
    pub group_a: GroupRtt,
    pub group_b: GroupRtt,
    pub mr13: Option<Mr13Entry>,
}

fn mrs_size(raw: &[u8]) -> usize {
    if let Some(idx) = raw.iter().rposition(|&b| b == SELECT_ALL_PDA) {
        idx + 1
    } else {
        raw.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0)
    }
}

fn find_anchor(region: &[u8], anchor: &[u8; 3]) -> Vec<usize> {
    region.windows(3).enumerate().filter(|(_, w)| *w == anchor).map(|(i, _)| i).collect()
}

fn rtt_fields_from(mr34: u8, mr35: u8, mr36: u8, rtt_park_dqs: Option<u8>) -> RttFields {
    RttFields {
        rtt_wr: (mr34 >> 3) & 0x7,
        rtt_park: mr34 & 0x7,
        rtt_park_dqs,
        rtt_nom_wr: mr35 & 0x7,
        rtt_nom_rd: (mr35 >> 3) & 0x7,
        rtt_loopback: mr36 & 0x7,
    }
}

/// Tag bytes recovered from scanning the whole used MRS region (spec §4.5):
/// a tag byte immediately followed by a value byte, whose low 3 bits carry
/// the Rtt/MR13 code. `ParkDqs` and the group-A/B Rtt values are not tied to
/// a specific rank in spec.md's description, so one scan result applies to
/// every rank this region decodes (mirroring how group A/B and ParkDqs are
/// modelled as single fields rather than per-rank arrays in §3).
struct TaggedScan {
    park_dqs: Option<u8>,
    group_a: GroupRtt,
    group_b: GroupRtt,
    mr13_code: Option<u8>,
}

fn scan_tags(region: &[u8]) -> TaggedScan {
    let mut result = TaggedScan { park_dqs: None, group_a: GroupRtt::default(), group_b: GroupRtt::default(), mr13_code: None };
    let mut i = 0;
    while i + 1 < region.len() {
        let tag = region[i];
        let value = region[i + 1] & 0x7;
        match tag {
            TAG_GROUP_A_RTT_CK => result.group_a.rtt_ck = Some(value),
            TAG_GROUP_A_RTT_CS => result.group_a.rtt_cs = Some(value),
            TAG_GROUP_A_RTT_CA => result.group_a.rtt_ca = Some(value),
            TAG_GROUP_B_RTT_CK => result.group_b.rtt_ck = Some(value),
            TAG_GROUP_B_RTT_CS => result.group_b.rtt_cs = Some(value),
            TAG_GROUP_B_RTT_CA => result.group_b.rtt_ca = Some(value),
            TAG_PARK_DQS => result.park_dqs = Some(value),
            TAG_PARK => { /* already carried by RttFields::rtt_park from MR34; the tag only confirms placement */ }
            TAG_MR13 => result.mr13_code = Some(value),
            _ => {}
        }
        i += 1;
    }
    result
}

/// Tries the 1x/2x/4x per-rank templates in order (spec §4.5), accepting the
/// first whose total size exactly matches the bytes remaining between MR34
/// and the end of the used MRS region.
fn rtt_gen12_template(raw: &[u8], mr34_offset: usize, mrs_size: usize, park_dqs: Option<u8>) -> Option<RttRankTemplate> {
    let remaining = mrs_size.checked_sub(mr34_offset)?;
    for ranks in [1u8, 2, 4] {
        let stride = 3usize; // MR34/35/36 triplet per rank
        let total = stride * usize::from(ranks);
        if total != remaining {
            continue;
        }
        let mut values = Vec::with_capacity(ranks as usize);
        for r in 0..usize::from(ranks) {
            let base = mr34_offset + r * stride;
            let Some(&mr34) = raw.get(base) else { return None };
            let Some(&mr35) = raw.get(base + 1) else { return None };
            let Some(&mr36) = raw.get(base + 2) else { return None };
            values.push(rtt_fields_from(mr34, mr35, mr36, park_dqs));
        }
        return Some(RttRankTemplate { ranks, values });
    }
    None
}

pub fn decode(family: CpuFamily, raw: &[u8]) -> MrStorage {
    let size = mrs_size(raw);
    let region = &raw[..size];
    let anchor = match family {
        CpuFamily::TwelfthGen => &ANCHOR_12TH_GEN,
        CpuFamily::FifteenthGen => &ANCHOR_15TH_GEN,
    };
    let matches = find_anchor(region, anchor);

    let (mr37_offset, ambiguous_candidates) = match matches.len() {
        1 => (Some(matches[0]), Vec::new()),
        0 => (None, Vec::new()),
        _ => (None, matches),
    };

    let mr34_offset = mr37_offset.and_then(|off| off.checked_sub(MR34_BEFORE_MR37));

    let tagged = scan_tags(region);

    let (rtt_gen15, rtt_gen12) = match (family, mr34_offset) {
        (CpuFamily::FifteenthGen, Some(off)) => {
            let fields = match (raw.get(off), raw.get(off + 1), raw.get(off + 2)) {
                (Some(&mr34), Some(&mr35), Some(&mr36)) => Some(rtt_fields_from(mr34, mr35, mr36, tagged.park_dqs)),
                _ => None,
            };
            (fields, None)
        }
        (CpuFamily::TwelfthGen, Some(off)) => (None, rtt_gen12_template(raw, off, size, tagged.park_dqs)),
        _ => (None, None),
    };

    let sequential = mr37_offset.and_then(|off| sequential_mrs(raw, off));
    let mr13 = tagged.mr13_code.and_then(mr13_entry);

    MrStorage {
        raw: raw.to_vec(),
        mrs_size: size,
        mr37_offset,
        mr34_offset,
        ambiguous_candidates,
        rtt_gen15,
        rtt_gen12,
        sequential,
        group_a: tagged.group_a,
        group_b: tagged.group_b,
        mr13,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mrs_size_stops_at_select_all_pda_marker() {
        let mut raw = vec![0u8; 240];
        raw[10] = SELECT_ALL_PDA;
        assert_eq!(mrs_size(&raw), 11);
    }

    #[test]
    fn unambiguous_anchor_yields_mr37_and_mr34_offsets() {
        let mut raw = vec![0u8; 240];
        raw[20] = 0x1B;
        raw[21] = 0x1B;
        raw[22] = 0x1B;
        raw[23] = SELECT_ALL_PDA;
        let mrs = decode(CpuFamily::TwelfthGen, &raw);
        assert_eq!(mrs.mr37_offset, Some(20));
        assert_eq!(mrs.mr34_offset, Some(17));
        assert!(mrs.ambiguous_candidates.is_empty());
    }

    #[test]
    fn repeated_anchor_is_reported_as_ambiguous() {
        let mut raw = vec![0u8; 240];
        raw[5] = 0x1B;
        raw[6] = 0x1B;
        raw[7] = 0x1B;
        raw[8] = 0x1B;
        raw[20] = 0x1B;
        raw[21] = 0x1B;
        raw[22] = 0x1B;
        raw[23] = SELECT_ALL_PDA;
        let mrs = decode(CpuFamily::TwelfthGen, &raw);
        assert_eq!(mrs.mr37_offset, None);
        assert!(mrs.ambiguous_candidates.len() >= 2);
    }

    #[test]
    fn gen15_anchor_decodes_rtt_fields_directly() {
        let mut raw = vec![0u8; 240];
        raw[10] = 0b0010_1011; // MR34: rtt_wr=5 (bits 3..5), rtt_park=3 (bits 0..2)
        raw[11] = 0b0001_0010; // MR35: rtt_nom_rd=2, rtt_nom_wr=2
        raw[12] = 0b0000_0100; // MR36: rtt_loopback=4
        raw[13] = 0x09;
        raw[14] = 0x09;
        raw[15] = 0x12;
        raw[16] = SELECT_ALL_PDA;
        let mrs = decode(CpuFamily::FifteenthGen, &raw);
        let rtt = mrs.rtt_gen15.expect("rtt fields");
        assert_eq!(rtt.rtt_park, 3);
        assert_eq!(rtt.rtt_wr, 5);
    }

    #[test]
    fn tag_scan_recovers_group_rtt_park_dqs_and_mr13() {
        let mut raw = vec![0u8; 240];
        raw[0] = TAG_GROUP_A_RTT_CK;
        raw[1] = 0x03;
        raw[2] = TAG_GROUP_A_RTT_CS;
        raw[3] = 0x05;
        raw[4] = TAG_GROUP_B_RTT_CA;
        raw[5] = 0x02;
        raw[6] = TAG_PARK_DQS;
        raw[7] = 0x06;
        raw[8] = TAG_MR13;
        raw[9] = 0x01;
        raw[20] = 0x1B;
        raw[21] = 0x1B;
        raw[22] = 0x1B;
        raw[23] = SELECT_ALL_PDA;

        let mrs = decode(CpuFamily::TwelfthGen, &raw);
        assert_eq!(mrs.group_a.rtt_ck, Some(3));
        assert_eq!(mrs.group_a.rtt_cs, Some(5));
        assert_eq!(mrs.group_a.rtt_ca, None);
        assert_eq!(mrs.group_b.rtt_ca, Some(2));
        assert_eq!(mrs.mr13, mr13_entry(1));
    }

    #[test]
    fn rtt_park_dqs_is_threaded_through_the_gen12_rank_template() {
        let mut raw = vec![0u8; 32];
        raw[0] = 0b0010_1011; // MR34 for rank 0
        raw[1] = 0b0001_0010; // MR35 for rank 0
        raw[2] = 0b0000_0100; // MR36 for rank 0
        let template = rtt_gen12_template(&raw, 0, 3, Some(6)).expect("1x template");
        assert_eq!(template.ranks, 1);
        assert_eq!(template.values[0].rtt_park_dqs, Some(6));
        assert_eq!(template.values[0].rtt_park, 3);
    }
}
