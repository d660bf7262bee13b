//! Exercises the MCHBAR walker, per-generation register maps and MR-storage
//! parser end to end against golden fixtures, without a real driver handle.

use imc_platform::cpu::CpuFamily;
use imc_platform::{cap, inter_channel, mchbar, mrs, regmap};
use imc_testing::fixtures;
use imc_testing::FakeKio;

const MCHBAR_BASE: u64 = 0xFE00_0000;

fn mchbar_fake() -> FakeKio {
    FakeKio::new().with_pci(0, 0, 0, 0x48, (MCHBAR_BASE | 1) as u32).with_pci(0, 0, 0, 0x4C, 0)
}

#[test]
fn mchbar_base_reads_back_with_controller_spacing() {
    let kio = mchbar_fake();
    assert_eq!(mchbar::mchbar_base(&kio, 0).unwrap(), MCHBAR_BASE);
    assert_eq!(mchbar::mchbar_base(&kio, 1).unwrap(), MCHBAR_BASE + 0x1_0000);
}

#[test]
fn inter_channel_decodes_ddr5_dual_channel() {
    let kio = mchbar_fake().with_phymem_block(MCHBAR_BASE + 0xD800, &[0b0001_0001, 0, 0, 0, 0, 0, 0, 0]);
    let ic = inter_channel::read_inter_channel(&kio, MCHBAR_BASE).unwrap();
    assert_eq!(ic.ddr_type, Some(imc_decode::DdrType::Ddr5));
    assert_eq!(ic.ch_l_map, 1);
}

#[test]
fn channel_dimm_info_decodes_populated_channel() {
    // dimm_l_size_512mb=8 (bits 0..6), width_code=1 (16-bit, bits 7..8)
    let chars: u32 = 8 | (1 << 7);
    let kio = mchbar_fake().with_phymem_block(MCHBAR_BASE + 0xD80C, &chars.to_le_bytes());
    let info = inter_channel::read_channel_dimm_info(&kio, MCHBAR_BASE, 0).unwrap();
    assert_eq!(info.dimm_l_size_512mb, 8);
    assert_eq!(inter_channel::ChannelDimmInfo::dimm_width(info.dimm_l_width_code), Some(16));
}

#[test]
fn capabilities_decode_from_capid_dwords() {
    let kio = mchbar_fake()
        .with_pci(0, 0, 0, 0xE4, 0b0000_0000) // DDR5/DDR4 both supported, OC enabled
        .with_pci(0, 0, 0, 0xE8, 0b0000_0010) // max_channels = bits[1:2]+1 = 2+1
        .with_pci(0, 0, 0, 0xEC, 0b0000_0001); // max_dimms_per_channel = bits[0:1]+1 = 2
    let caps = cap::read_capabilities(&kio).unwrap();
    assert!(caps.ddr5_supported);
    assert!(!caps.overclock_disabled);
    assert_eq!(caps.max_channels, 3);
    assert_eq!(caps.max_dimms_per_channel, 2);
}

#[test]
fn gen12_fixture_round_trips_through_regmap_and_mrs() {
    let mrs_blob = fixtures::mrs::gen12_single_rank(true);
    let block = fixtures::mchbar::gen12_channel_block(&mrs_blob);

    let timings = regmap::for_family(CpuFamily::TwelfthGen).decode(0, &block);
    assert_eq!(timings.t_cl, 22);
    assert_eq!(timings.t_cwl, 16);
    assert_eq!(timings.banks, 16);

    let decoded = mrs::decode(CpuFamily::TwelfthGen, &timings.mrs_storage);
    assert_eq!(decoded.rtt_gen12.as_ref().map(|t| t.ranks), Some(1));
    let seq = decoded.sequential.expect("sequential MRs present");
    assert_eq!((seq.mr4 >> 3) & 0x7, 1, "FGR-enabled bit should be set by the fixture");
}

#[test]
fn gen15_fixture_relocates_trp_and_decodes_rtt_directly() {
    let mrs_blob = fixtures::mrs::gen15(false);
    let block = fixtures::mchbar::gen15_channel_block(&mrs_blob);

    let timings = regmap::for_family(CpuFamily::FifteenthGen).decode(1, &block);
    assert_eq!(timings.t_rp, 14);
    assert_eq!(timings.channel, 1);

    let decoded = mrs::decode(CpuFamily::FifteenthGen, &timings.mrs_storage);
    assert!(decoded.rtt_gen15.is_some());
}
