//! Golden MCHBAR per-channel blocks for both register-map generations
//! (`imc_platform::regmap::gen12`/`gen15`). Field placement mirrors
//! `imc_decode::get_bits`'s little-endian accumulation exactly, so a
//! fixture built here and fed back through `RegisterMap::decode` round-trips
//! the values set below.

const IMC_CR_TC_PRE: usize = 0x000;
const IMC_CR_TC_ODT: usize = 0x070;
const IMC_SC_GS_CFG: usize = 0x088;
const IMC_TRP_EXT: usize = 0x138;

/// MR-storage blob lives at this offset inside every channel's 0x800-byte
/// block (`imc_platform::regmap::MRS_STORAGE_OFFSET`).
pub const MRS_STORAGE_OFFSET: usize = 0x200;

fn set_bits(buf: &mut [u8], byte_offset: usize, first_bit: u32, last_bit: u32, value: u64) {
    let nbits = last_bit - first_bit + 1;
    let start_bit = byte_offset * 8 + first_bit as usize;
    let end_bit = byte_offset * 8 + last_bit as usize;
    let start_byte = start_bit / 8;
    let end_byte = end_bit / 8;
    let shift = start_bit - start_byte * 8;
    let mask: u128 = if nbits >= 128 { u128::MAX } else { (1u128 << nbits) - 1 };

    let mut acc: u128 = 0;
    for (i, b) in buf[start_byte..=end_byte].iter().enumerate() {
        acc |= (*b as u128) << (8 * i);
    }
    acc &= !(mask << shift);
    acc |= ((value as u128) & mask) << shift;
    for i in 0..=(end_byte - start_byte) {
        buf[start_byte + i] = ((acc >> (8 * i)) & 0xFF) as u8;
    }
}

/// One populated, otherwise-zeroed 12th-gen channel block: tCL=22, tCWL=16,
/// tRP=14, tRAS=52, 16 banks, with `mrs_blob` embedded at
/// [`MRS_STORAGE_OFFSET`].
pub fn gen12_channel_block(mrs_blob: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 0x800];
    set_bits(&mut buf, IMC_CR_TC_ODT, 16, 22, 22);
    set_bits(&mut buf, IMC_CR_TC_ODT, 24, 31, 16);
    set_bits(&mut buf, IMC_CR_TC_PRE, 0, 7, 14);
    set_bits(&mut buf, IMC_CR_TC_PRE, 42, 50, 52);
    set_bits(&mut buf, IMC_SC_GS_CFG, 0, 2, 0);
    embed_mrs(&mut buf, mrs_blob);
    buf
}

/// Same timings, but with tRP relocated to 0x138 per the 15th-gen map.
pub fn gen15_channel_block(mrs_blob: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 0x800];
    set_bits(&mut buf, IMC_CR_TC_ODT, 16, 22, 22);
    set_bits(&mut buf, IMC_CR_TC_ODT, 24, 31, 16);
    set_bits(&mut buf, IMC_TRP_EXT, 0, 7, 14);
    set_bits(&mut buf, IMC_CR_TC_PRE, 42, 50, 52);
    set_bits(&mut buf, IMC_SC_GS_CFG, 0, 2, 0);
    embed_mrs(&mut buf, mrs_blob);
    buf
}

fn embed_mrs(buf: &mut [u8], mrs_blob: &[u8]) {
    let end = (MRS_STORAGE_OFFSET + mrs_blob.len()).min(buf.len());
    let copy_len = end - MRS_STORAGE_OFFSET;
    buf[MRS_STORAGE_OFFSET..end].copy_from_slice(&mrs_blob[..copy_len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use imc_decode::get_bits;

    #[test]
    fn set_bits_round_trips_through_get_bits() {
        let mut buf = vec![0u8; 16];
        set_bits(&mut buf, 3, 4, 11, 0xAB);
        assert_eq!(get_bits(&buf, 3, 4, Some(11)), 0xAB);
    }

    #[test]
    fn gen12_block_is_the_right_size_and_carries_the_mrs_blob() {
        let block = gen12_channel_block(&[0x42; 10]);
        assert_eq!(block.len(), 0x800);
        assert_eq!(&block[MRS_STORAGE_OFFSET..MRS_STORAGE_OFFSET + 10], &[0x42; 10]);
    }
}
