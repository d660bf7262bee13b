//! Packed, little-endian hardware records want a single byte-slice reader
//! with `get_bits(offset, first, last)` plus signed/fixed-point helpers
//! (spec §4.3, design note §9) — this avoids per-struct bit-twiddling
//! duplication across the platform walker, mailbox service and SMBus
//! decoders.

/// Extracts the inclusive bit range `[byte_offset*8 + first_bit, byte_offset*8
/// + last_bit]` from `buf`, treating `buf` as little-endian, and returns it
/// right-shifted into an unsigned integer. `last_bit` defaults to
/// `first_bit` (a single bit) when `None`.
///
/// # Panics
/// Panics if the requested range exceeds 64 bits or runs past the end of
/// `buf` — both are programmer errors in the register maps that call this,
/// not something a malformed read can trigger at runtime.
pub fn get_bits(buf: &[u8], byte_offset: usize, first_bit: u32, last_bit: Option<u32>) -> u64 {
    let last_bit = last_bit.unwrap_or(first_bit);
    debug_assert!(first_bit <= last_bit, "first_bit must be <= last_bit");
    let nbits = last_bit - first_bit + 1;
    debug_assert!(nbits <= 64, "get_bits only supports up to 64 bits at a time");

    let start_bit = byte_offset * 8 + first_bit as usize;
    let end_bit = byte_offset * 8 + last_bit as usize;
    let start_byte = start_bit / 8;
    let end_byte = end_bit / 8;

    let mut acc: u128 = 0;
    for (i, b) in buf[start_byte..=end_byte].iter().enumerate() {
        acc |= (*b as u128) << (8 * i);
    }
    let shift = start_bit - start_byte * 8;
    let mask: u128 = if nbits >= 128 { u128::MAX } else { (1u128 << nbits) - 1 };
    ((acc >> shift) & mask) as u64
}

/// Convenience wrapper for the common case of a single full field spanning
/// whole bytes, e.g. a 32-bit register read straight out of an MMIO buffer.
pub fn get_bits_range(buf: &[u8], byte_offset: usize, first_bit: u32, last_bit: u32) -> u64 {
    get_bits(buf, byte_offset, first_bit, Some(last_bit))
}

/// Interprets `value` (the `sign_bits`-wide unsigned field extracted by
/// [`get_bits`]) as two's-complement signed.
pub fn sint(value: u64, sign_bits: u32) -> i64 {
    debug_assert!(sign_bits >= 1 && sign_bits <= 63);
    let sign_mask = 1u64 << (sign_bits - 1);
    if value & sign_mask != 0 {
        (value as i64) - (1i64 << sign_bits)
    } else {
        value as i64
    }
}

/// U*n.m* / S*n.m* fixed-point conversion: `frac_bits` bits of fraction,
/// optionally signed over `sign_bits` total bits (SA voltage U3.13, PCU
/// voltages U12.2.10 / S11.0.10, VID formats, ADC scales, temperature).
pub fn fixed(value: u64, frac_bits: u32, sign_bits: Option<u32>) -> f64 {
    let scale = (1u64 << frac_bits) as f64;
    match sign_bits {
        Some(sb) => sint(value, sb) as f64 / scale,
        None => value as f64 / scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_field() {
        let buf = [0b1010_1100u8];
        assert_eq!(get_bits(&buf, 0, 2, Some(5)), 0b1011);
    }

    #[test]
    fn crosses_byte_boundary() {
        // 16-bit LE value 0x1234, extract bits [4..11] (0-indexed from byte 0)
        let buf = 0x1234u16.to_le_bytes();
        let got = get_bits(&buf, 0, 4, Some(11));
        let full = u16::from_le_bytes(buf) as u64;
        assert_eq!(got, (full >> 4) & 0xFF);
    }

    #[test]
    fn whole_dword() {
        let buf = 0xDEAD_BEEFu32.to_le_bytes();
        assert_eq!(get_bits(&buf, 0, 0, Some(31)), 0xDEAD_BEEF);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sint(0x7F, 8), 127);
        assert_eq!(sint(0x80, 8), -128);
        assert_eq!(sint(0xFF, 8), -1);
    }

    #[test]
    fn fixed_point_unsigned() {
        // U3.13 format: 13 fractional bits
        let raw = 1 << 13; // exactly 1.0
        assert_eq!(fixed(raw, 13, None), 1.0);
    }

    #[test]
    fn fixed_point_signed() {
        let raw = 0xFFu64; // -1 in 8-bit two's complement
        assert_eq!(fixed(raw, 2, Some(8)), -0.25);
    }
}
