//! `proptest` strategies for the bit-decoder invariants of spec §8
//! (`SPEC_FULL.md` §F): `get_bits`/`sint`/`fixed` round-trips and the
//! Rtt/Vref lookup tables' total-function guarantees.

use proptest::prelude::*;

/// A byte-offset, bit-range pair that always lies inside an 8-byte buffer
/// and never exceeds `get_bits`'s 64-bit-field limit.
pub fn bit_range_in_u64() -> impl Strategy<Value = (usize, u32, u32)> {
    (0usize..=0, 0u32..32).prop_flat_map(|(byte_offset, first_bit)| {
        (Just(byte_offset), Just(first_bit), first_bit..(first_bit + 32).min(63))
    })
}

pub fn any_rtt_code() -> impl Strategy<Value = u8> {
    0u8..=7
}

pub fn any_vref_code() -> impl Strategy<Value = u8> {
    0u8..=0x7F
}

proptest! {
    /// `get_bits` followed by `sint` never panics and always yields a value
    /// representable in `sign_bits` bits, for any field width the register
    /// maps actually use (1..=32 bits).
    #[test]
    fn sint_stays_within_signed_range(raw: u64, sign_bits in 1u32..=32) {
        let value = raw & ((1u128 << sign_bits) - 1) as u64;
        let signed = imc_decode::sint(value, sign_bits);
        let max = (1i64 << (sign_bits - 1)) - 1;
        let min = -(1i64 << (sign_bits - 1));
        prop_assert!(signed >= min && signed <= max);
    }

    /// `fixed` with no sign bits is just a monotonic rescale: larger raw
    /// values never produce a smaller result.
    #[test]
    fn fixed_unsigned_is_monotonic(a in 0u64..(1 << 20), b in 0u64..(1 << 20), frac_bits in 0u32..16) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(imc_decode::fixed(lo, frac_bits, None) <= imc_decode::fixed(hi, frac_bits, None));
    }

    /// Every code in the Rtt/Vref tables' input domain either resolves to a
    /// named value or `None` — the lookup itself never panics, for any
    /// `u8` input, not just the documented 3-bit/7-bit domains.
    #[test]
    fn rtt_ohms_is_total_over_all_bytes(code: u8) {
        let _ = imc_decode::rtt_ohms(code);
    }

    #[test]
    fn vref_percent_is_total_over_all_bytes(code: u8) {
        let _ = imc_decode::vref_percent(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;

    #[test]
    fn rtt_and_vref_code_strategies_stay_in_domain() {
        let mut runner = TestRunner::default();
        runner
            .run(&any_rtt_code(), |c| {
                prop_assert!(c <= 7);
                Ok(())
            })
            .unwrap();
        runner
            .run(&any_vref_code(), |c| {
                prop_assert!(c <= 0x7F);
                Ok(())
            })
            .unwrap();
    }
}
