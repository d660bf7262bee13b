//! JEDEC JEP-106 vendor-code decoding (spec glossary, §4.3).
//!
//! A JEP-106 identifier is a chain of continuation bytes (each `0x7F`)
//! followed by a terminating byte whose bit 7 is an odd-parity bit over the
//! low 7 bits. The SPD5/PMIC fields this tool reads pack that as one 16-bit
//! little-endian value: low byte = the terminating byte (parity bit still
//! set, stripped here), high byte = the continuation-byte count ("bank").

use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JedecId {
    pub bank: u8,
    pub code: u8,
}

/// Decodes a raw 16-bit SPD/PMIC vendor-id field into a [`JedecId`].
pub fn decode(raw: u16) -> JedecId {
    let low = (raw & 0xFF) as u8;
    let high = (raw >> 8) as u8;
    JedecId {
        bank: high,
        code: low & 0x7F,
    }
}

fn table() -> &'static HashMap<JedecId, &'static str> {
    static TABLE: OnceLock<HashMap<JedecId, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m = HashMap::new();
        // DRAM / module vendors most commonly seen in DDR4/DDR5 SPD data.
        m.insert(JedecId { bank: 0, code: 0x2C }, "Micron Technology");
        m.insert(JedecId { bank: 0, code: 0x4E }, "Samsung");
        m.insert(JedecId { bank: 0, code: 0x2D }, "SK hynix");
        m.insert(JedecId { bank: 1, code: 0x33 }, "Nanya Technology");
        m.insert(JedecId { bank: 1, code: 0x7A }, "Kingston");
        m.insert(JedecId { bank: 1, code: 0x98 }, "Kingmax");
        m.insert(JedecId { bank: 2, code: 0x9E }, "Corsair Memory");
        m.insert(JedecId { bank: 5, code: 0x51 }, "Crucial / Micron Consumer Products Group");
        // PMIC vendors (spec §4.4: Richtek profile is the only one decoded
        // in depth; others stop at the vendor/revision record).
        m.insert(JedecId { bank: 10, code: 0x0C }, "Richtek Technology");
        m.insert(JedecId { bank: 1, code: 0x4F }, "Monolithic Power Systems");
        m.insert(JedecId { bank: 2, code: 0x6B }, "Renesas Electronics");
        m
    })
}

/// Human-readable vendor name, or `None` if the id is not in the static
/// table — preserved as a raw id with `name = unknown` per spec §3(d).
pub fn vendor_name(id: JedecId) -> Option<&'static str> {
    table().get(&id).copied()
}

/// The raw 16-bit id Richtek PMICs report at R3C/R3C+1 (spec §4.4).
pub const RICHTEK_VENDOR_RAW: u16 = 0x0A0C;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn richtek_raw_decodes_to_bank_10_code_12() {
        let id = decode(RICHTEK_VENDOR_RAW);
        assert_eq!(id, JedecId { bank: 10, code: 12 });
        assert_eq!(vendor_name(id), Some("Richtek Technology"));
    }

    #[test]
    fn parity_bit_is_stripped() {
        // low byte 0xAC has bit 7 set (parity); code must come out as 0x2C.
        let id = decode(0x00AC);
        assert_eq!(id.code, 0x2C);
        assert_eq!(vendor_name(id), Some("Micron Technology"));
    }

    #[test]
    fn unknown_id_has_no_name() {
        let id = decode(0xFFFF);
        assert_eq!(vendor_name(id), None);
    }
}
