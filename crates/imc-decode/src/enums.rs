//! Tagged enums mapping numeric codes to human names: DDR type, gear mode,
//! command-rate mode, ODT impedance, Vref percentage, SPD package layout,
//! DDR5 MR13 (spec §4.3).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DdrType {
    Ddr4,
    Ddr5,
    Lpddr4,
    Lpddr5,
}

impl DdrType {
    /// Matches the `ram_type` byte in a DDR5/DDR4 SPD (spec §4.3, grounded
    /// on `original_source/spd_eeprom.py`'s `ram_type` switch).
    pub fn from_spd_code(code: u8) -> Option<Self> {
        match code {
            0x0C => Some(DdrType::Ddr4),
            0x12 => Some(DdrType::Ddr5),
            0x11 => Some(DdrType::Lpddr4),
            0x13 => Some(DdrType::Lpddr5),
            _ => None,
        }
    }

    /// JEDEC generation number used by the "DDR_ver" invariant of spec §8.
    pub fn ddr_ver(self) -> u8 {
        match self {
            DdrType::Ddr4 => 4,
            DdrType::Ddr5 | DdrType::Lpddr5 => 5,
            DdrType::Lpddr4 => 4,
        }
    }

    /// Burst length used by the turnaround-timing formulas of spec §4.5.
    pub fn burst_length(self) -> u32 {
        match self {
            DdrType::Ddr4 => 4,
            DdrType::Ddr5 => 8,
            DdrType::Lpddr4 => 16,
            DdrType::Lpddr5 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gear {
    Gear1,
    Gear2,
    Gear4,
}

impl Gear {
    pub fn ratio(self) -> u32 {
        match self {
            Gear::Gear1 => 1,
            Gear::Gear2 => 2,
            Gear::Gear4 => 4,
        }
    }

    /// 12th-gen decode: `gear = GEAR4 ? 4 : GEAR2 ? 2 : 1` (spec §4.5/§8).
    pub fn from_12th_gen_bits(gear2: bool, gear4: bool) -> Self {
        if gear4 {
            Gear::Gear4
        } else if gear2 {
            Gear::Gear2
        } else {
            Gear::Gear1
        }
    }

    /// 15th-gen decode: a single `SC_GS_CFG` bit picks gear 2 or 4.
    pub fn from_15th_gen_bit(bit: bool) -> Self {
        if bit {
            Gear::Gear4
        } else {
            Gear::Gear2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandRate {
    N1,
    N2,
    N3,
    NTo1,
}

impl CommandRate {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandRate::N1 => "1N",
            CommandRate::N2 => "2N",
            CommandRate::N3 => "3N",
            CommandRate::NTo1 => "N:1",
        }
    }

    /// 12th-gen `CMD_STRETCH` decode (spec §4.5): `{0:1N, 1:2N, 2:3N, 3:N:1}`.
    pub fn from_cmd_stretch(code: u8) -> Option<Self> {
        match code {
            0 => Some(CommandRate::N1),
            1 => Some(CommandRate::N2),
            2 => Some(CommandRate::N3),
            3 => Some(CommandRate::NTo1),
            _ => None,
        }
    }

    /// 15th-gen: a single bit, 0 = 1N, 1 = 2N.
    pub fn from_15th_gen_bit(bit: bool) -> Self {
        if bit {
            CommandRate::N2
        } else {
            CommandRate::N1
        }
    }
}

/// On-die termination resistance, decoded to ohms. `None` means the rail is
/// disabled/Hi-Z for that code — this is itself a valid, total decode, not
/// an error (spec §4.3's Rtt tables; §8's invariant that every decoded value
/// lies in this finite set).
pub const RTT_TABLE_OHMS: [Option<u32>; 8] = [
    None,
    Some(240),
    Some(120),
    Some(80),
    Some(60),
    Some(48),
    Some(40),
    Some(34),
];

pub fn rtt_ohms(code: u8) -> Option<u32> {
    RTT_TABLE_OHMS.get(code as usize).copied().flatten()
}

/// Vref percentage of VDDQ, 0.5% steps starting at 48.0% (spec §8: "Vref
/// percent lies in [48.0, 97.5]"). Valid for codes 0..=99.
pub fn vref_percent(code: u8) -> Option<f64> {
    if code > 99 {
        return None;
    }
    Some(48.0 + f64::from(code) * 0.5)
}

/// SPD "die per package" layout (spec glossary FGR aside; §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiePerPackage {
    Mono,
    Ddp,
    H2_3ds,
    H4_3ds,
    H8_3ds,
    H16_3ds,
}

impl DiePerPackage {
    pub fn from_spd_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(DiePerPackage::Mono),
            0x01 => Some(DiePerPackage::Ddp),
            0x02 => Some(DiePerPackage::H2_3ds),
            0x03 => Some(DiePerPackage::H4_3ds),
            0x04 => Some(DiePerPackage::H8_3ds),
            0x05 => Some(DiePerPackage::H16_3ds),
            _ => None,
        }
    }
}

/// DDR5 MR13 decode: data-rate range selects the nominal tCCD_L family
/// (spec §4.3 "DDR5 MR13 code → (tCCD_L, tCCD_L_WR, tCCD_L_WR2, tDDLK,
/// data-rate range)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mr13Entry {
    pub t_ccd_l: u32,
    pub t_ccd_l_wr: u32,
    pub t_ccd_l_wr2: u32,
    pub t_ddlk: u32,
    pub data_rate_max_mts: u32,
}

/// MR13[2:0] "Data Rate Range" field of JESD79-5.
pub fn mr13_entry(code: u8) -> Option<Mr13Entry> {
    let entry = match code {
        0 => Mr13Entry { t_ccd_l: 8, t_ccd_l_wr: 32, t_ccd_l_wr2: 16, t_ddlk: 1024, data_rate_max_mts: 3200 },
        1 => Mr13Entry { t_ccd_l: 8, t_ccd_l_wr: 32, t_ccd_l_wr2: 16, t_ddlk: 1024, data_rate_max_mts: 4800 },
        2 => Mr13Entry { t_ccd_l: 9, t_ccd_l_wr: 32, t_ccd_l_wr2: 16, t_ddlk: 1280, data_rate_max_mts: 5600 },
        3 => Mr13Entry { t_ccd_l: 10, t_ccd_l_wr: 32, t_ccd_l_wr2: 16, t_ddlk: 1536, data_rate_max_mts: 6400 },
        4 => Mr13Entry { t_ccd_l: 11, t_ccd_l_wr: 40, t_ccd_l_wr2: 20, t_ddlk: 1792, data_rate_max_mts: 7200 },
        5 => Mr13Entry { t_ccd_l: 12, t_ccd_l_wr: 48, t_ccd_l_wr2: 24, t_ddlk: 2048, data_rate_max_mts: 8800 },
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vref_bounds() {
        assert_eq!(vref_percent(0), Some(48.0));
        assert_eq!(vref_percent(99), Some(97.5));
        assert_eq!(vref_percent(100), None);
    }

    #[test]
    fn rtt_known_codes_are_finite_set() {
        for code in 0u8..8 {
            let v = rtt_ohms(code);
            assert!(v.is_none() || RTT_TABLE_OHMS.contains(&v));
        }
    }

    #[test]
    fn gear_mappings_match_spec() {
        assert_eq!(Gear::from_12th_gen_bits(false, false), Gear::Gear1);
        assert_eq!(Gear::from_12th_gen_bits(true, false), Gear::Gear2);
        assert_eq!(Gear::from_12th_gen_bits(false, true), Gear::Gear4);
        assert_eq!(Gear::from_12th_gen_bits(true, true), Gear::Gear4);
    }

    #[test]
    fn command_rate_strings() {
        assert_eq!(CommandRate::N1.as_str(), "1N");
        assert_eq!(CommandRate::NTo1.as_str(), "N:1");
    }
}
