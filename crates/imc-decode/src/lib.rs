//! Bit-field decoder (component D, spec §4.3): a pure function library, no
//! I/O, no hardware knowledge beyond "here is a byte buffer and a bit range".

mod bits;
mod enums;
mod jep106;
mod named;
mod spd;

pub use bits::{fixed, get_bits, get_bits_range, sint};
pub use enums::{
    mr13_entry, rtt_ohms, vref_percent, CommandRate, DdrType, DiePerPackage, Gear, Mr13Entry,
    RTT_TABLE_OHMS,
};
pub use jep106::{decode as jep106_decode, vendor_name as jep106_vendor_name, JedecId, RICHTEK_VENDOR_RAW};
pub use named::Named;
pub use spd::{decode as spd_decode, DiePackage, PmicDescriptor, SpdDecode};
