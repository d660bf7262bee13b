//! Intel i801-style SMBus host controller register map (spec §4.4, grounded
//! byte-for-byte on `original_source/smbus.py`).

pub const SMBHSTSTS: u16 = 0;
pub const SMBHSTCNT: u16 = 2;
pub const SMBHSTCMD: u16 = 3;
pub const SMBHSTADD: u16 = 4;
pub const SMBHSTDAT0: u16 = 5;
pub const SMBHSTDAT1: u16 = 6;
pub const SMBBLKDAT: u16 = 7;
pub const SMBPEC: u16 = 8;
pub const SMBAUXSTS: u16 = 12;
pub const SMBAUXCTL: u16 = 13;

pub const SMBHSTSTS_BYTE_DONE: u8 = 0x80;
pub const SMBHSTSTS_INUSE_STS: u8 = 0x40;
pub const SMBHSTSTS_SMBALERT_STS: u8 = 0x20;
pub const SMBHSTSTS_FAILED: u8 = 0x10;
pub const SMBHSTSTS_BUS_ERR: u8 = 0x08;
pub const SMBHSTSTS_DEV_ERR: u8 = 0x04;
pub const SMBHSTSTS_INTR: u8 = 0x02;
pub const SMBHSTSTS_HOST_BUSY: u8 = 0x01;

pub const STATUS_ERROR_FLAGS: u8 = SMBHSTSTS_FAILED | SMBHSTSTS_BUS_ERR | SMBHSTSTS_DEV_ERR;
pub const STATUS_FLAGS: u8 = SMBHSTSTS_BYTE_DONE | SMBHSTSTS_INTR | STATUS_ERROR_FLAGS;

pub const SMBHSTCNT_QUICK: u8 = 0x00;
pub const SMBHSTCNT_INTREN: u8 = 0x01;
pub const SMBHSTCNT_KILL: u8 = 0x02;
pub const SMBHSTCNT_BYTE: u8 = 0x04;
pub const SMBHSTCNT_BYTE_DATA: u8 = 0x08;
pub const SMBHSTCNT_WORD_DATA: u8 = 0x0C;
pub const SMBHSTCNT_PROC_CALL: u8 = 0x10;
pub const SMBHSTCNT_BLOCK_DATA: u8 = 0x14;
pub const SMBHSTCNT_I2C_BLOCK_DATA: u8 = 0x18;
pub const SMBHSTCNT_LAST_BYTE: u8 = 0x20;
pub const SMBHSTCNT_START: u8 = 0x40;
pub const SMBHSTCNT_PEC_EN: u8 = 0x80;

pub const SMBAUXCTL_CRC: u8 = 0x01;
pub const SMBAUXCTL_E32B: u8 = 0x02;

pub const I2C_WRITE: u8 = 0;
pub const I2C_READ: u8 = 1;
