//! Device-control-code encoding and the fixed little-endian wire records
//! exchanged with the ring-0 helper (spec §4.1/§6). Every record here is a
//! plain byte layout, not a `#[repr(C)]` struct, so the shape is exact
//! regardless of target struct-layout rules.

pub const FILE_ANY_ACCESS: u32 = 0;
pub const METHOD_BUFFERED: u32 = 0;

/// Device type id used by the helper's `\\.\<driver-name>` device object.
pub const DEVICE_TYPE: u32 = 0x9C40;

/// `CTL_CODE(DeviceType, Function, Method, Access)`, the standard Win32
/// device-control-code macro.
pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

macro_rules! func_codes {
    ($($name:ident = $val:expr;)*) => {
        $(pub const $name: u32 = ctl_code(DEVICE_TYPE, $val, METHOD_BUFFERED, FILE_ANY_ACCESS);)*
    };
}

func_codes! {
    FUNC_PORT_READ        = 0x800;
    FUNC_PORT_WRITE       = 0x801;
    FUNC_PCI_CFG_READ     = 0x802;
    FUNC_PCI_CFG_WRITE    = 0x803;
    FUNC_MSR_READ         = 0x804;
    FUNC_MSR_WRITE        = 0x805;
    FUNC_PHYMEM_READ      = 0x806;
    FUNC_PHYMEM_PC_READ64 = 0x807;
    FUNC_PHYMEM_PC_WRITE32= 0x808;
    FUNC_PHYMEM_MAP       = 0x809;
    FUNC_PHYMEM_UNMAP     = 0x80A;
    FUNC_SMBUS_READ_BYTE  = 0x80B;
    FUNC_SMBUS_WRITE_BYTE = 0x80C;
    FUNC_SMBUS_PROC_CALL  = 0x80D;
}

/// Every output record shares this trailer: a zero status means success,
/// anything else is one of the sentinel failures of `error::classify`.
pub const OUT_STATUS_OFFSET_TAIL: usize = 4;

fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}
fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}
fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}
fn get_u64(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

/// `port_read(port, size) -> integer`
pub fn encode_port_read(port: u16, size: u8) -> Vec<u8> {
    let mut b = Vec::with_capacity(4);
    put_u16(&mut b, port);
    put_u8(&mut b, size);
    put_u8(&mut b, 0);
    b
}

pub struct PortReadOut {
    pub value: u32,
    pub status: u32,
}
pub fn decode_port_read_out(buf: &[u8]) -> PortReadOut {
    PortReadOut {
        value: get_u32(buf, 0),
        status: get_u32(buf, 4),
    }
}

/// `port_write(port, size, value) -> success`
pub fn encode_port_write(port: u16, size: u8, value: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(8);
    put_u16(&mut b, port);
    put_u8(&mut b, size);
    put_u8(&mut b, 0);
    put_u32(&mut b, value);
    b
}
pub fn decode_status_out(buf: &[u8]) -> u32 {
    get_u32(buf, 0)
}

/// `pci_cfg_read(bus, dev, fun, offset, size) -> bytes`
pub fn encode_pci_cfg_read(bus: u8, dev: u8, fun: u8, offset: u16, size: u8) -> Vec<u8> {
    let mut b = Vec::with_capacity(8);
    put_u8(&mut b, bus);
    put_u8(&mut b, dev);
    put_u8(&mut b, fun);
    put_u8(&mut b, size);
    put_u16(&mut b, offset);
    put_u16(&mut b, 0);
    b
}
pub struct PciReadOut {
    pub value: u32,
    pub status: u32,
}
pub fn decode_pci_read_out(buf: &[u8]) -> PciReadOut {
    PciReadOut {
        value: get_u32(buf, 0),
        status: get_u32(buf, 4),
    }
}

/// `pci_cfg_write(bus, dev, fun, offset, data) -> success`
pub fn encode_pci_cfg_write(bus: u8, dev: u8, fun: u8, offset: u16, size: u8, data: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(12);
    put_u8(&mut b, bus);
    put_u8(&mut b, dev);
    put_u8(&mut b, fun);
    put_u8(&mut b, size);
    put_u16(&mut b, offset);
    put_u16(&mut b, 0);
    put_u32(&mut b, data);
    b
}

/// `msr_read(reg) -> (hi, lo)`
pub fn encode_msr_read(reg: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(4);
    put_u32(&mut b, reg);
    b
}
pub struct MsrReadOut {
    pub lo: u32,
    pub hi: u32,
    pub status: u32,
}
pub fn decode_msr_read_out(buf: &[u8]) -> MsrReadOut {
    MsrReadOut {
        lo: get_u32(buf, 0),
        hi: get_u32(buf, 4),
        status: get_u32(buf, 8),
    }
}

/// `msr_write(reg, hi, lo) -> success`
pub fn encode_msr_write(reg: u32, hi: u32, lo: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(12);
    put_u32(&mut b, reg);
    put_u32(&mut b, hi);
    put_u32(&mut b, lo);
    b
}

/// `phymem_read(addr, size) -> bytes`
pub fn encode_phymem_read(addr: u64, size: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(12);
    put_u64(&mut b, addr);
    put_u32(&mut b, size);
    b
}
pub fn decode_phymem_read_status(buf: &[u8], payload_len: usize) -> (Vec<u8>, u32) {
    let status = get_u32(buf, payload_len);
    (buf[..payload_len].to_vec(), status)
}

/// `phymem_pc_read64(bus, dev, fun, base_cfg_offset, addr_mask, addr_offset) -> u64`
pub fn encode_phymem_pc_read64(
    bus: u8,
    dev: u8,
    fun: u8,
    base_cfg_offset: u16,
    addr_mask: u64,
    addr_offset: u64,
) -> Vec<u8> {
    let mut b = Vec::with_capacity(24);
    put_u8(&mut b, bus);
    put_u8(&mut b, dev);
    put_u8(&mut b, fun);
    put_u8(&mut b, 0);
    put_u16(&mut b, base_cfg_offset);
    put_u16(&mut b, 0);
    put_u64(&mut b, addr_mask);
    put_u64(&mut b, addr_offset);
    b
}
pub struct Phymem64Out {
    pub value: u64,
    pub status: u32,
}
pub fn decode_phymem_pc_read64_out(buf: &[u8]) -> Phymem64Out {
    Phymem64Out {
        value: get_u64(buf, 0),
        status: get_u32(buf, 8),
    }
}

/// `phymem_map(addr, size) -> virt_addr`
pub fn encode_phymem_map(addr: u64, size: u32) -> Vec<u8> {
    let mut b = Vec::with_capacity(12);
    put_u64(&mut b, addr);
    put_u32(&mut b, size);
    b
}
pub struct PhymemMapOut {
    pub virt_addr: u64,
    pub status: u32,
}
pub fn decode_phymem_map_out(buf: &[u8]) -> PhymemMapOut {
    PhymemMapOut {
        virt_addr: get_u64(buf, 0),
        status: get_u32(buf, 8),
    }
}

/// `phymem_unmap(addr, size)`
pub fn encode_phymem_unmap(addr: u64, size: u32) -> Vec<u8> {
    encode_phymem_map(addr, size)
}

/// `smbus_read_byte(port, dev, cmd) -> u8` (driver "smart" Method A, §4.4)
pub fn encode_smbus_read_byte(port: u16, dev: u8, cmd: u8) -> Vec<u8> {
    let mut b = Vec::with_capacity(4);
    put_u16(&mut b, port);
    put_u8(&mut b, dev);
    put_u8(&mut b, cmd);
    b
}
pub struct SmbusByteOut {
    pub value: u8,
    pub status: u32,
}
pub fn decode_smbus_byte_out(buf: &[u8]) -> SmbusByteOut {
    SmbusByteOut {
        value: buf[0],
        status: get_u32(buf, 4),
    }
}

/// `smbus_write_byte(port, dev, cmd, value) -> success`
pub fn encode_smbus_write_byte(port: u16, dev: u8, cmd: u8, value: u8) -> Vec<u8> {
    let mut b = Vec::with_capacity(5);
    put_u16(&mut b, port);
    put_u8(&mut b, dev);
    put_u8(&mut b, cmd);
    put_u8(&mut b, value);
    b
}

/// `smbus_proc_call(port, dev, cmd, value) -> u16`
pub fn encode_smbus_proc_call(port: u16, dev: u8, cmd: u8, value: u16) -> Vec<u8> {
    let mut b = Vec::with_capacity(6);
    put_u16(&mut b, port);
    put_u8(&mut b, dev);
    put_u8(&mut b, cmd);
    put_u16(&mut b, value);
    b
}
pub struct SmbusWordOut {
    pub value: u16,
    pub status: u32,
}
pub fn decode_smbus_word_out(buf: &[u8]) -> SmbusWordOut {
    SmbusWordOut {
        value: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
        status: get_u32(buf, 4),
    }
}
