//! Read-only subset of the PCODE/MRC and OC/VR mailbox command catalogue,
//! grounded on `original_source/msrbox.py` and `original_source/biosbox.py`.
//! Every `SET_*`/write command in those sources is omitted: the core never
//! writes voltages, multipliers or timings (spec §1 non-goals).

/// PCODE "BIOS mailbox" commands (13-bit Param2 layout).
pub mod bios {
    pub const MRC_CONFIG: u8 = 0x06;
    pub const MRC_CONFIG_VCCIO_SUBCMD: u8 = 0x01;

    pub const BCLK_CONFIG: u8 = 0x3F;
    pub const BCLK_CONFIG_DEFAULT_SUBCMD: u8 = 0x00;
    pub const BCLK_CONFIG_SOC_SUBCMD: u8 = 0x01;
    pub const BCLK_CONFIG_CPU_SUBCMD: u8 = 0x02;

    pub const DDR_CAPABILITIES: u8 = 0x03;
}

/// OC mailbox commands (8-bit Param2 layout).
pub mod oc {
    pub const GET_OC_CAPABILITIES: u8 = 0x01;
    pub const GET_DDR_CAPABILITIES: u8 = 0x03;
    pub const GET_VR_TOPOLOGY: u8 = 0x04;
    pub const GET_SVID_PARAMETERS: u8 = 0x05;
    pub const GET_ICCMAX: u8 = 0x16;
    pub const GET_VR_VOLTAGE_LIMIT: u8 = 0x17;
    pub const GET_LOADLINE: u8 = 0x18;
    pub const GET_VF_POINT: u8 = 0x19;

    /// Domain ids used as Param1 for the per-domain reads above (VR
    /// topology, IccMax, load-line, V/F curve).
    pub const DOMAIN_ID_IA_CORE: u8 = 0;
    pub const DOMAIN_ID_GT: u8 = 1;
    pub const DOMAIN_ID_RING: u8 = 2;
    pub const DOMAIN_ID_SYSTEM_AGENT: u8 = 4;
    pub const DOMAIN_ID_MEMORY_CONTROLLER: u8 = 6;
}

/// MSRs read directly (no command word, just `msr_read`) that the spec
/// groups with the mailbox section because they report the same kind of
/// VR/power telemetry.
pub mod msr {
    pub const PL4_CURRENT_CONFIG: u32 = 0x601;
    pub const DDR_RAPL: u32 = 0x618;
    pub const PLATFORM_INFO: u32 = 0xCE;
    pub const IA32_PERF_STATUS: u32 = 0x198;

    /// PCODE-over-MSR mailbox: interface (command) word, data word.
    pub const PCODE_MAILBOX_INTERFACE: u32 = 0x607;
    pub const PCODE_MAILBOX_DATA: u32 = 0x608;

    /// OC mailbox: single MSR carrying `{data[31:0], cmd[63:32]}`.
    pub const OC_MAILBOX: u32 = 0x150;
}

/// MCHBAR offsets of the PCODE/MRC mailbox MMIO pair.
pub mod mchbar {
    pub const MAILBOX_DATA: u32 = 0x5DA0;
    pub const MAILBOX_INTERFACE: u32 = 0x5DA4;
}
