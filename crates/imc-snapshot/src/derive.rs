//! Thin re-export layer so [`crate::model::Info`] can call the turnaround
//! formulas without every call site spelling out `imc_platform::turnaround`.

use imc_decode::DdrType;
use imc_platform::regmap::ChannelTimings;
use imc_platform::turnaround::{self, WriteToReadTurnaround};

pub fn write_to_read(t: &ChannelTimings, ddr_type: DdrType) -> WriteToReadTurnaround {
    turnaround::write_to_read_turnaround(t, ddr_type)
}

pub fn write_recovery(t: &ChannelTimings, ddr_type: DdrType) -> Option<u32> {
    turnaround::write_recovery(t, ddr_type)
}

pub fn read_to_precharge(t: &ChannelTimings) -> u32 {
    turnaround::read_to_precharge(t)
}
