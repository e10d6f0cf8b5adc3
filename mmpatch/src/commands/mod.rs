//! Command implementations for the mmpatch CLI

pub mod apply;
pub mod crc;
