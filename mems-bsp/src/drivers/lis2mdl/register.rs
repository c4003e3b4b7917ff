use bitfield_struct::bitfield;

use crate::bus::registers;

pub const ID: u8 = 0x40;

/// CFG_REG_C value for SPI 4-wire: 4wspi | bdu | i2c_dis
pub const CFG_C_SPI_4WIRES: u8 = 0x34;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Reg {
    WhoAmI = 0x4F,
    CfgA = 0x60,
    CfgB = 0x61,
    CfgC = 0x62,
    Status = 0x67,
    OutxL = 0x68,
    TempOutL = 0x6E,
}

/// CFG_REG_A (0x60)
#[bitfield(u8)]
pub struct CfgA {
    #[bits(2)]
    pub md: u8,
    #[bits(2)]
    pub odr: u8,
    pub lp: bool,
    pub soft_rst: bool,
    pub reboot: bool,
    pub comp_temp_en: bool,
}

/// CFG_REG_B (0x61)
#[bitfield(u8)]
pub struct CfgB {
    pub lpf: bool,
    #[bits(2)]
    pub set_rst: u8,
    pub int_on_dataoff: bool,
    pub off_canc_one_shot: bool,
    #[bits(3)]
    __0: u8,
}

/// CFG_REG_C (0x62)
#[bitfield(u8)]
pub struct CfgC {
    pub drdy_on_pin: bool,
    pub self_test: bool,
    pub spi_4wire: bool,
    pub ble: bool,
    pub bdu: bool,
    pub i2c_dis: bool,
    pub int_on_pin: bool,
    #[bits(1)]
    __0: u8,
}

/// STATUS_REG (0x67)
#[bitfield(u8)]
pub struct Status {
    pub xda: bool,
    pub yda: bool,
    pub zda: bool,
    pub zyxda: bool,
    pub xor: bool,
    pub yor: bool,
    pub zor: bool,
    pub zyxor: bool,
}

registers! {
    CfgA => Reg::CfgA,
    CfgB => Reg::CfgB,
    CfgC => Reg::CfgC,
    Status => Reg::Status,
}

/// CFG_REG_A.md
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Mode {
    Continuous = 0,
    Single = 1,
    PowerDown = 2,
}

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Odr {
    Hz10 = 0,
    Hz20 = 1,
    Hz50 = 2,
    Hz100 = 3,
}

impl Odr {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Odr::Hz10,
            1 => Odr::Hz20,
            2 => Odr::Hz50,
            _ => Odr::Hz100,
        }
    }

    pub fn hz(self) -> f32 {
        match self {
            Odr::Hz10 => 10.0,
            Odr::Hz20 => 20.0,
            Odr::Hz50 => 50.0,
            Odr::Hz100 => 100.0,
        }
    }
}
