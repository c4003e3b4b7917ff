use bitfield_struct::bitfield;

use crate::bus::registers;

pub const ID: u8 = 0xB4;

/// IF_CTRL value switching the interface to SPI 3-wire (sim)
pub const IF_CTRL_SPI_3WIRES: u8 = 0x20;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Reg {
    IfCtrl = 0x0E,
    WhoAmI = 0x0F,
    Ctrl1 = 0x10,
    Ctrl2 = 0x11,
    Ctrl3 = 0x12,
    Ctrl4 = 0x13,
    I3cIfCtrl = 0x19,
    Status = 0x27,
    PressOutXl = 0x28,
    TempOutL = 0x2B,
}

/// IF_CTRL (0x0E)
#[bitfield(u8)]
pub struct IfCtrl {
    #[bits(1)]
    __0: u8,
    pub cs_pu_dis: bool,
    pub int_pd_dis: bool,
    pub sdo_pu_en: bool,
    pub sda_pu_en: bool,
    pub sim: bool,
    pub i2c_i3c_dis: bool,
    pub int_en_i3c: bool,
}

/// CTRL_REG1 (0x10)
#[bitfield(u8)]
pub struct Ctrl1 {
    #[bits(3)]
    pub avg: u8,
    #[bits(4)]
    pub odr: u8,
    #[bits(1)]
    __0: u8,
}

/// CTRL_REG2 (0x11)
#[bitfield(u8)]
pub struct Ctrl2 {
    pub oneshot: bool,
    #[bits(1)]
    __0: u8,
    pub swreset: bool,
    pub bdu: bool,
    pub en_lpfp: bool,
    pub lfpf_cfg: bool,
    #[bits(1)]
    __1: u8,
    pub boot: bool,
}

/// CTRL_REG3 (0x12)
#[bitfield(u8)]
pub struct Ctrl3 {
    pub if_add_inc: bool,
    pub pp_od: bool,
    #[bits(1)]
    __0: u8,
    pub int_h_l: bool,
    #[bits(4)]
    __1: u8,
}

/// CTRL_REG4 (0x13)
#[bitfield(u8)]
pub struct Ctrl4 {
    pub int_f_ovr: bool,
    pub int_f_wtm: bool,
    pub int_f_full: bool,
    #[bits(1)]
    __0: u8,
    pub int_en: bool,
    pub drdy: bool,
    pub drdy_pls: bool,
    #[bits(1)]
    __1: u8,
}

/// I3C_IF_CTRL (0x19)
#[bitfield(u8)]
pub struct I3cIfCtrl {
    #[bits(2)]
    pub i3c_bus_avb_sel: u8,
    #[bits(3)]
    __0: u8,
    pub asf_on: bool,
    #[bits(2)]
    __1: u8,
}

/// STATUS (0x27)
#[bitfield(u8)]
pub struct Status {
    pub p_da: bool,
    pub t_da: bool,
    #[bits(2)]
    __0: u8,
    pub p_or: bool,
    pub t_or: bool,
    #[bits(2)]
    __1: u8,
}

registers! {
    IfCtrl => Reg::IfCtrl,
    Ctrl1 => Reg::Ctrl1,
    Ctrl2 => Reg::Ctrl2,
    Ctrl3 => Reg::Ctrl3,
    Ctrl4 => Reg::Ctrl4,
    I3cIfCtrl => Reg::I3cIfCtrl,
    Status => Reg::Status,
}

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Odr {
    /// Powered down until a software trigger
    OneShot = 0,
    Hz1 = 1,
    Hz4 = 2,
    Hz10 = 3,
    Hz25 = 4,
    Hz50 = 5,
    Hz75 = 6,
    Hz100 = 7,
    Hz200 = 8,
}

impl Odr {
    /// Unknown codes read as one-shot
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Odr::OneShot,
            1 => Odr::Hz1,
            2 => Odr::Hz4,
            3 => Odr::Hz10,
            4 => Odr::Hz25,
            5 => Odr::Hz50,
            6 => Odr::Hz75,
            7 => Odr::Hz100,
            8 => Odr::Hz200,
            _ => Odr::OneShot,
        }
    }

    pub fn hz(self) -> f32 {
        match self {
            Odr::OneShot => 0.0,
            Odr::Hz1 => 1.0,
            Odr::Hz4 => 4.0,
            Odr::Hz10 => 10.0,
            Odr::Hz25 => 25.0,
            Odr::Hz50 => 50.0,
            Odr::Hz75 => 75.0,
            Odr::Hz100 => 100.0,
            Odr::Hz200 => 200.0,
        }
    }
}

/// Number of internal samples averaged per output, coded 0..=7 for 4..=512
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Avg {
    Avg4 = 0,
    Avg8 = 1,
    Avg16 = 2,
    Avg32 = 3,
    Avg64 = 4,
    Avg128 = 5,
    Avg256 = 6,
    Avg512 = 7,
}

impl Avg {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Avg::Avg4,
            1 => Avg::Avg8,
            2 => Avg::Avg16,
            3 => Avg::Avg32,
            4 => Avg::Avg64,
            5 => Avg::Avg128,
            6 => Avg::Avg256,
            _ => Avg::Avg512,
        }
    }
}

/// Low-pass filter: bit 0 enables it, bit 1 picks the ODR/9 bandwidth
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Lpf {
    Disabled = 0,
    OdrDiv4 = 1,
    OdrDiv9 = 3,
}

impl Lpf {
    pub fn from_bits(en_lpfp: bool, lfpf_cfg: bool) -> Self {
        match (en_lpfp, lfpf_cfg) {
            (false, _) => Lpf::Disabled,
            (true, false) => Lpf::OdrDiv4,
            (true, true) => Lpf::OdrDiv9,
        }
    }
}

/// Conversion settings spread across CTRL_REG1 and CTRL_REG2
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Md {
    pub odr: Odr,
    pub avg: Avg,
    pub lpf: Lpf,
}
