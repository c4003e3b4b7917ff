use bitfield_struct::bitfield;

use crate::bus::registers;

pub const ID: u8 = 0x44;

/// SPI 3-wire enable value for CTRL2 (sim | if_add_inc)
pub const CTRL2_SPI_3WIRES: u8 = 0x05;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Reg {
    WhoAmI = 0x0F,
    Ctrl1 = 0x20,
    Ctrl2 = 0x21,
    Ctrl3 = 0x22,
    Ctrl6 = 0x25,
    Status = 0x27,
    OutXL = 0x28,
    FifoCtrl = 0x2E,
}

/// CTRL1 (0x20): ODR, mode and low-power mode selection
#[bitfield(u8)]
pub struct Ctrl1 {
    #[bits(2)]
    pub lp_mode: u8,
    #[bits(2)]
    pub mode: u8,
    #[bits(4)]
    pub odr: u8,
}

/// CTRL2 (0x21)
#[bitfield(u8)]
pub struct Ctrl2 {
    pub sim: bool,
    pub i2c_disable: bool,
    pub if_add_inc: bool,
    pub bdu: bool,
    pub cs_pu_disc: bool,
    #[bits(1)]
    __0: u8,
    pub soft_reset: bool,
    pub boot: bool,
}

/// CTRL3 (0x22)
#[bitfield(u8)]
pub struct Ctrl3 {
    #[bits(2)]
    pub slp_mode: u8,
    #[bits(1)]
    __0: u8,
    pub h_lactive: bool,
    pub lir: bool,
    pub pp_od: bool,
    #[bits(2)]
    pub st: u8,
}

/// CTRL6 (0x25)
#[bitfield(u8)]
pub struct Ctrl6 {
    #[bits(2)]
    __0: u8,
    pub low_noise: bool,
    pub fds: bool,
    #[bits(2)]
    pub fs: u8,
    #[bits(2)]
    pub bw_filt: u8,
}

/// STATUS (0x27)
#[bitfield(u8)]
pub struct Status {
    pub drdy: bool,
    pub ff_ia: bool,
    pub d6d_ia: bool,
    pub single_tap: bool,
    pub double_tap: bool,
    pub sleep_state: bool,
    pub wu_ia: bool,
    pub fifo_ths: bool,
}

/// FIFO_CTRL (0x2E)
#[bitfield(u8)]
pub struct FifoCtrl {
    #[bits(5)]
    pub fth: u8,
    #[bits(3)]
    pub fmode: u8,
}

registers! {
    Ctrl1 => Reg::Ctrl1,
    Ctrl2 => Reg::Ctrl2,
    Ctrl3 => Reg::Ctrl3,
    Ctrl6 => Reg::Ctrl6,
    Status => Reg::Status,
    FifoCtrl => Reg::FifoCtrl,
}

/// Output data rate codes. Bits [5:4] select the trigger source and land in CTRL3.slp_mode.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Odr {
    Off = 0x00,
    Hz1_6LpOnly = 0x01,
    Hz12_5 = 0x02,
    Hz25 = 0x03,
    Hz50 = 0x04,
    Hz100 = 0x05,
    Hz200 = 0x06,
    Hz400 = 0x07,
    Hz800 = 0x08,
    Hz1600 = 0x09,
    SwTrigger = 0x32,
    PinTrigger = 0x12,
}

impl Odr {
    /// Decode CTRL1.odr with CTRL3.slp_mode; unknown codes read as off
    pub fn from_bits(odr: u8, slp_mode: u8) -> Self {
        match (slp_mode << 4) | odr {
            0x00 => Odr::Off,
            0x01 => Odr::Hz1_6LpOnly,
            0x02 => Odr::Hz12_5,
            0x03 => Odr::Hz25,
            0x04 => Odr::Hz50,
            0x05 => Odr::Hz100,
            0x06 => Odr::Hz200,
            0x07 => Odr::Hz400,
            0x08 => Odr::Hz800,
            0x09 => Odr::Hz1600,
            0x32 => Odr::SwTrigger,
            0x12 => Odr::PinTrigger,
            _ => Odr::Off,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Fs {
    G2 = 0,
    G4 = 1,
    G8 = 2,
    G16 = 3,
}

impl Fs {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Fs::G2,
            1 => Fs::G4,
            2 => Fs::G8,
            _ => Fs::G16,
        }
    }
}

/// Power mode code: `low_noise << 4 | mode << 2 | lp_mode`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PowerMode(pub u8);

impl PowerMode {
    pub const HIGH_PERFORMANCE: Self = PowerMode(0x04);
    pub const HIGH_PERFORMANCE_LOW_NOISE: Self = PowerMode(0x14);
    pub const CONT_LOW_PWR_4: Self = PowerMode(0x03);
    pub const CONT_LOW_PWR_3: Self = PowerMode(0x02);
    pub const CONT_LOW_PWR_2: Self = PowerMode(0x01);
    pub const CONT_LOW_PWR_12BIT: Self = PowerMode(0x00);
    pub const SINGLE_LOW_PWR_4: Self = PowerMode(0x0B);
    pub const SINGLE_LOW_PWR_3: Self = PowerMode(0x0A);
    pub const SINGLE_LOW_PWR_2: Self = PowerMode(0x09);
    pub const SINGLE_LOW_PWR_12BIT: Self = PowerMode(0x08);
    pub const CONT_LOW_PWR_LOW_NOISE_4: Self = PowerMode(0x13);
    pub const CONT_LOW_PWR_LOW_NOISE_3: Self = PowerMode(0x12);
    pub const CONT_LOW_PWR_LOW_NOISE_2: Self = PowerMode(0x11);
    pub const CONT_LOW_PWR_LOW_NOISE_12BIT: Self = PowerMode(0x10);
    pub const SINGLE_LOW_PWR_LOW_NOISE_4: Self = PowerMode(0x1B);
    pub const SINGLE_LOW_PWR_LOW_NOISE_3: Self = PowerMode(0x1A);
    pub const SINGLE_LOW_PWR_LOW_NOISE_2: Self = PowerMode(0x19);
    pub const SINGLE_LOW_PWR_LOW_NOISE_12BIT: Self = PowerMode(0x18);

    pub fn mode(self) -> u8 {
        (self.0 & 0x0C) >> 2
    }

    pub fn lp_mode(self) -> u8 {
        self.0 & 0x03
    }

    pub fn low_noise(self) -> bool {
        self.0 & 0x10 != 0
    }

    /// 12-bit output: low-power mode 1, continuous or single, with or without low noise
    pub fn is_12bit(self) -> bool {
        self.mode() != 0x01 && self.lp_mode() == 0x00
    }

    pub fn is_high_performance(self) -> bool {
        self.mode() == 0x01
    }
}

/// FIFO operating modes (FIFO_CTRL.fmode)
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FifoMode {
    Bypass = 0,
    Fifo = 1,
    StreamToFifo = 3,
    BypassToStream = 4,
    Stream = 6,
}
