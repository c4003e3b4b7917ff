use bitfield_struct::bitfield;

use crate::bus::registers;

pub const ID: u8 = 0x6C;

/// CTRL3_C value switching the interface to SPI 3-wire (sim | if_inc)
pub const CTRL3_C_SPI_3WIRES: u8 = 0x0C;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Reg {
    FifoCtrl4 = 0x0A,
    WhoAmI = 0x0F,
    Ctrl1Xl = 0x10,
    Ctrl2G = 0x11,
    Ctrl3C = 0x12,
    Ctrl5C = 0x14,
    Ctrl6C = 0x15,
    Ctrl7G = 0x16,
    Ctrl9Xl = 0x18,
    Status = 0x1E,
    OutTempL = 0x20,
    OutxLG = 0x22,
    OutxLA = 0x28,
}

/// FIFO_CTRL4 (0x0A)
#[bitfield(u8)]
pub struct FifoCtrl4 {
    #[bits(3)]
    pub fifo_mode: u8,
    #[bits(1)]
    __0: u8,
    #[bits(2)]
    pub odr_t_batch: u8,
    #[bits(2)]
    pub odr_ts_batch: u8,
}

/// CTRL1_XL (0x10)
#[bitfield(u8)]
pub struct Ctrl1Xl {
    #[bits(1)]
    __0: u8,
    pub lpf2_xl_en: bool,
    #[bits(2)]
    pub fs_xl: u8,
    #[bits(4)]
    pub odr_xl: u8,
}

/// CTRL2_G (0x11); `fs_g` includes the 125 dps bit
#[bitfield(u8)]
pub struct Ctrl2G {
    #[bits(1)]
    __0: u8,
    #[bits(3)]
    pub fs_g: u8,
    #[bits(4)]
    pub odr_g: u8,
}

/// CTRL3_C (0x12)
#[bitfield(u8)]
pub struct Ctrl3C {
    pub sw_reset: bool,
    #[bits(1)]
    __0: u8,
    pub if_inc: bool,
    pub sim: bool,
    pub pp_od: bool,
    pub h_lactive: bool,
    pub bdu: bool,
    pub boot: bool,
}

/// CTRL5_C (0x14)
#[bitfield(u8)]
pub struct Ctrl5C {
    #[bits(2)]
    pub st_xl: u8,
    #[bits(2)]
    pub st_g: u8,
    #[bits(1)]
    __0: u8,
    #[bits(2)]
    pub rounding: u8,
    pub xl_ulp_en: bool,
}

/// CTRL6_C (0x15)
#[bitfield(u8)]
pub struct Ctrl6C {
    #[bits(3)]
    pub ftype: u8,
    pub usr_off_w: bool,
    pub xl_hm_mode: bool,
    #[bits(3)]
    pub trig_en: u8,
}

/// CTRL7_G (0x16)
#[bitfield(u8)]
pub struct Ctrl7G {
    pub ois_on: bool,
    pub usr_off_on_out: bool,
    pub ois_on_en: bool,
    #[bits(1)]
    __0: u8,
    #[bits(2)]
    pub hpm_g: u8,
    pub hp_en_g: bool,
    pub g_hm_mode: bool,
}

/// CTRL9_XL (0x18)
#[bitfield(u8)]
pub struct Ctrl9Xl {
    #[bits(1)]
    __0: u8,
    pub i3c_disable: bool,
    pub den_lh: bool,
    pub den_xl_g: bool,
    pub den_xl_en: bool,
    pub den_z: bool,
    pub den_y: bool,
    pub den_x: bool,
}

/// STATUS_REG (0x1E)
#[bitfield(u8)]
pub struct Status {
    pub xlda: bool,
    pub gda: bool,
    pub tda: bool,
    #[bits(5)]
    __0: u8,
}

registers! {
    FifoCtrl4 => Reg::FifoCtrl4,
    Ctrl1Xl => Reg::Ctrl1Xl,
    Ctrl2G => Reg::Ctrl2G,
    Ctrl3C => Reg::Ctrl3C,
    Ctrl5C => Reg::Ctrl5C,
    Ctrl6C => Reg::Ctrl6C,
    Ctrl7G => Reg::Ctrl7G,
    Ctrl9Xl => Reg::Ctrl9Xl,
    Status => Reg::Status,
}

/// Output data rate codes shared by accelerometer and gyroscope; 1.6 Hz is accelerometer only
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Odr {
    Off = 0,
    Hz12_5 = 1,
    Hz26 = 2,
    Hz52 = 3,
    Hz104 = 4,
    Hz208 = 5,
    Hz417 = 6,
    Hz833 = 7,
    Hz1667 = 8,
    Hz3333 = 9,
    Hz6667 = 10,
    Hz1_6 = 11,
}

impl Odr {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => Odr::Off,
            1 => Odr::Hz12_5,
            2 => Odr::Hz26,
            3 => Odr::Hz52,
            4 => Odr::Hz104,
            5 => Odr::Hz208,
            6 => Odr::Hz417,
            7 => Odr::Hz833,
            8 => Odr::Hz1667,
            9 => Odr::Hz3333,
            10 => Odr::Hz6667,
            11 => Odr::Hz1_6,
            _ => return None,
        })
    }

    pub fn hz(self) -> f32 {
        match self {
            Odr::Off => 0.0,
            Odr::Hz1_6 => 1.6,
            Odr::Hz12_5 => 12.5,
            Odr::Hz26 => 26.0,
            Odr::Hz52 => 52.0,
            Odr::Hz104 => 104.0,
            Odr::Hz208 => 208.0,
            Odr::Hz417 => 417.0,
            Odr::Hz833 => 833.0,
            Odr::Hz1667 => 1667.0,
            Odr::Hz3333 => 3333.0,
            Odr::Hz6667 => 6667.0,
        }
    }
}

/// Accelerometer full scale; the encoding is not monotonic
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FsXl {
    G2 = 0,
    G16 = 1,
    G4 = 2,
    G8 = 3,
}

impl FsXl {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => FsXl::G2,
            1 => FsXl::G16,
            2 => FsXl::G4,
            _ => FsXl::G8,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FsG {
    Dps250 = 0,
    Dps125 = 1,
    Dps500 = 2,
    Dps1000 = 4,
    Dps2000 = 6,
}

impl FsG {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => FsG::Dps250,
            1 => FsG::Dps125,
            2 => FsG::Dps500,
            4 => FsG::Dps1000,
            6 => FsG::Dps2000,
            _ => return None,
        })
    }
}

/// FIFO_CTRL4.fifo_mode values
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FifoMode {
    Bypass = 0,
    Fifo = 1,
    StreamToFifo = 3,
    BypassToStream = 4,
    Stream = 6,
    BypassToFifo = 7,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl2_g_packs_125dps_bit() {
        let reg = Ctrl2G::new().with_fs_g(FsG::Dps125 as u8).with_odr_g(Odr::Hz104 as u8);
        assert_eq!(u8::from(reg), 0x42);
        let reg = Ctrl2G::new().with_fs_g(FsG::Dps2000 as u8);
        assert_eq!(u8::from(reg), 0x0C);
    }

    #[test]
    fn test_odr_codes() {
        assert_eq!(Odr::from_bits(11), Some(Odr::Hz1_6));
        assert_eq!(Odr::from_bits(12), None);
        assert_eq!(Odr::Hz417.hz(), 417.0);
    }
}
