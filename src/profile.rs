use std::convert::TryFrom;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const MAX_WIDTH: u8 = 40;
pub const MAX_HEIGHT: u8 = 4;
pub const MAX_CELL_WIDTH: u8 = 5;
pub const MAX_CELL_HEIGHT: u8 = 8;

c_like_enum! {
  ModuleType {
    Lcd = 0,    // Plain LCD
    Lkd = 1,    // LCD with keypad
    Vfd = 2,    // Plain vacuum fluorescent
    Vkd = 3,    // Vacuum fluorescent with keypad
  }
}

/// Hardware features which vary between module types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Backlight on/off, contrast and background color.
    pub backlight: bool,
    /// Brightness is a 0-3 level (VFD) rather than 0-255 (LCD).
    pub vfd_brightness: bool,
    /// Keypad backlight, brightness, debounce, auto-repeat and auto-tx.
    pub keypad: bool,
    /// Six addressable general purpose outputs instead of one.
    pub multi_output: bool,
}

const LCD_CAPS: Capabilities = Capabilities {
    backlight: true,
    vfd_brightness: false,
    keypad: false,
    multi_output: false,
};
const LKD_CAPS: Capabilities = Capabilities {
    backlight: true,
    vfd_brightness: false,
    keypad: true,
    multi_output: true,
};
const VFD_CAPS: Capabilities = Capabilities {
    backlight: false,
    vfd_brightness: true,
    keypad: false,
    multi_output: false,
};
const VKD_CAPS: Capabilities = Capabilities {
    backlight: false,
    vfd_brightness: true,
    keypad: true,
    multi_output: true,
};

impl ModuleType {
    pub fn capabilities(self) -> Capabilities {
        match self {
            ModuleType::Lcd => LCD_CAPS,
            ModuleType::Lkd => LKD_CAPS,
            ModuleType::Vfd => VFD_CAPS,
            ModuleType::Vkd => VKD_CAPS,
        }
    }
}

impl TryFrom<u8> for ModuleType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        ModuleType::from_u8(code).ok_or(Error::InvalidModule(code))
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lcd" => Ok(ModuleType::Lcd),
            "lkd" => Ok(ModuleType::Lkd),
            "vfd" => Ok(ModuleType::Vfd),
            "vkd" => Ok(ModuleType::Vkd),
            _ => Err(format!("unknown module type '{}' (lcd, lkd, vfd, vkd)", s)),
        }
    }
}

/// Line speeds the modules accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baud {
    B9600,
    B19200,
    B38400,
    B57600,
}

impl Baud {
    pub fn bits_per_second(self) -> u32 {
        match self {
            Baud::B9600 => 9600,
            Baud::B19200 => 19200,
            Baud::B38400 => 38400,
            Baud::B57600 => 57600,
        }
    }
}

impl TryFrom<u32> for Baud {
    type Error = Error;

    fn try_from(rate: u32) -> Result<Self> {
        match rate {
            9600 => Ok(Baud::B9600),
            19200 => Ok(Baud::B19200),
            38400 => Ok(Baud::B38400),
            57600 => Ok(Baud::B57600),
            _ => Err(Error::InvalidBaud(rate)),
        }
    }
}

/// Describes the attached display module and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub module: ModuleType,
    /// Number of columns.
    pub width: u8,
    /// Number of rows.
    pub height: u8,
    /// Horizontal pixels in a character cell.
    pub cell_width: u8,
    /// Vertical pixels in a character cell.
    pub cell_height: u8,
    /// Device node, e.g. /dev/ttyUSB0.
    pub port: String,
    /// One of 9600, 19200, 38400 or 57600.
    pub baud_rate: u32,
}

impl DeviceProfile {
    /// A 20x4 module with 5x8 cells at 19200 baud.
    pub fn new(module: ModuleType, port: &str) -> Self {
        Self {
            module,
            width: 20,
            height: 4,
            cell_width: 5,
            cell_height: 8,
            port: port.to_string(),
            baud_rate: 19200,
        }
    }

    pub fn with_size(mut self, width: u8, height: u8) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_cell_size(mut self, width: u8, height: u8) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Checks the geometry against what the protocol can address. The
    /// module type is already known to be valid since `ModuleType` can only
    /// be built from one of the four known codes.
    pub fn validate(&self) -> Result<()> {
        if self.width > MAX_WIDTH || self.height > MAX_HEIGHT {
            return Err(Error::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.cell_width > MAX_CELL_WIDTH || self.cell_height > MAX_CELL_HEIGHT {
            return Err(Error::InvalidCellSize {
                width: self.cell_width,
                height: self.cell_height,
            });
        }
        Ok(())
    }

    pub fn baud(&self) -> Result<Baud> {
        Baud::try_from(self.baud_rate)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.module.capabilities()
    }

    pub fn contains(&self, x: u8, y: u8) -> bool {
        x < self.width && y < self.height
    }
}
