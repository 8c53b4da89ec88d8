use core::fmt;
use generic_array::GenericArray;
use pretty_hex::*;
use typenum::U11;

/// Every command starts with this byte. Text must never contain it.
pub const ESCAPE: u8 = 0xfe;

/// What an escape byte inside text is replaced with.
pub const ESCAPE_SUBSTITUTE: u8 = b' ';

// Longest command is a custom glyph: ESCAPE, opcode, id and 8 rows.
pub type CommandCapacity = U11;

c_like_enum! {
  Opcode {
    ClearScreen         = 0x58,
    GoHome              = 0x48,
    SetCursor           = 0x47,
    CursorBack          = 0x4c,
    CursorForward       = 0x4d,
    CursorBlockOn       = 0x53,
    CursorBlockOff      = 0x54,
    CursorUnderlineOn   = 0x4a,
    CursorUnderlineOff  = 0x4b,
    AutoScrollOn        = 0x51,
    AutoScrollOff       = 0x52,
    LineWrapOn          = 0x43,
    LineWrapOff         = 0x44,
    DefineGlyph         = 0x4e,
    HbarInit            = 0x68,
    HbarPlace           = 0x7c,
    VbarNarrowInit      = 0x73,
    VbarWideInit        = 0x76,
    VbarPlace           = 0x3d,
    BigDigitMediumInit  = 0x6d,
    BigDigitLargeInit   = 0x6e,
    BigDigitMediumPlace = 0x6f,
    BigDigitLargePlace  = 0x23,
    BacklightOn         = 0x42,
    BacklightOff        = 0x46,
    Contrast            = 0x50,
    BrightnessLcd       = 0x99,
    BrightnessVfd       = 0x59,
    BackgroundColor     = 0x82,
    OutputOff           = 0x56,
    OutputOn            = 0x57,
    KeypadBacklightOff  = 0x9b,
    KeypadBrightness    = 0x9c,
    KeyAutoTxOn         = 0x41,
    KeyAutoTxOff        = 0x4f,
    KeyAutoRepeatMode   = 0x7e,
    KeyAutoRepeatOff    = 0x60,
    KeyDebounceTime     = 0x55,
  }
}

/// A single device command: ESCAPE, an opcode and its parameter bytes.
#[derive(Clone, PartialEq)]
pub struct Command {
    len: usize,
    buf: GenericArray<u8, CommandCapacity>,
}

impl Command {
    pub fn new(opcode: Opcode) -> Self {
        let mut buf: GenericArray<u8, CommandCapacity> = Default::default();
        buf[0] = ESCAPE;
        buf[1] = opcode.as_u8();
        Self { len: 2, buf }
    }

    /// Appends a parameter byte. Returns an error if the command is full.
    pub fn push(&mut self, byte: u8) -> Result<(), ()> {
        if self.len < self.buf.len() {
            self.buf[self.len] = byte;
            self.len += 1;
            Ok(())
        } else {
            Err(())
        }
    }

    /// Builder form of `push`, for the fixed layouts in this crate which
    /// never exceed `CommandCapacity`.
    pub fn arg(mut self, byte: u8) -> Self {
        let pushed = self.push(byte);
        debug_assert!(pushed.is_ok(), "command overflow");
        self
    }

    pub fn args(mut self, bytes: &[u8]) -> Self {
        for byte in bytes {
            self = self.arg(*byte);
        }
        self
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.buf[1])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_bytes().hex_dump())
    }
}

/// Makes arbitrary text safe to send: any ESCAPE byte becomes a space so
/// the device doesn't start parsing a command in the middle of the text.
pub fn escape_text(text: &[u8]) -> Vec<u8> {
    text.iter()
        .map(|&byte| {
            if byte == ESCAPE {
                ESCAPE_SUBSTITUTE
            } else {
                byte
            }
        })
        .collect()
}
