//! Userspace driver for serial character LCD/VFD modules which speak the
//! 0xFE escape-byte command protocol.
//!
//! A `Session` owns the serial line and turns high level operations (text,
//! cursor movement, bars, big digits, backlight, keypad settings) into the
//! command bytes the module expects. The module never acknowledges anything,
//! so operations with out-of-range arguments, or which the module type
//! doesn't support, are silently skipped rather than reported.

use std::io;
use std::time::Duration;

use log::{debug, info, trace, warn};
use pretty_hex::*;

#[macro_use]
pub mod macros;

pub mod command;
pub mod error;
pub mod mode;
pub mod profile;
pub mod serial;
pub mod traits;

#[cfg(test)]
mod testutils;

pub use command::{Command, Opcode, ESCAPE};
pub use error::{CloseFailure, CloseStep, Error, Result};
pub use mode::SpecialMemory;
pub use profile::{Baud, Capabilities, DeviceProfile, ModuleType};
pub use serial::SerialPort;
pub use traits::Transport;

use mode::ModeTracker;

pub const MAX_HBAR_LEN: u8 = 100;
pub const MAX_VBAR_LEN: u8 = 32;
pub const MAX_DIGIT: u8 = 9;
pub const MAX_GLYPHS: u8 = 8;
pub const GLYPH_ROWS: usize = 8;
pub const MAX_VFD_BRIGHTNESS: u8 = 3;

// General purpose output bits for `Session::set_outputs`.
pub const GPO1: u8 = 1 << 0;
pub const GPO2: u8 = 1 << 1;
pub const GPO3: u8 = 1 << 2;
pub const GPO4: u8 = 1 << 3;
pub const GPO5: u8 = 1 << 4;
pub const GPO6: u8 = 1 << 5;
pub const OUTPUT_COUNT: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbarStyle {
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitStyle {
    Medium,
    Large,
}

/// What holding a key down does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRepeat {
    /// Repeats the key code while held.
    Typematic,
    /// Sends one code on press and another on release.
    Hold,
}

/// An open connection to a display module.
///
/// Opening clears the display and homes the cursor. Closing (or dropping)
/// the session turns off what can be turned off, waits for the output to
/// drain and puts the serial line back the way it was found.
pub struct Session<'a, T: Transport = SerialPort> {
    transport: T,
    profile: &'a DeviceProfile,
    mode: ModeTracker,
    closed: bool,
}

impl<'a> Session<'a, SerialPort> {
    /// Validates `profile` and opens the serial port it names.
    pub fn open(profile: &'a DeviceProfile) -> Result<Self> {
        profile.validate()?;
        let baud = profile.baud()?;
        let port = SerialPort::open(&profile.port, baud)?;
        Session::with_transport(profile, port)
    }
}

impl<'a, T: Transport> Session<'a, T> {
    /// Starts a session over an already open transport.
    pub fn with_transport(profile: &'a DeviceProfile, transport: T) -> Result<Self> {
        profile.validate()?;
        let mut session = Self {
            transport,
            profile,
            mode: ModeTracker::new(),
            closed: false,
        };
        info!(
            "Session opened: {:?} {}x{}",
            profile.module, profile.width, profile.height
        );
        session.clear();
        session.home();
        Ok(session)
    }

    pub fn profile(&self) -> &DeviceProfile {
        self.profile
    }

    /// What the module's glyph memory was last loaded with.
    pub fn mode(&self) -> SpecialMemory {
        self.mode.current()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tears the session down. Every step is attempted even if an earlier
    /// one fails; the failures are returned together as `Error::Close`.
    pub fn close(mut self) -> Result<()> {
        let failures = self.shutdown();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Close(failures))
        }
    }

    fn shutdown(&mut self) -> Vec<CloseFailure> {
        let mut failures = Vec::new();
        if self.closed {
            return failures;
        }
        self.closed = true;

        // Leave the module dark, blank and quiet.
        let mut teardown = Vec::new();
        teardown.extend(self.backlight_off_command());
        teardown.push(Command::new(Opcode::ClearScreen));
        teardown.push(Command::new(Opcode::CursorBlockOff));
        teardown.extend(self.keypad_backlight_off_command());
        teardown.extend(self.output_commands(0));
        for cmd in teardown.iter() {
            if let Err(error) = self.transmit(cmd) {
                warn!("Shutdown command {:?} failed: {}", cmd.opcode(), error);
                failures.push(CloseFailure {
                    step: CloseStep::Shutdown,
                    error,
                });
            }
        }

        let steps: [(CloseStep, fn(&mut T) -> io::Result<()>); 4] = [
            (CloseStep::Drain, T::drain),
            (CloseStep::Unlock, T::unlock),
            (CloseStep::Restore, T::restore),
            (CloseStep::Release, T::close),
        ];
        for (step, action) in steps.iter() {
            if let Err(error) = action(&mut self.transport) {
                warn!("Close step {:?} failed: {}", step, error);
                failures.push(CloseFailure { step: *step, error });
            }
        }

        info!("Session closed ({} issues)", failures.len());
        failures
    }

    fn transmit(&mut self, cmd: &Command) -> io::Result<()> {
        debug!("tx {:?}", cmd);
        self.transport.write(cmd.as_bytes()).map(|_| ())
    }

    // Commands are fire-and-forget: the module can't tell us whether it got
    // them, so a failed write is only logged.
    fn send(&mut self, cmd: Command) {
        if let Err(err) = self.transmit(&cmd) {
            warn!("Failed to send {:?}: {}", cmd.opcode(), err);
        }
    }

    fn send_all(&mut self, cmds: Vec<Command>) {
        for cmd in cmds {
            self.send(cmd);
        }
    }

    fn emit(&mut self, cmd: Option<Command>) {
        if let Some(cmd) = cmd {
            self.send(cmd);
        }
    }

    fn gated(&self, supported: bool, cmd: Command) -> Option<Command> {
        if supported {
            Some(cmd)
        } else {
            trace!(
                "{:?} not supported on {:?}, skipped",
                cmd.opcode(),
                self.profile.module
            );
            None
        }
    }

    fn caps(&self) -> Capabilities {
        self.profile.capabilities()
    }

    // ----- Raw I/O -----

    /// Writes `bytes` unmodified, so they may contain commands.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        debug!("tx raw {:?}", bytes.hex_dump());
        Ok(self.transport.write(bytes)?)
    }

    /// Waits up to `timeout` for input (keypresses) and reads what is there,
    /// which may be less than `buf.len()`. Returns Ok(0) on timeout.
    pub fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let count = self.transport.read(buf, timeout)?;
        if count > 0 {
            debug!("rx {:?}", (&buf[..count]).hex_dump());
        }
        Ok(count)
    }

    // ----- Text -----

    pub fn clear(&mut self) {
        self.send(Command::new(Opcode::ClearScreen));
    }

    pub fn home(&mut self) {
        self.send(Command::new(Opcode::GoHome));
    }

    pub fn put_char(&mut self, c: u8) {
        self.put_str([c]);
    }

    /// Writes text at the cursor. Escape bytes are replaced by spaces.
    pub fn put_str<S: AsRef<[u8]>>(&mut self, text: S) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        let escaped = command::escape_text(text);
        debug!("tx text {:?}", escaped.as_slice().hex_dump());
        if let Err(err) = self.transport.write(&escaped) {
            warn!("Failed to send text: {}", err);
        }
    }

    /// Moves the cursor to column `x`, row `y` (both 0-based).
    pub fn set_cursor(&mut self, x: u8, y: u8) {
        if !self.profile.contains(x, y) {
            trace!("set_cursor({}, {}) out of range", x, y);
            return;
        }
        self.send(Command::new(Opcode::SetCursor).args(&[x + 1, y + 1]));
    }

    pub fn move_cursor_back(&mut self) {
        self.send(Command::new(Opcode::CursorBack));
    }

    pub fn move_cursor_forward(&mut self) {
        self.send(Command::new(Opcode::CursorForward));
    }

    pub fn set_cursor_block(&mut self, on: bool) {
        self.send(Command::new(if on {
            Opcode::CursorBlockOn
        } else {
            Opcode::CursorBlockOff
        }));
    }

    pub fn set_cursor_underline(&mut self, on: bool) {
        self.send(Command::new(if on {
            Opcode::CursorUnderlineOn
        } else {
            Opcode::CursorUnderlineOff
        }));
    }

    pub fn set_auto_scroll(&mut self, on: bool) {
        self.send(Command::new(if on {
            Opcode::AutoScrollOn
        } else {
            Opcode::AutoScrollOff
        }));
    }

    pub fn set_line_wrap(&mut self, on: bool) {
        self.send(Command::new(if on {
            Opcode::LineWrapOn
        } else {
            Opcode::LineWrapOff
        }));
    }

    // ----- Special characters -----

    /// Defines custom glyph `id` (0-7). Each row is masked to the cell width
    /// and rows past the cell height are sent as 0. Replaces any bars or big
    /// digits currently loaded.
    pub fn define_glyph(&mut self, id: u8, rows: &[u8; GLYPH_ROWS]) {
        if id >= MAX_GLYPHS {
            trace!("define_glyph({}) out of range", id);
            return;
        }
        let mask = ((1u16 << self.profile.cell_width) - 1) as u8;
        let height = usize::from(self.profile.cell_height).min(GLYPH_ROWS);
        let mut cmd = Command::new(Opcode::DefineGlyph).arg(id);
        for (row, bits) in rows.iter().enumerate() {
            cmd = cmd.arg(if row < height { bits & mask } else { 0 });
        }
        self.send(cmd);
        self.mode.define_glyph();
    }

    /// Draws a horizontal bar of `len` pixels (0-100) starting at `x`, `y`.
    pub fn hbar(&mut self, x: u8, y: u8, len: u8, dir: Direction) {
        if !self.profile.contains(x, y) || len > MAX_HBAR_LEN {
            trace!("hbar({}, {}, {}) out of range", x, y, len);
            return;
        }
        if self.mode.enter(SpecialMemory::HorizontalBar) {
            self.send(Command::new(Opcode::HbarInit));
        }
        let dir = match dir {
            Direction::Right => 0,
            Direction::Left => 1,
        };
        self.send(Command::new(Opcode::HbarPlace).args(&[x + 1, y + 1, dir, len]));
    }

    /// Draws a vertical bar of `len` pixels (0-32) in column `x`, growing up
    /// from the bottom row.
    pub fn vbar(&mut self, x: u8, len: u8, style: VbarStyle) {
        if x >= self.profile.width || len > MAX_VBAR_LEN {
            trace!("vbar({}, {}) out of range", x, len);
            return;
        }
        if self.mode.enter(SpecialMemory::VerticalBar) {
            self.send(Command::new(match style {
                VbarStyle::Narrow => Opcode::VbarNarrowInit,
                VbarStyle::Wide => Opcode::VbarWideInit,
            }));
        }
        self.send(Command::new(Opcode::VbarPlace).args(&[x + 1, len]));
    }

    /// Draws a big `digit` (0-9) at column `x`. Medium digits are placed on
    /// row `y`; large digits span the whole display and ignore it.
    pub fn big_digit(&mut self, x: u8, y: u8, digit: u8, style: DigitStyle) {
        let row_ok = style == DigitStyle::Large || y < self.profile.height;
        if x >= self.profile.width || digit > MAX_DIGIT || !row_ok {
            trace!("big_digit({}, {}, {}) out of range", x, y, digit);
            return;
        }
        if self.mode.enter(SpecialMemory::BigDigit) {
            self.send(Command::new(match style {
                DigitStyle::Medium => Opcode::BigDigitMediumInit,
                DigitStyle::Large => Opcode::BigDigitLargeInit,
            }));
        }
        // The two placement commands really do order row and column
        // differently.
        let cmd = match style {
            DigitStyle::Medium => {
                Command::new(Opcode::BigDigitMediumPlace).args(&[y + 1, x + 1, digit])
            }
            DigitStyle::Large => Command::new(Opcode::BigDigitLargePlace).args(&[x + 1, digit]),
        };
        self.send(cmd);
    }

    // ----- Display -----

    /// Turns the backlight on for `minutes`, or indefinitely if 0.
    pub fn backlight_on(&mut self, minutes: u8) {
        let cmd = self.gated(
            self.caps().backlight,
            Command::new(Opcode::BacklightOn).arg(minutes),
        );
        self.emit(cmd);
    }

    fn backlight_off_command(&self) -> Option<Command> {
        self.gated(self.caps().backlight, Command::new(Opcode::BacklightOff))
    }

    pub fn backlight_off(&mut self) {
        let cmd = self.backlight_off_command();
        self.emit(cmd);
    }

    pub fn set_contrast(&mut self, value: u8) {
        let cmd = self.gated(
            self.caps().backlight,
            Command::new(Opcode::Contrast).arg(value),
        );
        self.emit(cmd);
    }

    /// LCDs take 0 (dim) to 255 (bright). VFDs take 0 (bright) to 3 (dim);
    /// larger values are clamped to 3.
    pub fn set_brightness(&mut self, value: u8) {
        let cmd = if self.caps().vfd_brightness {
            Command::new(Opcode::BrightnessVfd).arg(value.min(MAX_VFD_BRIGHTNESS))
        } else {
            Command::new(Opcode::BrightnessLcd).arg(value)
        };
        self.send(cmd);
    }

    pub fn set_background_color(&mut self, r: u8, g: u8, b: u8) {
        let cmd = self.gated(
            self.caps().backlight,
            Command::new(Opcode::BackgroundColor).args(&[r, g, b]),
        );
        self.emit(cmd);
    }

    // ----- General purpose outputs -----

    fn output_commands(&self, mask: u8) -> Vec<Command> {
        let opcode = |on: bool| if on { Opcode::OutputOn } else { Opcode::OutputOff };
        if self.caps().multi_output {
            (0..OUTPUT_COUNT)
                .map(|i| Command::new(opcode(mask & (1 << i) != 0)).arg(i + 1))
                .collect()
        } else {
            // Single output, no channel number.
            vec![Command::new(opcode(mask != 0))]
        }
    }

    /// Sets the outputs from a mask of `GPO1`..`GPO6`. Modules without a
    /// keypad have a single output which is on if any bit is set.
    pub fn set_outputs(&mut self, mask: u8) {
        let cmds = self.output_commands(mask);
        self.send_all(cmds);
    }

    // ----- Keypad -----

    fn keypad_backlight_off_command(&self) -> Option<Command> {
        self.gated(self.caps().keypad, Command::new(Opcode::KeypadBacklightOff))
    }

    pub fn keypad_backlight_off(&mut self) {
        let cmd = self.keypad_backlight_off_command();
        self.emit(cmd);
    }

    pub fn set_keypad_brightness(&mut self, value: u8) {
        let cmd = self.gated(
            self.caps().keypad,
            Command::new(Opcode::KeypadBrightness).arg(value),
        );
        self.emit(cmd);
    }

    /// With auto transmit on, key presses are sent as soon as they happen.
    pub fn set_key_auto_tx(&mut self, on: bool) {
        let opcode = if on {
            Opcode::KeyAutoTxOn
        } else {
            Opcode::KeyAutoTxOff
        };
        let cmd = self.gated(self.caps().keypad, Command::new(opcode));
        self.emit(cmd);
    }

    pub fn set_key_auto_repeat(&mut self, mode: AutoRepeat) {
        let mode = match mode {
            AutoRepeat::Typematic => 0,
            AutoRepeat::Hold => 1,
        };
        let cmd = self.gated(
            self.caps().keypad,
            Command::new(Opcode::KeyAutoRepeatMode).arg(mode),
        );
        self.emit(cmd);
    }

    pub fn set_key_auto_repeat_off(&mut self) {
        let cmd = self.gated(self.caps().keypad, Command::new(Opcode::KeyAutoRepeatOff));
        self.emit(cmd);
    }

    /// Debounce time is `value` * 6.554ms.
    pub fn set_key_debounce_time(&mut self, value: u8) {
        let cmd = self.gated(
            self.caps().keypad,
            Command::new(Opcode::KeyDebounceTime).arg(value),
        );
        self.emit(cmd);
    }
}

impl<'a, T: Transport> Drop for Session<'a, T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ===========================================================================
//
// Tests
//
// ===========================================================================
