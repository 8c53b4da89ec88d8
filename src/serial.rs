use std::convert::TryInto;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem;
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::time::Duration;

use log::{debug, info};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, BaudRate, SetArg, SpecialCharacterIndices, Termios};

use crate::error::{Error, Result};
use crate::profile::Baud;
use crate::traits::Transport;

enum Handle {
    Locked(Flock<File>),
    Unlocked(File),
    Closed,
}

/// A serial port configured for talking to a display module: 8N1, raw
/// output, parity errors ignored and CR translated to NL on input.
///
/// The port is locked with a non-blocking exclusive `flock` for as long as
/// it is open, and the line settings found at open time are kept so they
/// can be put back by `restore`.
pub struct SerialPort {
    handle: Handle,
    saved: Termios,
}

impl From<Baud> for BaudRate {
    fn from(baud: Baud) -> Self {
        match baud {
            Baud::B9600 => BaudRate::B9600,
            Baud::B19200 => BaudRate::B19200,
            Baud::B38400 => BaudRate::B38400,
            Baud::B57600 => BaudRate::B57600,
        }
    }
}

impl SerialPort {
    pub fn open(path: &str, baud: Baud) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(path)
            .map_err(Error::NoDevice)?;

        // Dropping the file on any later failure closes the descriptor.
        let lock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => lock,
            Err((_, Errno::EWOULDBLOCK)) => return Err(Error::LockUnavailable),
            Err((_, errno)) => return Err(Error::NoDevice(io::Error::from(errno))),
        };

        let saved = termios::tcgetattr(&*lock).map_err(Error::Terminal)?;
        let line = line_settings(&saved, baud)?;
        termios::tcsetattr(&*lock, SetArg::TCSANOW, &line).map_err(Error::Terminal)?;
        termios::tcflush(&*lock, termios::FlushArg::TCIFLUSH).map_err(Error::Terminal)?;

        info!("Opened {} at {} baud", path, baud.bits_per_second());
        Ok(Self {
            handle: Handle::Locked(lock),
            saved,
        })
    }

    fn file(&self) -> io::Result<&File> {
        match &self.handle {
            Handle::Locked(lock) => Ok(&**lock),
            Handle::Unlocked(file) => Ok(file),
            Handle::Closed => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial port is closed",
            )),
        }
    }
}

// Starts from the current settings so platform specific fields are kept,
// then replaces every flag the module cares about.
fn line_settings(current: &Termios, baud: Baud) -> Result<Termios> {
    let mut line = current.clone();
    line.input_flags = termios::InputFlags::IGNPAR | termios::InputFlags::ICRNL;
    line.output_flags = termios::OutputFlags::empty();
    line.local_flags = termios::LocalFlags::empty();
    line.control_flags = termios::ControlFlags::CS8
        | termios::ControlFlags::CLOCAL
        | termios::ControlFlags::CREAD;
    line.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    line.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::cfsetspeed(&mut line, BaudRate::from(baud)).map_err(Error::Terminal)?;
    Ok(line)
}

impl Transport for SerialPort {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut file = self.file()?;
        file.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let mut file = self.file()?;
        let ready = {
            let mut poll_fds = [PollFd::new(file.as_fd(), PollFlags::POLLIN)];
            let timeout_ms: u16 = timeout.as_millis().try_into().unwrap_or(u16::MAX);
            match poll(&mut poll_fds, PollTimeout::from(timeout_ms)) {
                Ok(n) => n,
                Err(Errno::EINTR) => return Ok(0),
                Err(e) => return Err(io::Error::from(e)),
            }
        };
        if ready == 0 {
            return Ok(0);
        }
        file.read(buf)
    }

    fn drain(&mut self) -> io::Result<()> {
        let file = self.file()?;
        termios::tcdrain(file).map_err(io::Error::from)
    }

    fn unlock(&mut self) -> io::Result<()> {
        match mem::replace(&mut self.handle, Handle::Closed) {
            Handle::Locked(lock) => match lock.unlock() {
                Ok(file) => {
                    self.handle = Handle::Unlocked(file);
                    Ok(())
                }
                Err((lock, errno)) => {
                    self.handle = Handle::Locked(lock);
                    Err(io::Error::from(errno))
                }
            },
            other => {
                self.handle = other;
                Ok(())
            }
        }
    }

    fn restore(&mut self) -> io::Result<()> {
        let file = self.file()?;
        termios::tcsetattr(file, SetArg::TCSANOW, &self.saved).map_err(io::Error::from)
    }

    fn close(&mut self) -> io::Result<()> {
        if let Handle::Closed = mem::replace(&mut self.handle, Handle::Closed) {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial port already closed",
            ));
        }
        debug!("Serial port closed");
        Ok(())
    }
}
