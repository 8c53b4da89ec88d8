use std::fmt;
use std::io;

use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid module type: {0}")]
    InvalidModule(u8),

    #[error("invalid display size {width}x{height}")]
    InvalidSize { width: u8, height: u8 },

    #[error("invalid cell size {width}x{height}")]
    InvalidCellSize { width: u8, height: u8 },

    #[error("invalid baudrate: {0}")]
    InvalidBaud(u32),

    #[error("no such device: {0}")]
    NoDevice(#[source] io::Error),

    #[error("no locks available: port is in use")]
    LockUnavailable,

    #[error("terminal error: {0}")]
    Terminal(#[source] Errno),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("close encountered {} non-fatal issue(s)", .0.len())]
    Close(Vec<CloseFailure>),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The teardown steps performed by `Session::close`, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStep {
    Shutdown,
    Drain,
    Unlock,
    Restore,
    Release,
}

#[derive(Debug)]
pub struct CloseFailure {
    pub step: CloseStep,
    pub error: io::Error,
}

impl fmt::Display for CloseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.step, self.error)
    }
}
