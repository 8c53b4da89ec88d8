use std::io;
use std::time::Duration;

/// The duplex byte channel a `Session` talks to the module through.
///
/// The close related methods are called by `Session::close` in the order
/// drain, unlock, restore, close. Each one is attempted even if an earlier
/// one failed, so implementations must tolerate being called on a channel
/// which is already broken.
pub trait Transport {
    /// Writes all of `bytes`, returning the number of bytes written.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Waits up to `timeout` for input, then performs at most one read.
    /// Returns Ok(0) if nothing arrived in time. A zero timeout polls.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Blocks until everything written so far has been transmitted.
    fn drain(&mut self) -> io::Result<()>;

    /// Releases the exclusive lock on the port.
    fn unlock(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Restores the line settings which were in effect before opening.
    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Releases the underlying handle. Further calls should fail.
    fn close(&mut self) -> io::Result<()>;
}
