use log::info;
use pretty_hex::*;
use simple_logger;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;
use std::vec::Vec;

use super::command::{Opcode, ESCAPE};
use super::traits::Transport;

static INIT: Once = Once::new();

pub fn setup_log() {
    INIT.call_once(|| {
        simple_logger::init().unwrap();
    });
}

static TEMP_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Returns a path in the temp directory which no other test is using.
pub fn temp_path(name: &str) -> PathBuf {
    let count = TEMP_COUNT.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "serial-lcd-{}-{}-{}",
        std::process::id(),
        count,
        name
    ))
}

/// Everything a `TestTransport` has been asked to do.
#[derive(Default)]
pub struct TestLog {
    /// One entry per write call.
    pub writes: Vec<Vec<u8>>,
    /// Bytes handed out by read, in order.
    pub input: VecDeque<u8>,
    pub reads: usize,
    pub drains: usize,
    pub unlocks: usize,
    pub restores: usize,
    pub closes: usize,
    /// Writes which succeed before the channel breaks. None means never.
    pub writes_before_break: Option<usize>,
}

impl TestLog {
    fn broken(&self) -> bool {
        match self.writes_before_break {
            Some(limit) => self.writes.len() >= limit,
            None => false,
        }
    }

    /// All bytes written, in order.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// The number of writes which were the bare command `opcode`, or
    /// started with it.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.writes
            .iter()
            .filter(|w| w.len() >= 2 && w[0] == ESCAPE && w[1] == opcode.as_u8())
            .count()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    pub fn dump(&self) {
        for write in self.writes.iter() {
            info!("{:?}", write.as_slice().hex_dump());
        }
    }
}

/// A `Transport` which records writes into a shared `TestLog` so tests can
/// still look at it after the session which owned the transport is gone.
#[derive(Clone, Default)]
pub struct TestTransport {
    log: Rc<RefCell<TestLog>>,
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "test transport is broken")
}

impl TestTransport {
    pub fn new() -> Self {
        Default::default()
    }

    /// A transport which fails every call after `writes` successful writes.
    pub fn breaking_after(writes: usize) -> Self {
        let transport = Self::new();
        transport.log.borrow_mut().writes_before_break = Some(writes);
        transport
    }

    pub fn log(&self) -> Rc<RefCell<TestLog>> {
        self.log.clone()
    }

    pub fn queue_input(&self, bytes: &[u8]) {
        self.log.borrow_mut().input.extend(bytes.iter().copied());
    }
}

impl Transport for TestTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut log = self.log.borrow_mut();
        if log.broken() {
            return Err(broken_pipe());
        }
        log.writes.push(bytes.to_vec());
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let mut log = self.log.borrow_mut();
        log.reads += 1;
        if log.broken() {
            return Err(broken_pipe());
        }
        let mut count = 0;
        while count < buf.len() {
            match log.input.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn drain(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        log.drains += 1;
        if log.broken() {
            return Err(broken_pipe());
        }
        Ok(())
    }

    fn unlock(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        log.unlocks += 1;
        if log.broken() {
            return Err(broken_pipe());
        }
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        log.restores += 1;
        if log.broken() {
            return Err(broken_pipe());
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        log.closes += 1;
        Ok(())
    }
}
