use std::io::{self, Read, Write};

/// Host side of the syscall interface.
///
/// The machine performs the bounds checks and the register plumbing; an
/// implementation only moves bytes between the program's memory and the
/// host. [`StdHostIo`] wires the calls to the process's standard streams;
/// tests substitute buffer-backed implementations.
///
/// [`StdHostIo`]: struct.StdHostIo.html
pub trait HostIo {
    /// Writes the buffer to the given file descriptor and returns the number
    /// of bytes written.
    fn write(&mut self, fd: u32, bytes: &[u8]) -> u32;

    /// Reads up to `buf.len()` bytes from the given file descriptor,
    /// stopping at end of input. Returns the number of bytes read.
    fn read(&mut self, fd: u32, buf: &mut [u8]) -> u32;
}

/// Production I/O: descriptor 2 is standard error, every other descriptor
/// writes to standard output; reads are served from standard input on
/// descriptor 0 only.
#[derive(Debug, Default)]
pub struct StdHostIo;

impl HostIo for StdHostIo {
    fn write(&mut self, fd: u32, bytes: &[u8]) -> u32 {
        let result = if fd == 2 {
            io::stderr().write_all(bytes)
        } else {
            io::stdout().write_all(bytes)
        };
        match result {
            Ok(()) => bytes.len() as u32,
            Err(_) => 0,
        }
    }

    fn read(&mut self, fd: u32, buf: &mut [u8]) -> u32 {
        if fd != 0 {
            return 0;
        }
        let stdin = io::stdin();
        let mut handle = stdin.lock();
        let mut filled = 0;
        while filled < buf.len() {
            match handle.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        filled as u32
    }
}
