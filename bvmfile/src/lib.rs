//! On-disk container for assembled ByteCraft programs.
//!
//! A BVM file is the magic `"BVM\0"`, a twelve byte header holding the entry
//! point, the code size and the data size (little-endian `u32` each), then
//! the code bytes and the data bytes. Bytes past the declared payload are
//! tolerated and ignored.

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::error::Error as StdError;
use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use util::Endian;

pub const MAGIC: [u8; 4] = *b"BVM\0";

#[derive(Debug)]
pub enum Error {
    /// The file could not be opened or created.
    Open(io::Error),
    /// Writing the container failed or was cut short.
    Write(io::Error),
    /// The file does not start with `"BVM\0"`.
    BadMagic([u8; 4]),
    /// The file ends inside the twelve byte header.
    TruncatedHeader,
    /// The file ends inside the declared code or data payload.
    TruncatedPayload,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open(err) => write!(f, "opening file failed: {}", err),
            Error::Write(err) => write!(f, "writing file failed: {}", err),
            Error::BadMagic(magic) => {
                write!(f, "bad magic {:?}, expected {:?}", magic, MAGIC)
            }
            Error::TruncatedHeader => f.write_str("file ends inside the header"),
            Error::TruncatedPayload => f.write_str("file ends inside the declared payload"),
        }
    }
}

impl StdError for Error {}

/// An assembled program: entry point plus the code and data regions.
///
/// The entry point is an offset into the code region. The data region
/// carries no initializers; a freshly assembled module's data is all
/// zeroes, which [`new`] guarantees by construction.
///
/// [`new`]: #method.new
#[derive(Debug, PartialEq)]
pub struct Module {
    entry_point: u32,
    code: Vec<u8>,
    data: Vec<u8>,
}

impl Module {
    /// Creates a module with a zero-filled data region of `data_size` bytes.
    pub fn new(entry_point: u32, code: Vec<u8>, data_size: u32) -> Module {
        Module {
            entry_point,
            code,
            data: vec![0; data_size as usize],
        }
    }

    /// Creates a module from raw parts, as read back from a container.
    pub fn from_parts(entry_point: u32, code: Vec<u8>, data: Vec<u8>) -> Module {
        Module {
            entry_point,
            code,
            data,
        }
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn code(&self) -> &[u8] {
        &self.code[..]
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    pub fn code_size(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn data_size(&self) -> u32 {
        self.data.len() as u32
    }

    /// Consumes the module into the flat memory image the machine executes:
    /// the code region followed immediately by the data region.
    pub fn into_image(self) -> Vec<u8> {
        let mut image = self.code;
        image.extend_from_slice(&self.data[..]);
        image
    }
}

pub fn read<R: Read>(reader: &mut R) -> Result<Module, Error> {
    let mut magic = [0u8; 4];
    if reader.read_exact(&mut magic).is_err() || magic != MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let entry_point = reader
        .read_u32::<Endian>()
        .map_err(|_| Error::TruncatedHeader)?;
    let code_size = reader
        .read_u32::<Endian>()
        .map_err(|_| Error::TruncatedHeader)?;
    let data_size = reader
        .read_u32::<Endian>()
        .map_err(|_| Error::TruncatedHeader)?;

    let mut code = vec![0; code_size as usize];
    let mut data = vec![0; data_size as usize];
    reader
        .read_exact(&mut code)
        .map_err(|_| Error::TruncatedPayload)?;
    reader
        .read_exact(&mut data)
        .map_err(|_| Error::TruncatedPayload)?;

    Ok(Module::from_parts(entry_point, code, data))
}

pub fn write<W: Write>(writer: &mut W, module: &Module) -> Result<(), Error> {
    writer.write_all(&MAGIC).map_err(Error::Write)?;
    writer
        .write_u32::<Endian>(module.entry_point)
        .map_err(Error::Write)?;
    writer
        .write_u32::<Endian>(module.code_size())
        .map_err(Error::Write)?;
    writer
        .write_u32::<Endian>(module.data_size())
        .map_err(Error::Write)?;
    writer.write_all(&module.code[..]).map_err(Error::Write)?;
    writer.write_all(&module.data[..]).map_err(Error::Write)?;
    Ok(())
}

pub trait ReadBvmExt: Read + Sized {
    fn read_bvm(&mut self) -> Result<Module, Error> {
        read(self)
    }
}

impl<R: Read + Sized> ReadBvmExt for R {}

pub trait WriteBvmExt: Write + Sized {
    fn write_bvm(&mut self, module: &Module) -> Result<(), Error> {
        write(self, module)
    }
}

impl<W: Write + Sized> WriteBvmExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Module, Error> {
    let file = File::open(path).map_err(Error::Open)?;
    BufReader::new(file).read_bvm()
}

pub fn write_file<P: AsRef<Path>>(path: P, module: &Module) -> Result<(), Error> {
    let file = File::create(path).map_err(Error::Open)?;
    let mut writer = BufWriter::new(file);
    writer.write_bvm(module)?;
    writer.flush().map_err(Error::Write)
}
