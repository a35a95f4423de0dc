//! File-level operations behind the `bvm` command line driver.
//!
//! `asm` and `run` are thin wrappers over the member crates: assembly is
//! `bcasm::assemble` plus a container write, running is a container read
//! plus [`Machine::run`] over the module's flat memory image.
//!
//! [`Machine::run`]: ../bytecraft/struct.Machine.html#method.run

use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bvmfile::Module;
use bytecraft::{HostIo, Machine, StdHostIo};

#[derive(Debug)]
pub enum Error {
    ReadInput(std::io::Error, PathBuf),
    Assemble(bcasm::Error),
    Container(bvmfile::Error),
    Machine(bytecraft::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadInput(err, path) => {
                write!(f, "reading \"{}\" failed: {}", path.display(), err)
            }
            Error::Assemble(err) => write!(f, "assembly failed: {}", err),
            Error::Container(err) => write!(f, "container error: {}", err),
            Error::Machine(err) => write!(f, "machine error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<bcasm::Error> for Error {
    fn from(err: bcasm::Error) -> Error {
        Error::Assemble(err)
    }
}

impl From<bvmfile::Error> for Error {
    fn from(err: bvmfile::Error) -> Error {
        Error::Container(err)
    }
}

/// Assembles the source file at `input` and writes the container to
/// `output`.
pub fn assemble_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<(), Error> {
    let input = input.as_ref();
    let file = File::open(input).map_err(|err| Error::ReadInput(err, input.to_owned()))?;
    let mut source = String::new();
    BufReader::new(file)
        .read_to_string(&mut source)
        .map_err(|err| Error::ReadInput(err, input.to_owned()))?;

    let module = bcasm::assemble(&source)?;
    bvmfile::write_file(output, &module)?;
    Ok(())
}

/// Loads the container at `path` and runs it to halt on the standard
/// streams, returning the stopped machine for inspection.
pub fn run_file<P: AsRef<Path>>(path: P) -> Result<Machine, Error> {
    let module = bvmfile::read_file(path)?;
    run_module(module, &mut StdHostIo::default())
}

/// Builds the flat memory image from a module and runs it to halt with the
/// given host I/O.
pub fn run_module(module: Module, io: &mut dyn HostIo) -> Result<Machine, Error> {
    let entry_point = module.entry_point();
    let code_size = module.code_size();
    let data_size = module.data_size();
    let mut machine = Machine::new(module.into_image(), entry_point, code_size, data_size)
        .map_err(Error::Machine)?;
    machine.run(io);
    Ok(machine)
}
