//! Virtual machine and instruction set for the ByteCraft toolchain.
//!
//! The machine is a 32-bit register architecture with eleven registers
//! (`r1`-`r8`, the instruction pointer `IP`, the flags register `rF` and the
//! sign-mode register `rS`) executing over a single flat memory image. The
//! image is the code region followed immediately by the data region; the only
//! architectural distinction between the two is that instructions may only be
//! fetched from the code region.
//!
//! Instructions are variable length: an opcode byte, and for instructions
//! with operands a mode byte followed by the operand payloads. The mode byte
//! carries the destination operand kind in its high nibble and the source
//! operand kind in its low nibble (see [`OperandKind`]). The
//! [`encoded_size`] function is the authoritative size of any instruction
//! and is shared with the assembler.
//!
//! Errors during execution are architectural rather than host-level: a fault
//! sets one of the `BAD_INSTR`, `IP_OOB`, `READ_OOB` or `WRITE_OOB` bits in
//! `rF` and stops the machine. [`Machine::run`] therefore never fails; after
//! it returns, the registers and flags describe what happened, and
//! [`Machine::exit_status`] summarises them.
//!
//! [`OperandKind`]: enum.OperandKind.html
//! [`encoded_size`]: fn.encoded_size.html
//! [`Machine::run`]: struct.Machine.html#method.run
//! [`Machine::exit_status`]: struct.Machine.html#method.exit_status

pub mod constants;

mod instructions;
mod io;
mod machine;

pub use crate::instructions::*;
pub use crate::io::{HostIo, StdHostIo};
pub use crate::machine::{Error, ExitStatus, Machine};

pub type Word = u32;
pub type Endian = util::Endian;
