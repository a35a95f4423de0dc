use crate::{constants, Endian, Word};
use byteorder::ByteOrder;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use std::str::FromStr;
use util::ParseEnumError;

// Instruction layout:
//
//          +--------+--------+-------------+-------------+
// General  |   op   |  mode  | dst payload | src payload |
//          +--------+--------+-------------+-------------+
// Bare     |   op   |
//          +--------+
//
// The mode byte packs two operand kind nibbles (high = destination,
// low = source). REG payloads are one byte holding a register index;
// IMM and MEM payloads are four little-endian bytes.

/// Operation codes. The numeric values are fixed by the on-disk format.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    //  Mnemonic | Operands | Effect
    //-----------+----------+------------------------------------------------
    NOP,     // |          | Does nothing
    MOV,     // | dst, src | dst = src
    ADD,     // | rd, src  | rd = rd + src (wrapping)
    SUB,     // | rd, src  | rd = rd - src (wrapping)
    XOR,     // | rd, src  | rd = rd ^ src
    CMP,     // | rd, src  | Compares rd with src, sets one of EQ/GT/LT
    JMP,     // | target   | IP = target
    JEQ,     // | target   | IP = target if EQ
    JNEQ,    // | target   | IP = target if not EQ
    JLA,     // | target   | IP = target if GT
    JLE,     // | target   | IP = target if LT or EQ
    SYSCALL, // |          | Host call selected by r1
}

/// Architectural registers, addressed by compact index.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum RegisterId {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    /// Instruction pointer.
    IP,
    /// Flags; comparison and fault bits live in the low byte.
    RF,
    /// Sign mode; only bit 0 is meaningful, writes are masked.
    RS,
}

/// Operand kinds as encoded in the mode byte nibbles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum OperandKind {
    None,
    Reg,
    Imm,
    Mem,
}

/// Host call identifiers, dispatched on `r1`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Syscall {
    EXIT,
    WRITE,
    READ,
    OPEN,
}

/// An operand value, ready to encode or freshly decoded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operand {
    None,
    Register(u8),
    Immediate(Word),
    MemAbs(Word),
}

impl Operand {
    pub fn reg(id: RegisterId) -> Operand {
        Operand::Register(id as u8)
    }

    pub fn imm(value: Word) -> Operand {
        Operand::Immediate(value)
    }

    pub fn mem(address: Word) -> Operand {
        Operand::MemAbs(address)
    }

    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::None => OperandKind::None,
            Operand::Register(_) => OperandKind::Reg,
            Operand::Immediate(_) => OperandKind::Imm,
            Operand::MemAbs(_) => OperandKind::Mem,
        }
    }
}

#[inline]
pub fn enum_to_u8<T: ToPrimitive + Copy>(val: T) -> u8 {
    val.to_u8().unwrap()
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl std::fmt::Display for $e {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(Opcode);
impl_enum_display!(RegisterId);
impl_enum_display!(OperandKind);
impl_enum_display!(Syscall);

/// Maps a register index to its architectural spelling, for diagnostics.
pub fn register_name(index: u8) -> &'static str {
    match index {
        0 => "r1",
        1 => "r2",
        2 => "r3",
        3 => "r4",
        4 => "r5",
        5 => "r6",
        6 => "r7",
        7 => "r8",
        8 => "IP",
        9 => "rF",
        10 => "rS",
        _ => "??",
    }
}

/// Packs two operand kinds into a mode byte.
#[inline]
pub fn mode_byte(dst: OperandKind, src: OperandKind) -> u8 {
    (enum_to_u8(dst) << constants::MODE_DST_SHIFT) | enum_to_u8(src)
}

/// Unpacks a mode byte into `(destination, source)` operand kinds.
///
/// Returns `None` if either nibble is not a valid operand kind.
pub fn mode_kinds(mode: u8) -> Option<(OperandKind, OperandKind)> {
    let dst = OperandKind::from_u8(mode >> constants::MODE_DST_SHIFT)?;
    let src = OperandKind::from_u8(mode & constants::MODE_NIBBLE_MASK)?;
    Some((dst, src))
}

/// Encoded payload size of a single operand.
pub fn operand_size(kind: OperandKind) -> u32 {
    match kind {
        OperandKind::None => 0,
        OperandKind::Reg => 1,
        OperandKind::Imm | OperandKind::Mem => constants::WORD_BYTES,
    }
}

/// Total encoded size of an instruction in bytes.
///
/// This is the single source of truth for instruction sizes: the
/// assembler's sizing pass uses it, the emitter produces exactly this many
/// bytes, and the machine consumes exactly this many bytes when executing
/// the instruction.
pub fn encoded_size(op: Opcode, dst: OperandKind, src: OperandKind) -> u32 {
    match op {
        Opcode::NOP | Opcode::SYSCALL => 1,
        _ => 2 + operand_size(dst) + operand_size(src),
    }
}

/// Returns true for the five branch opcodes.
pub fn is_branch(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::JMP | Opcode::JEQ | Opcode::JNEQ | Opcode::JLA | Opcode::JLE
    )
}

/// Appends the canonical encoding of one instruction to `buf`.
pub fn encode(buf: &mut Vec<u8>, op: Opcode, dst: Operand, src: Operand) {
    buf.push(enum_to_u8(op));
    if let Opcode::NOP | Opcode::SYSCALL = op {
        return;
    }
    buf.push(mode_byte(dst.kind(), src.kind()));
    encode_operand(buf, dst);
    encode_operand(buf, src);
}

fn encode_operand(buf: &mut Vec<u8>, operand: Operand) {
    match operand {
        Operand::None => {}
        Operand::Register(index) => buf.push(index),
        Operand::Immediate(value) | Operand::MemAbs(value) => {
            let mut bytes = [0u8; constants::WORD_BYTES as usize];
            Endian::write_u32(&mut bytes, value);
            buf.extend_from_slice(&bytes);
        }
    }
}

/// Encodes one instruction into a fresh byte vector.
#[macro_export]
macro_rules! instr {
    ($op:ident) => {{
        let mut buf = Vec::new();
        $crate::encode(
            &mut buf,
            $crate::Opcode::$op,
            $crate::Operand::None,
            $crate::Operand::None,
        );
        buf
    }};
    ($op:ident, $dst:expr, $src:expr) => {{
        let mut buf = Vec::new();
        $crate::encode(&mut buf, $crate::Opcode::$op, $dst, $src);
        buf
    }};
}

/// Concatenates encoded instructions into one code buffer.
#[macro_export]
macro_rules! code {
    [$( $i:expr ),* $(,)?] => {{
        let mut buf: Vec<u8> = Vec::new();
        $( buf.extend_from_slice(&$i[..]); )*
        buf
    }};
}

impl FromStr for Opcode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Opcode, ParseEnumError> {
        match s {
            "NOP" => Ok(Opcode::NOP),
            "MOV" => Ok(Opcode::MOV),
            "ADD" => Ok(Opcode::ADD),
            "SUB" => Ok(Opcode::SUB),
            "XOR" => Ok(Opcode::XOR),
            "CMP" => Ok(Opcode::CMP),
            "JMP" => Ok(Opcode::JMP),
            "JEQ" => Ok(Opcode::JEQ),
            "JNEQ" => Ok(Opcode::JNEQ),
            "JLA" => Ok(Opcode::JLA),
            "JLE" => Ok(Opcode::JLE),
            "SYSCALL" => Ok(Opcode::SYSCALL),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                enum_name: "Opcode",
            }),
        }
    }
}

impl FromStr for RegisterId {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<RegisterId, ParseEnumError> {
        match s {
            "R1" => Ok(RegisterId::R1),
            "R2" => Ok(RegisterId::R2),
            "R3" => Ok(RegisterId::R3),
            "R4" => Ok(RegisterId::R4),
            "R5" => Ok(RegisterId::R5),
            "R6" => Ok(RegisterId::R6),
            "R7" => Ok(RegisterId::R7),
            "R8" => Ok(RegisterId::R8),
            "IP" => Ok(RegisterId::IP),
            "RF" => Ok(RegisterId::RF),
            "RS" => Ok(RegisterId::RS),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                enum_name: "RegisterId",
            }),
        }
    }
}
