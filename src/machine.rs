use std::cmp::Ordering;
use std::error::Error as StdError;
use std::fmt;

use byteorder::ByteOrder;
use num_traits::FromPrimitive;
use tracing::{enabled, trace, Level};

use crate::constants::*;
use crate::instructions::*;
use crate::io::HostIo;
use crate::{Endian, Word};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The memory image does not match the declared region sizes.
    ImageSizeMismatch { memory: usize, declared: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ImageSizeMismatch { memory, declared } => write!(
                f,
                "memory image holds {} bytes but the header declares {}",
                memory, declared
            ),
        }
    }
}

impl StdError for Error {}

/// Why the machine stopped, derived from the flag bits in `rF`.
///
/// The flags remain the authoritative fault record; this only spares
/// callers the bit tests.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitStatus {
    Clean,
    BadInstruction,
    FetchOutOfBounds,
    ReadOutOfBounds,
    WriteOutOfBounds,
}

/// The ByteCraft virtual machine.
///
/// Owns a flat byte-addressed memory image: the code region occupies
/// `[0, code_size)` and the data region everything after it. Execution
/// faults are reported in band, as flag bits in `rF` combined with leaving
/// the running state; [`run`] itself never fails.
///
/// [`run`]: #method.run
#[derive(Debug)]
pub struct Machine {
    registers: [Word; REGISTER_COUNT],
    memory: Vec<u8>,
    code_size: u32,
    running: bool,
}

impl Machine {
    /// Creates a machine over a flat memory image.
    ///
    /// `memory` must hold exactly the code region followed by the data
    /// region. All registers start at zero except `IP`, which starts at
    /// `entry_point`.
    pub fn new(
        memory: Vec<u8>,
        entry_point: u32,
        code_size: u32,
        data_size: u32,
    ) -> Result<Machine, Error> {
        let declared = u64::from(code_size) + u64::from(data_size);
        if memory.len() as u64 != declared {
            return Err(Error::ImageSizeMismatch {
                memory: memory.len(),
                declared,
            });
        }
        let mut registers = [0; REGISTER_COUNT];
        registers[RegisterId::IP as usize] = entry_point;
        Ok(Machine {
            registers,
            memory,
            code_size,
            running: true,
        })
    }

    pub fn register(&self, id: RegisterId) -> Word {
        self.registers[id as usize]
    }

    /// Writes a register through the architectural masking rules.
    pub fn set_register(&mut self, id: RegisterId, value: Word) {
        self.write_register(id as u8, value);
    }

    pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
        &self.registers
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory[..]
    }

    pub fn code_size(&self) -> u32 {
        self.code_size
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn flags(&self) -> Word {
        self.registers[RegisterId::RF as usize]
    }

    pub fn flag(&self, mask: Word) -> bool {
        self.flags() & mask != 0
    }

    /// Summarises why the machine halted.
    pub fn exit_status(&self) -> ExitStatus {
        let flags = self.flags();
        if flags & FLAG_BAD_INSTR != 0 {
            ExitStatus::BadInstruction
        } else if flags & FLAG_IP_OOB != 0 {
            ExitStatus::FetchOutOfBounds
        } else if flags & FLAG_READ_OOB != 0 {
            ExitStatus::ReadOutOfBounds
        } else if flags & FLAG_WRITE_OOB != 0 {
            ExitStatus::WriteOutOfBounds
        } else {
            ExitStatus::Clean
        }
    }

    /// Runs until the machine halts, cleanly or on a fault.
    pub fn run(&mut self, io: &mut dyn HostIo) {
        while self.running {
            self.step(io);
        }
    }

    /// Executes a single instruction.
    ///
    /// Once the machine has halted further calls do nothing.
    pub fn step(&mut self, io: &mut dyn HostIo) {
        if !self.running {
            return;
        }
        let ip_before = self.ip();
        if ip_before >= self.code_size {
            self.fault(FLAG_IP_OOB);
            return;
        }
        let op_byte = match self.fetch8() {
            Some(byte) => byte,
            None => return,
        };
        match Opcode::from_u8(op_byte) {
            Some(op) => {
                self.execute(op, io);
                self.trace_step(ip_before, op);
            }
            None => self.fault(FLAG_BAD_INSTR),
        }
    }

    fn execute(&mut self, op: Opcode, io: &mut dyn HostIo) {
        match op {
            Opcode::NOP => {}
            Opcode::MOV => {
                self.exec_mov();
            }
            Opcode::ADD | Opcode::SUB | Opcode::XOR => {
                self.exec_arith(op);
            }
            Opcode::CMP => {
                self.exec_cmp();
            }
            Opcode::JMP | Opcode::JEQ | Opcode::JNEQ | Opcode::JLA | Opcode::JLE => {
                self.exec_branch(op);
            }
            Opcode::SYSCALL => {
                self.exec_syscall(io);
            }
        }
    }

    fn exec_mov(&mut self) -> Option<()> {
        let (dst, src) = self.fetch_mode()?;
        match dst {
            OperandKind::Reg => {
                let dst_reg = self.fetch_register()?;
                let value = self.fetch_source(src)?;
                self.write_register(dst_reg, value);
            }
            OperandKind::Mem => {
                let address = self.fetch32()?;
                let value = match src {
                    OperandKind::Reg => {
                        let index = self.fetch_register()?;
                        self.registers[index as usize]
                    }
                    OperandKind::Imm => self.fetch32()?,
                    // Memory-to-memory moves are not encodable.
                    OperandKind::Mem | OperandKind::None => {
                        self.fault(FLAG_BAD_INSTR);
                        return None;
                    }
                };
                self.store32(address, value)?;
            }
            OperandKind::Imm | OperandKind::None => {
                self.fault(FLAG_BAD_INSTR);
                return None;
            }
        }
        Some(())
    }

    fn exec_arith(&mut self, op: Opcode) -> Option<()> {
        let (dst, src) = self.fetch_mode()?;
        if dst != OperandKind::Reg {
            self.fault(FLAG_BAD_INSTR);
            return None;
        }
        let dst_reg = self.fetch_register()?;
        let lhs = self.registers[dst_reg as usize];
        let rhs = self.fetch_source(src)?;
        let value = match op {
            Opcode::ADD => lhs.wrapping_add(rhs),
            Opcode::SUB => lhs.wrapping_sub(rhs),
            Opcode::XOR => lhs ^ rhs,
            _ => unreachable!(),
        };
        self.write_register(dst_reg, value);
        Some(())
    }

    fn exec_cmp(&mut self) -> Option<()> {
        let (dst, src) = self.fetch_mode()?;
        if dst != OperandKind::Reg {
            self.fault(FLAG_BAD_INSTR);
            return None;
        }
        let lhs_reg = self.fetch_register()?;
        let lhs = self.registers[lhs_reg as usize];
        let rhs = self.fetch_source(src)?;
        self.set_compare_flags(lhs, rhs);
        Some(())
    }

    fn exec_branch(&mut self, op: Opcode) -> Option<()> {
        let (_, src) = self.fetch_mode()?;
        let target = match src {
            OperandKind::Imm => self.fetch32()?,
            OperandKind::Reg => {
                let index = self.fetch_register()?;
                self.registers[index as usize]
            }
            OperandKind::Mem | OperandKind::None => {
                self.fault(FLAG_BAD_INSTR);
                return None;
            }
        };
        let flags = self.flags();
        let taken = match op {
            Opcode::JMP => true,
            Opcode::JEQ => flags & FLAG_EQ != 0,
            Opcode::JNEQ => flags & FLAG_EQ == 0,
            Opcode::JLA => flags & FLAG_GT != 0,
            Opcode::JLE => flags & (FLAG_LT | FLAG_EQ) != 0,
            _ => unreachable!(),
        };
        if taken {
            self.set_flags(FLAG_TEST_TRUE);
            self.registers[RegisterId::IP as usize] = target;
        } else {
            self.clear_flags(FLAG_TEST_TRUE);
        }
        Some(())
    }

    fn exec_syscall(&mut self, io: &mut dyn HostIo) -> Option<()> {
        let id = self.registers[RegisterId::R1 as usize];
        match Syscall::from_u32(id) {
            Some(Syscall::EXIT) => {
                self.running = false;
            }
            Some(Syscall::WRITE) => {
                let fd = self.registers[RegisterId::R2 as usize];
                let buf = self.registers[RegisterId::R3 as usize];
                let len = self.registers[RegisterId::R4 as usize];
                if !self.check_read(buf, len) {
                    return None;
                }
                let start = buf as usize;
                let written = io.write(fd, &self.memory[start..start + len as usize]);
                self.registers[RegisterId::R1 as usize] = written;
            }
            Some(Syscall::READ) => {
                let fd = self.registers[RegisterId::R2 as usize];
                let buf = self.registers[RegisterId::R3 as usize];
                let len = self.registers[RegisterId::R4 as usize];
                if !self.check_write(buf, len) {
                    return None;
                }
                let start = buf as usize;
                let count = io.read(fd, &mut self.memory[start..start + len as usize]);
                self.registers[RegisterId::R1 as usize] = count;
            }
            Some(Syscall::OPEN) => {
                self.registers[RegisterId::R1 as usize] = 0xFFFF_FFFF;
            }
            None => {
                self.fault(FLAG_BAD_INSTR);
                return None;
            }
        }
        Some(())
    }

    /// Clears `EQ`/`GT`/`LT` and sets exactly one of them. With sign mode
    /// enabled both operands are interpreted as signed 32-bit values.
    fn set_compare_flags(&mut self, lhs: Word, rhs: Word) {
        self.clear_flags(COMPARE_MASK);
        let ordering = if self.registers[RegisterId::RS as usize] & 1 != 0 {
            (lhs as i32).cmp(&(rhs as i32))
        } else {
            lhs.cmp(&rhs)
        };
        let flag = match ordering {
            Ordering::Equal => FLAG_EQ,
            Ordering::Greater => FLAG_GT,
            Ordering::Less => FLAG_LT,
        };
        self.set_flags(flag);
    }

    fn ip(&self) -> Word {
        self.registers[RegisterId::IP as usize]
    }

    fn set_flags(&mut self, mask: Word) {
        self.registers[RegisterId::RF as usize] |= mask;
    }

    fn clear_flags(&mut self, mask: Word) {
        self.registers[RegisterId::RF as usize] &= !mask;
    }

    fn fault(&mut self, mask: Word) {
        self.set_flags(mask);
        self.running = false;
    }

    fn write_register(&mut self, index: u8, value: Word) {
        // Only bit 0 of rS is architecturally meaningful.
        let value = if index == RegisterId::RS as u8 {
            value & 1
        } else {
            value
        };
        self.registers[index as usize] = value;
    }

    /// Fetches the next code byte, faulting with `IP_OOB` when `IP` has
    /// left the code region.
    fn fetch8(&mut self) -> Option<u8> {
        let ip = self.ip();
        if ip >= self.code_size {
            self.fault(FLAG_IP_OOB);
            return None;
        }
        let byte = self.memory[ip as usize];
        self.registers[RegisterId::IP as usize] = ip + 1;
        Some(byte)
    }

    /// Fetches a four byte little-endian value from the code region.
    fn fetch32(&mut self) -> Option<Word> {
        let ip = self.ip();
        if u64::from(ip) + u64::from(WORD_BYTES) > u64::from(self.code_size) {
            self.fault(FLAG_IP_OOB);
            return None;
        }
        let start = ip as usize;
        let value = Endian::read_u32(&self.memory[start..start + WORD_BYTES as usize]);
        self.registers[RegisterId::IP as usize] = ip + WORD_BYTES;
        Some(value)
    }

    /// Fetches a register index operand and validates it.
    fn fetch_register(&mut self) -> Option<u8> {
        let index = self.fetch8()?;
        if index as usize >= REGISTER_COUNT {
            self.fault(FLAG_BAD_INSTR);
            return None;
        }
        Some(index)
    }

    /// Fetches and evaluates a source operand of the given kind.
    fn fetch_source(&mut self, kind: OperandKind) -> Option<Word> {
        match kind {
            OperandKind::Reg => {
                let index = self.fetch_register()?;
                Some(self.registers[index as usize])
            }
            OperandKind::Imm => self.fetch32(),
            OperandKind::Mem => {
                let address = self.fetch32()?;
                self.load32(address)
            }
            OperandKind::None => {
                self.fault(FLAG_BAD_INSTR);
                None
            }
        }
    }

    fn fetch_mode(&mut self) -> Option<(OperandKind, OperandKind)> {
        let mode = self.fetch8()?;
        match mode_kinds(mode) {
            Some(kinds) => Some(kinds),
            None => {
                self.fault(FLAG_BAD_INSTR);
                None
            }
        }
    }

    fn out_of_bounds(&self, address: Word, length: Word) -> bool {
        let len = self.memory.len() as u64;
        u64::from(address) > len
            || u64::from(length) > len
            || u64::from(address) + u64::from(length) > len
    }

    fn check_read(&mut self, address: Word, length: Word) -> bool {
        if self.out_of_bounds(address, length) {
            self.fault(FLAG_READ_OOB);
            return false;
        }
        true
    }

    fn check_write(&mut self, address: Word, length: Word) -> bool {
        if self.out_of_bounds(address, length) {
            self.fault(FLAG_WRITE_OOB);
            return false;
        }
        true
    }

    /// Reads a word from the memory image. The only read primitive used by
    /// instructions.
    fn load32(&mut self, address: Word) -> Option<Word> {
        if !self.check_read(address, WORD_BYTES) {
            return None;
        }
        let start = address as usize;
        Some(Endian::read_u32(
            &self.memory[start..start + WORD_BYTES as usize],
        ))
    }

    /// Writes a word to the memory image. The only write primitive used by
    /// instructions.
    fn store32(&mut self, address: Word, value: Word) -> Option<()> {
        if !self.check_write(address, WORD_BYTES) {
            return None;
        }
        let start = address as usize;
        Endian::write_u32(&mut self.memory[start..start + WORD_BYTES as usize], value);
        Some(())
    }

    fn trace_step(&self, ip_before: Word, op: Opcode) {
        if !enabled!(Level::TRACE) {
            return;
        }
        let registers = self
            .registers
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{}={:#x}", register_name(i as u8), value))
            .collect::<Vec<_>>()
            .join(" ");
        let flags = format!("{:#010b}", self.flags() & 0xFF);
        trace!(ip = ip_before, opcode = %op, %flags, %registers, "executed");
    }
}
