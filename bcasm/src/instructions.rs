use crate::error::{Error, ErrorKind};
use crate::lines::OperandToken;
use crate::symbols::{self, SymbolMap};
use bytecraft::{encode, is_branch, Opcode, Operand, OperandKind};

/// Checks the mnemonic and operand shape of one instruction.
///
/// Returns the opcode together with the operand kinds that determine the
/// encoded size, so the sizing pass and the emitter agree by construction.
pub fn validate(
    mnemonic: &str,
    operands: &[OperandToken],
    line: usize,
) -> Result<(Opcode, OperandKind, OperandKind), Error> {
    let op: Opcode = mnemonic.to_uppercase().parse().map_err(|_| {
        Error::new(
            ErrorKind::UnknownOpcode,
            line,
            format!("unknown mnemonic `{}`", mnemonic),
        )
    })?;

    match op {
        Opcode::NOP | Opcode::SYSCALL => {
            expect_operands(op, operands, 0, line)?;
            Ok((op, OperandKind::None, OperandKind::None))
        }
        Opcode::JMP | Opcode::JEQ | Opcode::JNEQ | Opcode::JLA | Opcode::JLE => {
            expect_operands(op, operands, 1, line)?;
            let target = operands[0].kind();
            if target == OperandKind::Mem {
                return Err(shape(
                    line,
                    format!("`{}` cannot take a memory operand as branch target", op),
                ));
            }
            Ok((op, OperandKind::None, target))
        }
        Opcode::MOV => {
            expect_operands(op, operands, 2, line)?;
            let dst = operands[0].kind();
            let src = operands[1].kind();
            if dst != OperandKind::Reg && dst != OperandKind::Mem {
                return Err(shape(
                    line,
                    "destination of `MOV` must be a register or memory".to_string(),
                ));
            }
            if dst == OperandKind::Mem && src == OperandKind::Mem {
                return Err(shape(
                    line,
                    "`MOV` cannot move memory to memory".to_string(),
                ));
            }
            Ok((op, dst, src))
        }
        Opcode::ADD | Opcode::SUB | Opcode::XOR => {
            expect_operands(op, operands, 2, line)?;
            if operands[0].kind() != OperandKind::Reg {
                return Err(shape(
                    line,
                    format!("destination of `{}` must be a register", op),
                ));
            }
            Ok((op, OperandKind::Reg, operands[1].kind()))
        }
        Opcode::CMP => {
            expect_operands(op, operands, 2, line)?;
            if operands[0].kind() != OperandKind::Reg {
                return Err(shape(
                    line,
                    "first operand of `CMP` must be a register".to_string(),
                ));
            }
            Ok((op, OperandKind::Reg, operands[1].kind()))
        }
    }
}

/// Resolves the operands of one validated instruction and appends its
/// encoding to `code`.
pub fn emit<'i>(
    code: &mut Vec<u8>,
    op: Opcode,
    operands: &[OperandToken<'i>],
    symbols: &SymbolMap<'i>,
    line: usize,
) -> Result<(), Error> {
    let (dst, src) = if is_branch(op) {
        (Operand::None, resolve_operand(&operands[0], symbols, line)?)
    } else {
        match op {
            Opcode::NOP | Opcode::SYSCALL => (Operand::None, Operand::None),
            _ => (
                resolve_operand(&operands[0], symbols, line)?,
                resolve_operand(&operands[1], symbols, line)?,
            ),
        }
    };
    encode(code, op, dst, src);
    Ok(())
}

fn resolve_operand<'i>(
    token: &OperandToken<'i>,
    symbols: &SymbolMap<'i>,
    line: usize,
) -> Result<Operand, Error> {
    match token {
        OperandToken::Register(id) => Ok(Operand::reg(*id)),
        OperandToken::Value(value) => Ok(Operand::Immediate(symbols::resolve(
            value, symbols, line,
        )?)),
        OperandToken::Mem(value) => Ok(Operand::MemAbs(symbols::resolve(value, symbols, line)?)),
    }
}

fn expect_operands(
    op: Opcode,
    operands: &[OperandToken],
    count: usize,
    line: usize,
) -> Result<(), Error> {
    if operands.len() != count {
        return Err(Error::new(
            ErrorKind::BadOperandCount,
            line,
            format!(
                "`{}` takes {} operand(s), found {}",
                op,
                count,
                operands.len()
            ),
        ));
    }
    Ok(())
}

fn shape(line: usize, message: String) -> Error {
    Error::new(ErrorKind::BadOperandShape, line, message)
}
