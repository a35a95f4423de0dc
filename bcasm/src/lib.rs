//! Assembler for the ByteCraft virtual machine.
//!
//! The main function provided by this crate is [`assemble`], which accepts
//! source text written in the ByteCraft assembly language and produces a
//! [`Module`] holding the encoded code region and the layout of the
//! zero-filled data region. Writing the module to disk is the job of the
//! `bvmfile` crate.
//!
//! Assembly happens in two passes over the parsed source. The first pass
//! sizes every instruction and captures symbols: code labels bind to the
//! offset of the instruction they precede, data names bind to absolute
//! addresses behind the code region. The second pass emits instruction
//! bytes, resolving symbolic operands through the unified symbol table.
//! Any error aborts the whole run with its one-based source line; no
//! partial module is ever produced.
//!
//! # Source language
//!
//! The source is line oriented. Comments start with `;` or `#` and run to
//! the end of the line; blank lines are ignored. Mnemonics and register
//! names are case-insensitive, labels and data names are case-sensitive.
//!
//! Two sections are introduced by the exact tokens `_main:` and `_data:`
//! on their own lines. Content before the first section header is an
//! error. `_main` holds labels and instructions:
//!
//! ```text
//! _main:
//! loop:
//!     add r1, 1
//!     cmp r1, 10
//!     jneq loop
//!     mov r1, 0
//!     syscall         ; exit
//! ```
//!
//! `_data` holds only `DB name[size]` declarations, each reserving `size`
//! zero-initialized bytes and binding `name` to their absolute address:
//!
//! ```text
//! _data:
//!     DB buffer[64]
//! ```
//!
//! # Operands
//!
//! | Form        | Example        | Meaning                                 |
//! |-------------|----------------|-----------------------------------------|
//! | register    | `r1`, `rF`     | `r1`-`r8`, `IP`, `rF`, `rS`             |
//! | immediate   | `42`, `-1`, `0xFF` | literal word, reduced modulo 2^32   |
//! | symbol      | `loop`, `buffer` | label offset or data address          |
//! | memory      | `[0x40]`, `[buffer]` | absolute address to load or store |
//!
//! # Mnemonics
//!
//! | Mnemonic | Syntax          | Notes                                     |
//! |----------|-----------------|-------------------------------------------|
//! | `NOP`    | `nop`           | bare, single byte                         |
//! | `MOV`    | `mov dst, src`  | destination register or memory, not both memory |
//! | `ADD`    | `add rd, src`   | register destination, wrapping            |
//! | `SUB`    | `sub rd, src`   | register destination, wrapping            |
//! | `XOR`    | `xor rd, src`   | register destination                      |
//! | `CMP`    | `cmp rd, src`   | register first operand, sets `EQ`/`GT`/`LT` |
//! | `JMP`    | `jmp target`    | register or immediate target              |
//! | `JEQ`    | `jeq target`    | taken if `EQ`                             |
//! | `JNEQ`   | `jneq target`   | taken if not `EQ`                         |
//! | `JLA`    | `jla target`    | taken if `GT`                             |
//! | `JLE`    | `jle target`    | taken if `LT` or `EQ`                     |
//! | `SYSCALL`| `syscall`       | bare, single byte                         |
//!
//! [`assemble`]: fn.assemble.html
//! [`Module`]: ../bvmfile/struct.Module.html

use std::collections::HashSet;

use pest::Parser;

use bvmfile::Module;
use bytecraft::encoded_size;

mod data;
mod error;
mod instructions;
mod lines;
mod numbers;
mod parser;
mod symbols;

#[cfg(test)]
mod test;

pub use crate::error::{Error, ErrorKind};

use crate::lines::{LineKind, SourceLine};
use crate::parser::{Rule, SourceParser};
use crate::symbols::SymbolMap;

/// Assembles ByteCraft source text into a module.
///
/// The module's entry point is always 0, the start of the code region.
pub fn assemble(input: &str) -> Result<Module, Error> {
    let file = SourceParser::parse(Rule::file, input)?.next().unwrap();
    let lines = lines::lower(file)?;
    let layout = compute_layout(&lines)?;
    emit(&lines, &layout)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Main,
    Data,
}

/// Everything the first pass learns: region sizes and the symbol table.
struct Layout<'i> {
    code_size: u32,
    data_size: u32,
    symbols: SymbolMap<'i>,
}

/// First pass: track the active section, size every instruction and bind
/// every symbol.
fn compute_layout<'i>(source_lines: &[SourceLine<'i>]) -> Result<Layout<'i>, Error> {
    let mut section = Section::None;
    let mut code_pc = 0u32;
    let mut symbols = SymbolMap::new();
    let mut decls: Vec<data::Decl<'i>> = Vec::new();
    let mut data_names: HashSet<&'i str> = HashSet::new();

    for line in source_lines {
        match &line.kind {
            LineKind::MainHeader => {
                section = Section::Main;
                continue;
            }
            LineKind::DataHeader => {
                section = Section::Data;
                continue;
            }
            _ => {}
        }

        match section {
            Section::None => {
                return Err(Error::new(
                    ErrorKind::BadSection,
                    line.line,
                    "content before a section header".to_string(),
                ));
            }
            Section::Main => match &line.kind {
                LineKind::Label(name) => {
                    if symbols.contains_key(name) || data_names.contains(name) {
                        return Err(Error::new(
                            ErrorKind::DuplicateLabel,
                            line.line,
                            format!("duplicate label `{}`", name),
                        ));
                    }
                    symbols.insert(*name, code_pc);
                }
                LineKind::Instruction { mnemonic, operands } => {
                    let (op, dst, src) = instructions::validate(mnemonic, operands, line.line)?;
                    code_pc += encoded_size(op, dst, src);
                }
                LineKind::Data { .. } => {
                    return Err(Error::new(
                        ErrorKind::UnknownOpcode,
                        line.line,
                        "`DB` is only valid in the _data section".to_string(),
                    ));
                }
                LineKind::MainHeader | LineKind::DataHeader => unreachable!(),
            },
            Section::Data => match &line.kind {
                LineKind::Data { name, size } => {
                    if symbols.contains_key(name) || data_names.contains(name) {
                        return Err(Error::new(
                            ErrorKind::DuplicateData,
                            line.line,
                            format!("duplicate data name `{}`", name),
                        ));
                    }
                    data_names.insert(*name);
                    decls.push(data::Decl {
                        name: *name,
                        size: *size,
                        line: line.line,
                    });
                }
                _ => {
                    return Err(Error::new(
                        ErrorKind::MalformedDb,
                        line.line,
                        "only `DB name[size]` declarations are allowed in the _data section"
                            .to_string(),
                    ));
                }
            },
        }
    }

    let code_size = code_pc;
    let data_size = data::bind(&decls, code_size, &mut symbols)?;
    Ok(Layout {
        code_size,
        data_size,
        symbols,
    })
}

/// Second pass: emit instruction bytes in source order with all symbols
/// resolved.
fn emit<'i>(source_lines: &[SourceLine<'i>], layout: &Layout<'i>) -> Result<Module, Error> {
    let mut code = Vec::with_capacity(layout.code_size as usize);
    for line in source_lines {
        if let LineKind::Instruction { mnemonic, operands } = &line.kind {
            let (op, _, _) = instructions::validate(mnemonic, operands, line.line)?;
            instructions::emit(&mut code, op, operands, &layout.symbols, line.line)?;
        }
    }
    debug_assert_eq!(layout.code_size as usize, code.len());
    Ok(Module::new(0, code, layout.data_size))
}
