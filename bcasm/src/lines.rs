use matches::debug_assert_matches;
use pest::iterators::Pair;

use crate::error::{Error, ErrorKind};
use crate::numbers;
use crate::parser::Rule;
use bytecraft::{OperandKind, RegisterId};

/// One meaningful source line, tagged with its one-based line number.
#[derive(Debug)]
pub struct SourceLine<'i> {
    pub line: usize,
    pub kind: LineKind<'i>,
}

#[derive(Debug)]
pub enum LineKind<'i> {
    MainHeader,
    DataHeader,
    Label(&'i str),
    Instruction {
        mnemonic: &'i str,
        operands: Vec<OperandToken<'i>>,
    },
    Data {
        name: &'i str,
        size: u32,
    },
}

/// A parsed operand, before symbol resolution.
///
/// Classification follows the operand inference rules: register names win,
/// bracketed operands address memory, everything else is an immediate.
#[derive(Debug, Clone, Copy)]
pub enum OperandToken<'i> {
    Register(RegisterId),
    Mem(ValueToken<'i>),
    Value(ValueToken<'i>),
}

/// A literal number or a symbol reference.
#[derive(Debug, Clone, Copy)]
pub enum ValueToken<'i> {
    Number(u32),
    Symbol(&'i str),
}

impl OperandToken<'_> {
    pub fn kind(&self) -> OperandKind {
        match self {
            OperandToken::Register(_) => OperandKind::Reg,
            OperandToken::Mem(_) => OperandKind::Mem,
            OperandToken::Value(_) => OperandKind::Imm,
        }
    }
}

/// Flattens the parse tree into a list of tagged source lines.
pub fn lower(file: Pair<Rule>) -> Result<Vec<SourceLine>, Error> {
    debug_assert_matches!(file.as_rule(), Rule::file);

    let mut lines = Vec::new();
    for pair in file.into_inner() {
        if pair.as_rule() == Rule::EOI {
            continue;
        }
        let line = pair.as_span().start_pos().line_col().0;
        let inner = pair.into_inner().next().unwrap();
        let kind = match inner.as_rule() {
            Rule::section_header => match inner.as_str() {
                "_main:" => LineKind::MainHeader,
                _ => LineKind::DataHeader,
            },
            Rule::label_decl => lower_label(inner, line)?,
            Rule::db_decl => lower_db(inner, line)?,
            Rule::instruction => lower_instruction(inner),
            _ => unreachable!(),
        };
        lines.push(SourceLine { line, kind });
    }
    Ok(lines)
}

fn lower_label(pair: Pair<Rule>, line: usize) -> Result<LineKind, Error> {
    match pair.into_inner().next() {
        Some(name) => Ok(LineKind::Label(name.as_str())),
        None => Err(Error::new(
            ErrorKind::EmptyLabel,
            line,
            "label has no name".to_string(),
        )),
    }
}

fn lower_db(pair: Pair<Rule>, line: usize) -> Result<LineKind, Error> {
    let mut pairs = pair.into_inner();
    let _keyword = pairs.next().unwrap();
    let name = pairs.next().unwrap().as_str();
    let size_text = pairs.next().unwrap().as_str();
    if size_text.starts_with('-') {
        return Err(Error::new(
            ErrorKind::BadNumber,
            line,
            format!("data size cannot be negative: {}", size_text),
        ));
    }
    Ok(LineKind::Data {
        name,
        size: numbers::parse(size_text),
    })
}

fn lower_instruction(pair: Pair<Rule>) -> LineKind {
    let mut pairs = pair.into_inner();
    let mnemonic = pairs.next().unwrap().as_str();
    let operands = pairs.map(lower_operand).collect();
    LineKind::Instruction { mnemonic, operands }
}

fn lower_operand(pair: Pair<Rule>) -> OperandToken {
    debug_assert_matches!(pair.as_rule(), Rule::operand);

    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::register => OperandToken::Register(parse_register(inner.as_str())),
        Rule::mem_operand => OperandToken::Mem(lower_value(inner.into_inner().next().unwrap())),
        Rule::number => OperandToken::Value(ValueToken::Number(numbers::parse(inner.as_str()))),
        Rule::identifier => OperandToken::Value(ValueToken::Symbol(inner.as_str())),
        _ => unreachable!(),
    }
}

fn lower_value(pair: Pair<Rule>) -> ValueToken {
    match pair.as_rule() {
        Rule::number => ValueToken::Number(numbers::parse(pair.as_str())),
        Rule::identifier => ValueToken::Symbol(pair.as_str()),
        _ => unreachable!(),
    }
}

fn parse_register(text: &str) -> RegisterId {
    // The grammar only lets valid register spellings through.
    text.to_uppercase().parse().unwrap()
}
