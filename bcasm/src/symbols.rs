use std::collections::HashMap;

use crate::error::{Error, ErrorKind};
use crate::lines::ValueToken;

/// Unified lookup for code labels and data names.
///
/// Labels map to instruction offsets within the code region, data names to
/// absolute addresses in the combined memory image. The namespaces are
/// disjoint; duplicates are rejected while the table is built.
pub type SymbolMap<'i> = HashMap<&'i str, u32>;

/// Resolves a literal or symbolic value to its word.
pub fn resolve(value: &ValueToken, symbols: &SymbolMap, line: usize) -> Result<u32, Error> {
    match value {
        ValueToken::Number(n) => Ok(*n),
        ValueToken::Symbol(name) => symbols.get(name).copied().ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownSymbol,
                line,
                format!("unknown symbol `{}`", name),
            )
        }),
    }
}
