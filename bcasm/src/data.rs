use crate::error::{Error, ErrorKind};
use crate::symbols::SymbolMap;

/// One `DB name[size]` declaration, in source order.
#[derive(Debug)]
pub struct Decl<'i> {
    pub name: &'i str,
    pub size: u32,
    pub line: usize,
}

/// Binds every data name to its absolute address and returns the total size
/// of the data region.
///
/// Addresses are assigned in declaration order starting at `code_size`,
/// since the data region follows the code region directly in the memory
/// image. The region itself is zero-filled when the module is built.
pub fn bind<'i>(
    decls: &[Decl<'i>],
    code_size: u32,
    symbols: &mut SymbolMap<'i>,
) -> Result<u32, Error> {
    let mut offset = 0u32;
    for decl in decls {
        let address = code_size
            .checked_add(offset)
            .ok_or_else(|| oversized(decl))?;
        symbols.insert(decl.name, address);
        offset = offset.checked_add(decl.size).ok_or_else(|| oversized(decl))?;
    }
    Ok(offset)
}

fn oversized(decl: &Decl) -> Error {
    Error::new(
        ErrorKind::MalformedDb,
        decl.line,
        format!("data region overflows at `{}`", decl.name),
    )
}
