use pest_derive::Parser;

/// Pest parser for ByteCraft assembly; the grammar lives in `grammar.pest`.
#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct SourceParser;
