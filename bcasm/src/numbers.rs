//! Numeric literal folding.
//!
//! Literals are decimal (optionally negative) or hexadecimal with a `0x`
//! prefix, and are reduced modulo 2^32: negative decimals become their
//! two's complement and overlong literals wrap.

pub fn parse(text: &str) -> u32 {
    if let Some(digits) = strip_hex_prefix(text) {
        fold(digits, 16)
    } else if let Some(digits) = text.strip_prefix('-') {
        fold(digits, 10).wrapping_neg()
    } else {
        fold(text, 10)
    }
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn fold(digits: &str, radix: u32) -> u32 {
    digits.chars().fold(0u32, |acc, c| {
        acc.wrapping_mul(radix)
            .wrapping_add(c.to_digit(radix).unwrap_or(0))
    })
}
