//! Code 39 symbology.
//!
//! Each character is nine elements (bar, space, bar, ...) of which exactly
//! three are wide. Wide elements are three modules and narrow ones one, so
//! a character is 15 modules followed by a one-module gap. The symbol is
//! framed by `*` start/stop characters.

use super::ExportError;

pub const WIDE_MODULES: u32 = 3;
pub const CHAR_MODULES: u32 = 6 + 3 * WIDE_MODULES;
const GAP_MODULES: u32 = 1;

/// Bit 8 is the first element; a set bit is wide.
const PATTERNS: &[(char, u16)] = &[
    ('0', 0b000_110_100),
    ('1', 0b100_100_001),
    ('2', 0b001_100_001),
    ('3', 0b101_100_000),
    ('4', 0b000_110_001),
    ('5', 0b100_110_000),
    ('6', 0b001_110_000),
    ('7', 0b000_100_101),
    ('8', 0b100_100_100),
    ('9', 0b001_100_100),
    ('A', 0b100_001_001),
    ('B', 0b001_001_001),
    ('C', 0b101_001_000),
    ('D', 0b000_011_001),
    ('E', 0b100_011_000),
    ('F', 0b001_011_000),
    ('G', 0b000_001_101),
    ('H', 0b100_001_100),
    ('I', 0b001_001_100),
    ('J', 0b000_011_100),
    ('K', 0b100_000_011),
    ('L', 0b001_000_011),
    ('M', 0b101_000_010),
    ('N', 0b000_010_011),
    ('O', 0b100_010_010),
    ('P', 0b001_010_010),
    ('Q', 0b000_000_111),
    ('R', 0b100_000_110),
    ('S', 0b001_000_110),
    ('T', 0b000_010_110),
    ('U', 0b110_000_001),
    ('V', 0b011_000_001),
    ('W', 0b111_000_000),
    ('X', 0b010_010_001),
    ('Y', 0b110_010_000),
    ('Z', 0b011_010_000),
    ('-', 0b010_000_101),
    ('.', 0b110_000_100),
    (' ', 0b011_000_100),
    ('$', 0b010_101_000),
    ('/', 0b010_100_010),
    ('+', 0b010_001_010),
    ('%', 0b000_101_010),
    ('*', 0b010_010_100),
];

#[must_use]
pub fn pattern(c: char) -> Option<u16> {
    PATTERNS.iter().find(|(k, _)| *k == c).map(|(_, p)| *p)
}

/// Whether `data` can be encoded: non-empty and every character, folded to
/// upper case, in the Code 39 set other than the `*` frame.
#[must_use]
pub fn is_encodable(data: &str) -> bool {
    !data.is_empty()
        && data.chars().all(|c| {
            let upper = c.to_ascii_uppercase();
            upper != '*' && pattern(upper).is_some()
        })
}

/// A dark bar as (start module, width in modules).
pub type Bar = (u32, u32);

/// Bars for `data` framed by start/stop characters, plus the total width in modules.
/// Lower-case letters are folded to upper case.
///
/// # Errors
///
/// Returns `EmptyBarcode` for blank data, or `Barcode` for a character
/// outside the Code 39 set (including a literal `*`).
pub fn encode(data: &str) -> Result<(Vec<Bar>, u32), ExportError> {
    if data.is_empty() {
        return Err(ExportError::EmptyBarcode);
    }
    let mut symbols = Vec::with_capacity(data.len() + 2);
    symbols.push('*');
    for c in data.chars() {
        let upper = c.to_ascii_uppercase();
        if upper == '*' || pattern(upper).is_none() {
            return Err(ExportError::Barcode(c));
        }
        symbols.push(upper);
    }
    symbols.push('*');

    let mut bars = Vec::with_capacity(symbols.len() * 5);
    let mut x = 0;
    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 {
            x += GAP_MODULES;
        }
        let bits = pattern(*symbol).ok_or(ExportError::Barcode(*symbol))?;
        let start = x;
        for element in 0..9 {
            let wide = bits & (1 << (8 - element)) != 0;
            let width = if wide { WIDE_MODULES } else { 1 };
            if element % 2 == 0 {
                bars.push((x, width));
            }
            x += width;
        }
        debug_assert_eq!(x - start, CHAR_MODULES);
    }
    Ok((bars, x))
}

#[cfg(test)]
#[path = "barcode_test.rs"]
mod tests;
