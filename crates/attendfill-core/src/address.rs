//! Cell addressing
//!
//! Rows and columns are 1-based, matching A1 notation: `A1` is row 1,
//! column 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest column index accepted by the xlsx format (`XFD`)
pub const MAX_COL: u32 = 16_384;

/// Largest row index accepted by the xlsx format
pub const MAX_ROW: u32 = 1_048_576;

/// A single cell position (1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// The cell immediately to the right
    pub const fn right(self) -> Self {
        Self::new(self.row, self.col + 1)
    }

    /// The cell immediately below
    pub const fn below(self) -> Self {
        Self::new(self.row + 1, self.col)
    }

    /// Format as A1 notation
    pub fn to_a1(self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl From<CellAddress> for String {
    fn from(addr: CellAddress) -> Self {
        addr.to_a1()
    }
}

impl TryFrom<String> for CellAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error parsing an A1 reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell reference: {0:?}")]
pub struct AddressParseError(pub String);

impl FromStr for CellAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| AddressParseError(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let letters = letters.trim_start_matches('$').trim_end_matches('$');
        let col = column_index(letters).ok_or_else(|| AddressParseError(s.to_string()))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| AddressParseError(s.to_string()))?;
        if row == 0 || row > MAX_ROW {
            return Err(AddressParseError(s.to_string()));
        }
        Ok(Self::new(row, col))
    }
}

/// A rectangular range, inclusive on both ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first: CellAddress,
    pub last: CellAddress,
}

impl CellRange {
    pub fn new(first: CellAddress, last: CellAddress) -> Self {
        Self {
            first: CellAddress::new(first.row.min(last.row), first.col.min(last.col)),
            last: CellAddress::new(first.row.max(last.row), first.col.max(last.col)),
        }
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        (self.first.row..=self.last.row).contains(&addr.row)
            && (self.first.col..=self.last.col).contains(&addr.col)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}:{}", self.first, self.last)
        }
    }
}

impl FromStr for CellRange {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(a.parse()?, b.parse()?)),
            None => {
                let a: CellAddress = s.parse()?;
                Ok(Self::new(a, a))
            }
        }
    }
}

/// Convert a 1-based column index to letters (1 -> "A", 27 -> "AA")
pub fn column_letters(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Convert column letters to a 1-based index ("A" -> 1, "AF" -> 32)
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    (col <= MAX_COL).then_some(col)
}
