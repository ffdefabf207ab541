//! A1-style range addressing
//!
//! Accepted forms:
//! - `Sheet1!A1:D10` — rectangular cell range (one-based, inclusive)
//! - `Sheet1!B3` — single cell
//! - `Sheet1!A:D` — whole columns
//! - `Sheet1` — whole sheet
//!
//! Titles with characters outside `[A-Za-z0-9_]` are single-quoted
//! (`'Q1 Sales'!A1:B2`) with embedded quotes doubled. Parsing accepts either
//! form; formatting always quotes when needed so the output parses back to
//! the same address.
//!
//! Coordinates are stored zero-indexed.

use super::error::{Result, SheetsError};
use std::fmt;
use std::str::FromStr;

/// A reference to a single cell (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> CellRef {
        CellRef { col, row }
    }

    /// Parse `A1` notation; None if the input is not a cell reference
    pub fn parse_a1(name: &str) -> Option<CellRef> {
        let split = name.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = name.split_at(split);
        let col = letters_to_col(letters)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let row = digits.parse::<u32>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), u64::from(self.row) + 1)
    }
}

/// Longest column name the store accepts (`ZZZ`)
const MAX_COLUMN_LETTERS: usize = 3;

/// Parse column letters (`A` -> 0, `Z` -> 25, `AA` -> 26)
pub fn letters_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty()
        || letters.len() > MAX_COLUMN_LETTERS
        || !letters.bytes().all(|b| b.is_ascii_alphabetic())
    {
        return None;
    }
    let mut acc = 0u32;
    for c in letters.to_ascii_uppercase().bytes() {
        let digit = u32::from(c - b'A') + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

/// Convert a column index to letters (0 -> A, 25 -> Z, 26 -> AA)
pub fn col_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// The part of a sheet a range covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Every cell of the sheet
    WholeSheet,
    /// Rectangle between two corners, inclusive
    Cells { start: CellRef, end: CellRef },
    /// Whole columns `start..=end`
    Columns { start: u32, end: u32 },
}

/// A validated range address: a sheet title plus the span within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAddress {
    sheet: String,
    span: Span,
}

impl RangeAddress {
    /// Address of a whole sheet
    pub fn sheet(title: impl Into<String>) -> Result<Self> {
        Self::with_span(title.into(), Span::WholeSheet)
    }

    /// Address of the rectangle between two corners
    pub fn cells(title: impl Into<String>, start: CellRef, end: CellRef) -> Result<Self> {
        Self::with_span(title.into(), Span::Cells { start, end })
    }

    /// Address of the whole columns `start..=end`
    pub fn columns(title: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        Self::with_span(title.into(), Span::Columns { start, end })
    }

    fn with_span(sheet: String, span: Span) -> Result<Self> {
        if sheet.is_empty() {
            return Err(SheetsError::Validation("range has no sheet title".into()));
        }
        match span {
            Span::Cells { start, end } if start.col > end.col || start.row > end.row => {
                return Err(SheetsError::Validation(format!(
                    "range corners are inverted: {}:{}",
                    start, end
                )));
            }
            Span::Columns { start, end } if start > end => {
                return Err(SheetsError::Validation(format!(
                    "column span is inverted: {}:{}",
                    col_to_letters(start),
                    col_to_letters(end)
                )));
            }
            _ => {}
        }
        Ok(RangeAddress { sheet, span })
    }

    /// Parse and validate a range string
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |why: &str| SheetsError::Validation(format!("invalid range '{}': {}", input, why));

        let (title, rest) = split_title(input).map_err(invalid)?;
        let span = match rest {
            None => {
                // A bare span such as "A1:B2" would silently target whatever
                // sheet the store considers first.
                if !input.starts_with('\'') && parse_span(input).is_ok() {
                    return Err(invalid("missing sheet title"));
                }
                Span::WholeSheet
            }
            Some(span) => parse_span(span).map_err(invalid)?,
        };

        if title.is_empty() {
            return Err(invalid("missing sheet title"));
        }
        Self::with_span(title, span)
    }

    pub fn sheet_title(&self) -> &str {
        &self.sheet
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Number of rows covered, when the range is bounded vertically
    pub fn row_count(&self) -> Option<u32> {
        match self.span {
            Span::Cells { start, end } => Some(end.row - start.row + 1),
            _ => None,
        }
    }

    /// Number of columns covered, when the range is bounded horizontally
    pub fn col_count(&self) -> Option<u32> {
        match self.span {
            Span::Cells { start, end } => Some(end.col - start.col + 1),
            Span::Columns { start, end } => Some(end - start + 1),
            Span::WholeSheet => None,
        }
    }

    /// Zero-based index of the first row, when known
    pub fn first_row(&self) -> Option<u32> {
        match self.span {
            Span::Cells { start, .. } => Some(start.row),
            _ => None,
        }
    }

    /// Zero-based index of the last row, when known
    pub fn last_row(&self) -> Option<u32> {
        match self.span {
            Span::Cells { end, .. } => Some(end.row),
            _ => None,
        }
    }

    /// Column bounds `(first, last)`, when known
    pub fn col_bounds(&self) -> Option<(u32, u32)> {
        match self.span {
            Span::Cells { start, end } => Some((start.col, end.col)),
            Span::Columns { start, end } => Some((start, end)),
            Span::WholeSheet => None,
        }
    }
}

/// Split off the sheet title. Returns the unquoted title and the text after
/// `!`, if any.
fn split_title(input: &str) -> std::result::Result<(String, Option<&str>), &'static str> {
    let Some(quoted) = input.strip_prefix('\'') else {
        return Ok(match input.split_once('!') {
            Some((title, rest)) => (title.to_string(), Some(rest)),
            None => (input.to_string(), None),
        });
    };

    let mut title = String::new();
    let mut chars = quoted.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            title.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '\''))) {
            chars.next();
            title.push('\'');
            continue;
        }
        let rest = &quoted[i + 1..];
        return match rest.strip_prefix('!') {
            Some(span) => Ok((title, Some(span))),
            None if rest.is_empty() => Ok((title, None)),
            None => Err("unexpected text after quoted sheet title"),
        };
    }
    Err("unterminated quoted sheet title")
}

fn parse_span(span: &str) -> std::result::Result<Span, &'static str> {
    if span.is_empty() {
        return Err("empty cell span after '!'");
    }
    let (first, second) = match span.split_once(':') {
        Some((a, b)) => (a, Some(b)),
        None => (span, None),
    };

    match second {
        None => CellRef::parse_a1(first)
            .map(|cell| Span::Cells { start: cell, end: cell })
            .ok_or("expected a cell such as A1"),
        Some(second) => {
            if let (Some(start), Some(end)) = (CellRef::parse_a1(first), CellRef::parse_a1(second)) {
                return Ok(Span::Cells { start, end });
            }
            if let (Some(start), Some(end)) = (letters_to_col(first), letters_to_col(second)) {
                return Ok(Span::Columns { start, end });
            }
            Err("expected A1:B2 or A:B")
        }
    }
}

fn needs_quoting(title: &str) -> bool {
    !title.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        || title.starts_with(|c: char| c.is_ascii_digit())
        || CellRef::parse_a1(title).is_some()
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if needs_quoting(&self.sheet) {
            write!(f, "'{}'", self.sheet.replace('\'', "''"))?;
        } else {
            f.write_str(&self.sheet)?;
        }
        match self.span {
            Span::WholeSheet => Ok(()),
            Span::Cells { start, end } if start == end => write!(f, "!{}", start),
            Span::Cells { start, end } => write!(f, "!{}:{}", start, end),
            Span::Columns { start, end } => {
                write!(f, "!{}:{}", col_to_letters(start), col_to_letters(end))
            }
        }
    }
}

impl FromStr for RangeAddress {
    type Err = SheetsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(input: &str) {
        match RangeAddress::parse(input) {
            Err(SheetsError::Validation(_)) => {}
            other => panic!("expected validation error for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_parse_cell_range() {
        let range = RangeAddress::parse("Sheet1!A1:D10").unwrap();
        assert_eq!(range.sheet_title(), "Sheet1");
        assert_eq!(
            range.span(),
            Span::Cells {
                start: CellRef::new(0, 0),
                end: CellRef::new(3, 9)
            }
        );
        assert_eq!(range.row_count(), Some(10));
        assert_eq!(range.col_count(), Some(4));
        assert_eq!(range.to_string(), "Sheet1!A1:D10");
    }

    #[test]
    fn test_parse_columns_and_whole_sheet() {
        let cols = RangeAddress::parse("Sheet1!A:Z").unwrap();
        assert_eq!(cols.span(), Span::Columns { start: 0, end: 25 });
        assert_eq!(cols.row_count(), None);
        assert_eq!(cols.col_count(), Some(26));

        let sheet = RangeAddress::parse("Data").unwrap();
        assert_eq!(sheet.span(), Span::WholeSheet);
        assert_eq!(sheet.to_string(), "Data");

        // Four letters is past the last column, so this is a title
        let sheet = RangeAddress::parse("Sheet1").unwrap();
        assert_eq!(sheet.sheet_title(), "Sheet1");
        assert_eq!(sheet.span(), Span::WholeSheet);
    }

    #[test]
    fn test_parse_single_cell() {
        let range = RangeAddress::parse("Sheet1!c7").unwrap();
        assert_eq!(range.first_row(), Some(6));
        assert_eq!(range.to_string(), "Sheet1!C7");
    }

    #[test]
    fn test_quoted_titles() {
        let range = RangeAddress::parse("'Q1 Sales'!A1:B2").unwrap();
        assert_eq!(range.sheet_title(), "Q1 Sales");
        assert_eq!(range.to_string(), "'Q1 Sales'!A1:B2");

        let range = RangeAddress::parse("'Bob''s data'!A:B").unwrap();
        assert_eq!(range.sheet_title(), "Bob's data");
        assert_eq!(range.to_string(), "'Bob''s data'!A:B");

        let range = RangeAddress::parse("'A1'").unwrap();
        assert_eq!(range.sheet_title(), "A1");
        assert_eq!(range.span(), Span::WholeSheet);
        assert_eq!(range.to_string(), "'A1'");
    }

    #[test]
    fn test_unquoted_title_with_spaces_is_requoted() {
        let range = RangeAddress::parse("My Sheet!A1:B2").unwrap();
        assert_eq!(range.to_string(), "'My Sheet'!A1:B2");
    }

    #[test]
    fn test_missing_title_is_invalid() {
        assert_invalid("!A1:B2");
        assert_invalid("A1:B2");
        assert_invalid("A:D");
        assert_invalid("");
        assert_invalid("''!A1");
    }

    #[test]
    fn test_malformed_spans_are_invalid() {
        assert_invalid("Sheet1!");
        assert_invalid("Sheet1!A0");
        assert_invalid("Sheet1!1A");
        assert_invalid("Sheet1!A1:B");
        assert_invalid("Sheet1!A1:B2:C3");
        assert_invalid("Sheet1!A1B2");
        assert_invalid("'Sheet1!A1");
        assert_invalid("'Sheet1'x!A1");
    }

    #[test]
    fn test_inverted_corners_are_invalid() {
        assert_invalid("Sheet1!B2:A1");
        assert_invalid("Sheet1!A5:B1");
        assert_invalid("Sheet1!D:A");
        assert!(RangeAddress::cells("S", CellRef::new(2, 0), CellRef::new(1, 0)).is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(letters_to_col("A"), Some(0));
        assert_eq!(letters_to_col("z"), Some(25));
        assert_eq!(letters_to_col("AA"), Some(26));
        assert_eq!(letters_to_col("ZZZ"), Some(18277));
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(27), "AB");
        assert_eq!(col_to_letters(18277), "ZZZ");
        assert_eq!(letters_to_col(&"Z".repeat(40)), None);
        assert_eq!(letters_to_col("A1"), None);
        assert_eq!(letters_to_col("AAAA"), None);
    }

    #[test]
    fn test_col_to_letters_handles_max() {
        let letters = col_to_letters(u32::MAX);
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_from_str() {
        let range: RangeAddress = "Sheet1!A3:B3".parse().unwrap();
        assert_eq!(range.first_row(), Some(2));
        assert_eq!(range.last_row(), Some(2));
        assert_eq!(range.col_bounds(), Some((0, 1)));
    }
}
