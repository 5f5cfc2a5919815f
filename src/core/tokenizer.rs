//! Delimiter detection and row splitting for grid CSV files.
//!
//! The delimiter is sniffed once from the header line and then applied to
//! every row of the file. Rows may be ragged; consumers index fields
//! positionally and must tolerate short or long rows.

use csv::ReaderBuilder;
use thiserror::Error;

/// Minimum header width: X, Y and Value are mandatory.
pub const MIN_COLUMNS: usize = 3;

/// Errors that can occur while splitting a file into rows.
#[derive(Error, Debug)]
pub enum TokenizeError {
    #[error("empty file")]
    Empty,

    #[error("need at least 3 columns (X, Y, Value), header has {found}")]
    ShortHeader { found: usize },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizeError>;

/// Field separator of one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Pick the delimiter for a file from its header line.
    ///
    /// Semicolon wins only when it strictly outnumbers commas; otherwise any
    /// tab selects tab, and comma is the fallback.
    pub fn detect(header_line: &str) -> Self {
        let semicolons = header_line.matches(';').count();
        let commas = header_line.matches(',').count();

        if semicolons > commas {
            Delimiter::Semicolon
        } else if header_line.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }
}

/// One data row and the source line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: u64,
    pub fields: Vec<String>,
}

impl Row {
    /// Returns the field at `index`, if the row is long enough.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// A tokenized file: detected delimiter, raw header fields and data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub delimiter: Delimiter,
    pub header: Vec<String>,
    pub rows: Vec<Row>,
    /// Number of whitespace-only rows that were dropped.
    pub skipped_blank: usize,
}

/// Split the full text of one file into header and data rows.
///
/// # Errors
///
/// Returns [`TokenizeError::Empty`] when the text holds no rows at all,
/// [`TokenizeError::ShortHeader`] when the header has fewer than
/// [`MIN_COLUMNS`] fields, and [`TokenizeError::Csv`] on malformed quoting.
pub fn tokenize(text: &str) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let header_line = text.split('\n').next().unwrap_or_default();
    let delimiter = Delimiter::detect(header_line);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Err(TokenizeError::Empty),
    };

    if header.len() < MIN_COLUMNS {
        return Err(TokenizeError::ShortHeader {
            found: header.len(),
        });
    }

    let mut rows = Vec::new();
    let mut skipped_blank = 0;

    for result in records {
        let record = result?;

        if record.iter().all(|field| field.trim().is_empty()) {
            skipped_blank += 1;
            continue;
        }

        rows.push(Row {
            line: record.position().map_or(0, |p| p.line()),
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(Table {
        delimiter,
        header,
        rows,
        skipped_blank,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_semicolon_when_outnumbering_commas() {
        assert_eq!(Delimiter::detect("X;Y;Value;Size"), Delimiter::Semicolon);
        assert_eq!(Delimiter::detect("X;Y;Value,Size"), Delimiter::Semicolon);
    }

    #[test]
    fn test_detect_tie_falls_through_to_comma() {
        assert_eq!(Delimiter::detect("X;Y,Value"), Delimiter::Comma);
    }

    #[test]
    fn test_detect_tab() {
        assert_eq!(Delimiter::detect("X\tY\tValue"), Delimiter::Tab);
        // Commas outnumber semicolons, tab still present
        assert_eq!(Delimiter::detect("X\tY\tValue,a"), Delimiter::Tab);
    }

    #[test]
    fn test_detect_semicolon_beats_tab() {
        assert_eq!(Delimiter::detect("X;Y;Value\tSize"), Delimiter::Semicolon);
    }

    #[test]
    fn test_detect_default_comma() {
        assert_eq!(Delimiter::detect("X,Y,Value"), Delimiter::Comma);
        assert_eq!(Delimiter::detect("XYValue"), Delimiter::Comma);
    }

    #[test]
    fn test_tokenize_semicolon_file() {
        let table = tokenize("X;Y;Value;Size\n1;1;0;10\n1;2;3,5;12\n").unwrap();
        assert_eq!(table.delimiter, Delimiter::Semicolon);
        assert_eq!(table.header, vec!["X", "Y", "Value", "Size"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].fields, vec!["1", "2", "3,5", "12"]);
        assert_eq!(table.rows[1].line, 3);
    }

    #[test]
    fn test_tokenize_skips_blank_rows() {
        let table = tokenize("X,Y,Value\n1,1,2\n\n , ,\n2,2,3\n").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.skipped_blank >= 1);
        assert_eq!(table.rows[1].get(2), Some("3"));
    }

    #[test]
    fn test_tokenize_tolerates_ragged_rows() {
        let table = tokenize("X\tY\tValue\tSize\n1\t2\n1\t2\t3\t4\t5\t6\n").unwrap();
        assert_eq!(table.delimiter, Delimiter::Tab);
        assert_eq!(table.rows[0].fields.len(), 2);
        assert_eq!(table.rows[1].fields.len(), 6);
        assert_eq!(table.rows[0].get(2), None);
    }

    #[test]
    fn test_tokenize_header_only() {
        let table = tokenize("X,Y,Value\n").unwrap();
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_tokenize_strips_bom() {
        let table = tokenize("\u{feff}X,Y,Value\n1,1,1\n").unwrap();
        assert_eq!(table.header[0], "X");
    }

    #[test]
    fn test_tokenize_empty_text() {
        assert!(matches!(tokenize(""), Err(TokenizeError::Empty)));
    }

    #[test]
    fn test_tokenize_short_header() {
        match tokenize("X;Y\n1;2\n") {
            Err(TokenizeError::ShortHeader { found }) => assert_eq!(found, 2),
            other => panic!("Expected ShortHeader error, got {:?}", other),
        }
    }
}
