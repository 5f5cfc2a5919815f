//! Loading of slice files from disk.
//!
//! A slice is one delimited text file: its name is the file stem and its
//! rows are grid observations. Structural problems (unreadable file, no
//! rows, short header) are errors; field-level problems are not, unless
//! strict parsing is requested.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use super::record::{parse_row, Observation, ParseMode, RecordError};
use super::tokenizer::{tokenize, Delimiter, TokenizeError};

/// Errors from parsing the text of one slice.
#[derive(Error, Debug)]
pub enum SliceError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Errors that can occur while loading a slice file.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: SliceError,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One input file: a named point on the timeline.
#[derive(Debug, Clone)]
pub struct Slice {
    /// File name without extension.
    pub name: String,
    /// Raw header fields, untrimmed.
    pub header: Vec<String>,
    /// Observations in source order.
    pub observations: Vec<Observation>,
    pub delimiter: Delimiter,
}

impl Slice {
    /// Returns the number of observations in this slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns true if the slice has no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Slice name for a path: the file name without its extension.
pub fn slice_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Parse the full text of one slice.
pub fn parse_slice(
    name: impl Into<String>,
    text: &str,
    mode: ParseMode,
) -> std::result::Result<Slice, SliceError> {
    let table = tokenize(text)?;

    let mut observations = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        observations.push(parse_row(&table.header, row, mode)?);
    }

    let name = name.into();
    if table.skipped_blank > 0 {
        debug!("{}: skipped {} blank rows", name, table.skipped_blank);
    }

    Ok(Slice {
        name,
        header: table.header,
        observations,
        delimiter: table.delimiter,
    })
}

/// Load one slice file.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns [`LoaderError::Io`] if the file cannot be read and
/// [`LoaderError::Parse`] for structural or strict-mode parse failures.
pub fn load_slice<P: AsRef<Path>>(path: P, mode: ParseMode) -> Result<Slice> {
    let path = path.as_ref();

    let bytes = fs::read(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let slice = parse_slice(slice_name(path), &text, mode).map_err(|e| LoaderError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(
        "Loaded {}: {} observations, {} columns, {:?} delimiter",
        path.display(),
        slice.len(),
        slice.header.len(),
        slice.delimiter
    );

    Ok(slice)
}

/// List slice files in `directory` with the given extension, sorted by path.
///
/// The extension is compared case-insensitively. Subdirectories are ignored.
pub fn find_slice_files(directory: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::NO_DATA;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_parse_slice() {
        let slice = parse_slice("2025-01", "X;Y;Value;Size\n1;1;0;10\n1;2;;12\n", ParseMode::Lenient)
            .unwrap();

        assert_eq!(slice.name, "2025-01");
        assert_eq!(slice.delimiter, Delimiter::Semicolon);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.observations[0].value, 0.0);
        assert_eq!(slice.observations[1].value, NO_DATA);
    }

    #[test]
    fn test_parse_slice_keeps_duplicates_in_order() {
        let slice = parse_slice("d", "X,Y,Value\n1,1,5\n1,1,6\n", ParseMode::Lenient).unwrap();
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.observations[1].value, 6.0);
    }

    #[test]
    fn test_parse_slice_strict_failure() {
        let result = parse_slice("s", "X,Y,Value\n1,1,oops\n", ParseMode::Strict);
        assert!(matches!(result, Err(SliceError::Record(_))));
    }

    #[test]
    fn test_load_slice() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Row\tTree\tYield\tHeight\tVariety").unwrap();
        writeln!(file, "1\t1\t12,5 kg\t3\tGala").unwrap();
        writeln!(file, "1\t2\t\t\t").unwrap();
        writeln!(file, "2\t1\t7\t4\tFuji").unwrap();
        file.flush().unwrap();

        let slice = load_slice(file.path(), ParseMode::Lenient)?;
        assert_eq!(slice.delimiter, Delimiter::Tab);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice.observations[0].value, 12.5);
        assert_eq!(slice.observations[1].value, NO_DATA);
        assert_eq!(
            slice.observations[2].extras.get("Variety").map(String::as_str),
            Some("Fuji")
        );

        Ok(())
    }

    #[test]
    fn test_load_slice_short_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "X,Y").unwrap();
        writeln!(file, "1,2").unwrap();
        file.flush().unwrap();

        match load_slice(file.path(), ParseMode::Lenient) {
            Err(LoaderError::Parse {
                source: SliceError::Tokenize(TokenizeError::ShortHeader { found }),
                ..
            }) => assert_eq!(found, 2),
            other => panic!("Expected ShortHeader error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_slice_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let result = load_slice(file.path(), ParseMode::Lenient);
        assert!(matches!(
            result,
            Err(LoaderError::Parse {
                source: SliceError::Tokenize(TokenizeError::Empty),
                ..
            })
        ));
    }

    #[test]
    fn test_load_slice_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_slice(dir.path().join("absent.csv"), ParseMode::Lenient);
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }

    #[test]
    fn test_slice_name() {
        assert_eq!(slice_name(Path::new("data/2025-03.csv")), "2025-03");
        assert_eq!(slice_name(Path::new("plain")), "plain");
    }

    #[test]
    fn test_find_slice_files() {
        let dir = TempDir::new().unwrap();
        for name in ["b.csv", "a.CSV", "notes.txt", "c.csv"] {
            fs::write(dir.path().join(name), "X,Y,Value\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = find_slice_files(dir.path(), "csv").unwrap();
        let names: Vec<String> = files.iter().map(|p| slice_name(p)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
