//! Conversion of tokenized rows into typed observations.
//!
//! Numeric fields are parsed tolerantly: anything that cannot be read
//! degrades to a default instead of failing the row. Every parse reports
//! whether the value was read or defaulted through [`Parsed`], so that a
//! strict caller can reject defaulted fields without a second parser.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use super::tokenizer::Row;

/// Value channel sentinel for "no observation".
pub const NO_DATA: f64 = -1.0;

/// Number of positional columns before the extras start.
pub const FIXED_COLUMNS: usize = 4;

/// First numeric run in a field: optional sign, digits, optional `.`/`,` fraction.
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+(?:[.,][0-9]+)?").expect("numeric pattern is valid"));

/// Positional columns of a grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    X,
    Y,
    Value,
    Size,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::X => "X",
            Column::Y => "Y",
            Column::Value => "Value",
            Column::Size => "Size",
        };
        f.write_str(name)
    }
}

/// Errors raised by strict-mode row parsing.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("line {line}: {column} field {raw:?} is not a number")]
    InvalidField {
        line: u64,
        column: Column,
        raw: String,
    },

    #[error("line {line}: {column} field is missing")]
    MissingField { line: u64, column: Column },
}

/// Result type for record parsing.
pub type Result<T> = std::result::Result<T, RecordError>;

/// How field-level parse failures are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Degrade unparseable fields to their defaults.
    #[default]
    Lenient,
    /// Reject rows with unparseable fields or missing coordinates.
    Strict,
}

/// Outcome of a tolerant parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parsed<T> {
    /// The field held a readable number.
    Value(T),
    /// The field was absent or blank; carries the documented default.
    Missing(T),
    /// The field had content that could not be read; carries the fallback.
    Defaulted(T),
}

impl<T: Copy> Parsed<T> {
    /// The resulting value, whatever the outcome.
    #[inline]
    pub fn get(&self) -> T {
        match *self {
            Parsed::Value(v) | Parsed::Missing(v) | Parsed::Defaulted(v) => v,
        }
    }

    #[inline]
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Parsed::Defaulted(_))
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Parsed::Missing(_))
    }
}

/// Parse an integer coordinate. Absent, blank or unreadable fields yield `0`.
pub fn parse_int(field: Option<&str>) -> Parsed<i64> {
    let Some(raw) = field.map(str::trim) else {
        return Parsed::Missing(0);
    };

    if raw.is_empty() {
        return Parsed::Missing(0);
    }

    raw.parse::<i64>()
        .map_or(Parsed::Defaulted(0), Parsed::Value)
}

/// Tolerant float parsing.
///
/// Extracts the first numeric run from the trimmed field, dropping any unit
/// suffix or surrounding text (`"12,5 cm"` reads as `12.5`), normalizes a
/// comma decimal separator and parses the result. Blank input yields
/// `Missing(0.0)`; unreadable or non-finite input yields `Defaulted(0.0)`.
pub fn parse_float(field: &str) -> Parsed<f64> {
    let raw = field.trim();
    if raw.is_empty() {
        return Parsed::Missing(0.0);
    }

    let candidate = NUMBER.find(raw).map_or(raw, |m| m.as_str());

    match candidate.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => Parsed::Value(v),
        _ => Parsed::Defaulted(0.0),
    }
}

/// One data point of a slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub x: i64,
    pub y: i64,
    /// `-1` means no data; `0` is a measured zero.
    pub value: f64,
    pub size: f64,
    pub extras: BTreeMap<String, String>,
}

impl Observation {
    /// Returns true when the value channel carries a measurement.
    #[inline]
    pub fn has_data(&self) -> bool {
        self.value != NO_DATA
    }
}

/// Convert one tokenized row into an [`Observation`].
///
/// Columns 1 to 4 are X, Y, Value and Size; every later column whose header
/// and row cell both exist becomes an extra keyed by the trimmed header name.
/// An empty Value cell becomes [`NO_DATA`]; a Value cell absent from a short
/// row stays `0`.
///
/// # Errors
///
/// Only in [`ParseMode::Strict`]: unreadable numbers in any column, or a
/// missing X or Y, are reported as [`RecordError`].
pub fn parse_row(header: &[String], row: &Row, mode: ParseMode) -> Result<Observation> {
    let x = parse_int(row.get(0));
    let y = parse_int(row.get(1));

    let value = match row.get(2) {
        None => Parsed::Missing(0.0),
        Some(cell) if cell.trim().is_empty() => Parsed::Missing(NO_DATA),
        Some(cell) => parse_float(cell),
    };

    let size = row.get(3).map_or(Parsed::Missing(0.0), parse_float);

    if mode == ParseMode::Strict {
        check(&x, Column::X, true, row)?;
        check(&y, Column::Y, true, row)?;
        check(&value, Column::Value, false, row)?;
        check(&size, Column::Size, false, row)?;
    } else {
        for (column, defaulted) in [
            (Column::X, x.is_defaulted()),
            (Column::Y, y.is_defaulted()),
            (Column::Value, value.is_defaulted()),
            (Column::Size, size.is_defaulted()),
        ] {
            if defaulted {
                debug!("line {}: unreadable {} field, using 0", row.line, column);
            }
        }
    }

    let extras = header
        .iter()
        .zip(row.fields.iter())
        .skip(FIXED_COLUMNS)
        .map(|(name, cell)| (name.trim().to_string(), cell.trim().to_string()))
        .collect();

    Ok(Observation {
        x: x.get(),
        y: y.get(),
        value: value.get(),
        size: size.get(),
        extras,
    })
}

fn check<T: Copy>(parsed: &Parsed<T>, column: Column, required: bool, row: &Row) -> Result<()> {
    let index = match column {
        Column::X => 0,
        Column::Y => 1,
        Column::Value => 2,
        Column::Size => 3,
    };

    if parsed.is_defaulted() {
        return Err(RecordError::InvalidField {
            line: row.line,
            column,
            raw: row.get(index).unwrap_or_default().to_string(),
        });
    }

    if required && parsed.is_missing() {
        return Err(RecordError::MissingField {
            line: row.line,
            column,
        });
    }

    Ok(())
}
