//! Aggregation of all slices into one corpus with global extents.
//!
//! Extents are global: the dense grid of every slice spans the maximum
//! coordinates seen in any slice, so every file must be ingested before any
//! grid is materialized.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use super::loaders::{find_slice_files, load_slice, LoaderError, Slice};
use super::record::{Observation, ParseMode, FIXED_COLUMNS};
use crate::config::IngestConfig;

/// Errors that can occur while building a corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("cannot read input directory '{path}': {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error("grid extent {x_max}x{y_max} exceeds the limit of {limit} cells", limit = MAX_GRID_CELLS)]
    ExtentTooLarge { x_max: i64, y_max: i64 },
}

/// Largest dense grid a slice may materialize to.
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Result type for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Running min/max accumulator over an observation stream.
///
/// Value and size ranges only consider strictly positive entries; with no
/// positive entries the range reads as `(0, 0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extents {
    pub x_max: i64,
    pub y_max: i64,
    value: Option<(f64, f64)>,
    size: Option<(f64, f64)>,
}

impl Extents {
    /// Fold one observation into the accumulator.
    pub fn absorb(mut self, obs: &Observation) -> Self {
        self.x_max = self.x_max.max(obs.x);
        self.y_max = self.y_max.max(obs.y);
        if obs.value > 0.0 {
            self.value = Some(widen(self.value, obs.value));
        }
        if obs.size > 0.0 {
            self.size = Some(widen(self.size, obs.size));
        }
        self
    }

    /// Number of cells in the dense grid, or `None` if the product overflows.
    pub fn cell_count(&self) -> Option<usize> {
        let x = usize::try_from(self.x_max.max(0)).ok()?;
        let y = usize::try_from(self.y_max.max(0)).ok()?;
        x.checked_mul(y)
    }

    /// `(min, max)` over positive values.
    pub fn value_range(&self) -> (f64, f64) {
        self.value.unwrap_or((0.0, 0.0))
    }

    /// `(min, max)` over positive sizes.
    pub fn size_range(&self) -> (f64, f64) {
        self.size.unwrap_or((0.0, 0.0))
    }
}

fn widen(range: Option<(f64, f64)>, v: f64) -> (f64, f64) {
    match range {
        Some((lo, hi)) => (lo.min(v), hi.max(v)),
        None => (v, v),
    }
}

/// Column labels taken from the first slice's header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Labels {
    pub x: String,
    pub y: String,
    pub value: String,
    pub size: String,
    pub extras: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            x: "X".to_string(),
            y: "Y".to_string(),
            value: "Value".to_string(),
            size: "Size".to_string(),
            extras: Vec::new(),
        }
    }
}

impl Labels {
    /// Derive labels from a raw header row.
    ///
    /// Positions 1 to 4 name X, Y, Value and Size, keeping the default name
    /// where the header is too short; the remaining columns are the extras.
    pub fn from_header(header: &[String]) -> Self {
        let mut labels = Labels::default();
        let slots = [
            &mut labels.x,
            &mut labels.y,
            &mut labels.value,
            &mut labels.size,
        ];
        for (slot, name) in slots.into_iter().zip(header.iter()) {
            *slot = name.trim().to_string();
        }
        labels.extras = header
            .iter()
            .skip(FIXED_COLUMNS)
            .map(|h| h.trim().to_string())
            .collect();
        labels
    }
}

/// All slices of one run plus their global statistics.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Slices ordered by name.
    pub slices: Vec<Slice>,
    pub extents: Extents,
    pub labels: Labels,
}

impl Corpus {
    /// Build a corpus from slices given in file order.
    ///
    /// Labels come from the first slice and extents cover every slice given.
    /// Slices are then ordered by name; if two files share a name the later
    /// one replaces the earlier.
    pub fn from_slices(slices: Vec<Slice>) -> Self {
        let labels = slices
            .first()
            .map(|s| Labels::from_header(&s.header))
            .unwrap_or_default();

        let extents = slices
            .iter()
            .flat_map(|s| s.observations.iter())
            .fold(Extents::default(), Extents::absorb);

        let mut by_name: BTreeMap<String, Slice> = BTreeMap::new();
        for slice in slices {
            if let Some(previous) = by_name.insert(slice.name.clone(), slice) {
                warn!("Duplicate slice name '{}', keeping the later file", previous.name);
            }
        }
        let slices: Vec<Slice> = by_name.into_values().collect();

        Self {
            slices,
            extents,
            labels,
        }
    }

    #[inline]
    pub fn x_max(&self) -> i64 {
        self.extents.x_max
    }

    #[inline]
    pub fn y_max(&self) -> i64 {
        self.extents.y_max
    }

    /// Ordered slice names.
    pub fn slice_names(&self) -> Vec<String> {
        self.slices.iter().map(|s| s.name.clone()).collect()
    }

    /// Total observations across all slices.
    pub fn observation_count(&self) -> usize {
        self.slices.iter().map(Slice::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Reject extents whose dense grid cannot be materialized.
    pub fn check_extent(&self) -> Result<()> {
        match self.extents.cell_count() {
            Some(cells) if cells <= MAX_GRID_CELLS => Ok(()),
            _ => Err(CorpusError::ExtentTooLarge {
                x_max: self.x_max(),
                y_max: self.y_max(),
            }),
        }
    }
}

/// Ingest every slice file in `directory`.
///
/// Files are loaded one at a time in sorted path order; the first failure
/// aborts the whole ingest.
pub fn ingest_dir(directory: &Path, config: &IngestConfig) -> Result<Corpus> {
    ingest_files(
        find_slice_files(directory, &config.extension).map_err(|e| CorpusError::Directory {
            path: directory.to_path_buf(),
            source: e,
        })?,
        config.parse_mode(),
    )
}

/// Ingest an explicit list of files, sorting them by path first.
pub fn ingest_files(mut files: Vec<PathBuf>, mode: ParseMode) -> Result<Corpus> {
    files.sort();

    let mut slices = Vec::with_capacity(files.len());
    for path in &files {
        slices.push(load_slice(path, mode)?);
    }

    let corpus = Corpus::from_slices(slices);
    corpus.check_extent()?;
    info!(
        "Ingested {} slices, {} observations, extent {}x{}",
        corpus.slices.len(),
        corpus.observation_count(),
        corpus.x_max(),
        corpus.y_max()
    );

    Ok(corpus)
}
