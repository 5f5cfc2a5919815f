//! Dense and sparse grid views of a slice.
//!
//! The dense grid enumerates every cell of the global extent with `x` as the
//! outer loop and `y` as the inner loop, so cell `(x, y)` sits at index
//! `(x - 1) * y_max + (y - 1)`. Absent cells carry [`NO_DATA`].

use std::collections::HashMap;

use serde::Serialize;

use super::loaders::Slice;
use super::record::{Observation, NO_DATA};

/// Rendered form of one slice: every cell plus the observed points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceData {
    /// `[x, y, value]` for each cell of the global extent.
    pub heat: Vec<[f64; 3]>,
    /// Observations in source order, duplicates included.
    pub points: Vec<Observation>,
}

/// Position of `(x, y)` in a dense grid of height `y_max`.
///
/// Returns `None` for coordinates outside `1..=x_max`, `1..=y_max`.
pub fn cell_index(x: i64, y: i64, x_max: i64, y_max: i64) -> Option<usize> {
    if x < 1 || y < 1 || x > x_max || y > y_max {
        return None;
    }
    let index = (x - 1).checked_mul(y_max)?.checked_add(y - 1)?;
    usize::try_from(index).ok()
}

/// Build the dense grid for one slice's observations.
///
/// The result always has `x_max * y_max` entries. When a coordinate occurs
/// more than once, the last observation wins. Callers bound the extent first
/// (see `Corpus::check_extent`).
pub fn dense_grid(observations: &[Observation], x_max: i64, y_max: i64) -> Vec<[f64; 3]> {
    let present: HashMap<(i64, i64), &Observation> =
        observations.iter().map(|obs| ((obs.x, obs.y), obs)).collect();

    let cells = x_max
        .max(0)
        .checked_mul(y_max.max(0))
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    let mut heat = Vec::with_capacity(cells);

    for x in 1..=x_max {
        for y in 1..=y_max {
            let value = present.get(&(x, y)).map_or(NO_DATA, |obs| obs.value);
            heat.push([x as f64, y as f64, value]);
        }
    }

    heat
}

/// Materialize both views of a slice against the global extent.
pub fn materialize(slice: &Slice, x_max: i64, y_max: i64) -> SliceData {
    SliceData {
        heat: dense_grid(&slice.observations, x_max, y_max),
        points: slice.observations.clone(),
    }
}
