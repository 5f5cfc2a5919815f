//! The output document handed to the renderer.

use std::collections::BTreeMap;

use chrono::{Local, SecondsFormat};
use serde::Serialize;

use super::corpus::{Corpus, Labels};
use super::grid::{materialize, SliceData};
use crate::config::RenderConfig;

/// Global metadata: extents, scaling ranges, palette and labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub x_max: i64,
    pub y_max: i64,
    pub value_min_pos: f64,
    pub value_max: f64,
    pub zero_color: String,
    #[serde(rename = "nodata_color")]
    pub no_data_color: String,
    pub grad_colors: Vec<String>,
    pub size_min: f64,
    pub size_max: f64,
    /// Slice names in timeline order.
    #[serde(rename = "months")]
    pub slices: Vec<String>,
    pub generated_at: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
    pub title: String,
    pub labels: Labels,
}

impl Meta {
    /// Describe a corpus with the given presentation settings.
    pub fn describe(corpus: &Corpus, render: &RenderConfig, generated_at: String) -> Self {
        let (value_min_pos, value_max) = corpus.extents.value_range();
        let (size_min, size_max) = corpus.extents.size_range();

        Self {
            x_max: corpus.x_max(),
            y_max: corpus.y_max(),
            value_min_pos,
            value_max,
            zero_color: render.zero_color.clone(),
            no_data_color: render.nodata_color.clone(),
            grad_colors: render.grad_colors.clone(),
            size_min,
            size_max,
            slices: corpus.slice_names(),
            generated_at,
            notes: axis_notes(&corpus.labels),
            title: render.title.clone(),
            labels: corpus.labels.clone(),
        }
    }
}

fn axis_notes(labels: &Labels) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("x_axis".to_string(), format!("{} (1..X)", labels.x)),
        ("y_axis".to_string(), format!("{} (1..Y)", labels.y)),
        (
            "value_info".to_string(),
            format!("{}: 0=zero, >0 better; <0 no data", labels.value),
        ),
        ("size_info".to_string(), format!("{}: circle size", labels.size)),
    ])
}

/// Complete document: metadata plus one dataset per slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    pub meta: Meta,
    pub datasets: BTreeMap<String, SliceData>,
}

impl Output {
    /// Materialize every slice of `corpus` against its global extent.
    pub fn assemble(corpus: &Corpus, render: &RenderConfig, generated_at: String) -> Self {
        let datasets = corpus
            .slices
            .iter()
            .map(|slice| {
                (
                    slice.name.clone(),
                    materialize(slice, corpus.x_max(), corpus.y_max()),
                )
            })
            .collect();

        Self {
            meta: Meta::describe(corpus, render, generated_at),
            datasets,
        }
    }
}

/// Current local time as RFC 3339 with second precision.
pub fn timestamp_now() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}
