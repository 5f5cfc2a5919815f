//! Grid CSV ingestion and normalization for time-sliced heatmaps.
//!
//! This crate provides tools for:
//! - Detecting the delimiter of each input file and splitting it into rows
//! - Tolerant parsing of rows into grid observations
//! - Aggregating all slices into global extents and value/size ranges
//! - Materializing a dense grid and a sparse point list per slice
//! - Writing the resulting document as JSON or into an HTML template
//!
//! # Example
//!
//! ```no_run
//! use grovegrid::{core::corpus::ingest_dir, core::document::Output, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::default();
//! let corpus = ingest_dir(Path::new("data"), &config.ingest).unwrap();
//! let output = Output::assemble(&corpus, &config.render, "2025-01-01T00:00:00Z".into());
//! println!("{} slices", output.datasets.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;

pub use config::{IngestConfig, PipelineConfig, RenderConfig};
pub use crate::core::corpus::{Corpus, Labels};
pub use crate::core::loaders::Slice;
pub use crate::core::record::Observation;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
