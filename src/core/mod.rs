//! Core data types, parsing stages and I/O.

pub mod corpus;
pub mod document;
pub mod grid;
pub mod loaders;
pub mod record;
pub mod tokenizer;
pub mod writers;

pub use corpus::{Corpus, CorpusError, Extents, Labels};
pub use document::{Meta, Output};
pub use grid::SliceData;
pub use loaders::{LoaderError, Slice};
pub use record::{Observation, ParseMode, Parsed};
pub use writers::{write_json, WriteError};
