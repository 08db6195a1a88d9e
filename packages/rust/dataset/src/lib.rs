//! Tabular dataset model, loading, and persistence.
//!
//! This crate provides:
//! - [`Dataset`]: an ordered, row-addressable table of [`Value`] cells
//! - [`load_dataset`]: CSV or spreadsheet input, coordinate columns guaranteed
//! - [`write_outputs`]: the CSV + xlsx pair written after enrichment
//!
//! [`Value`]: coursegeo_shared::Value

pub mod loader;
pub mod table;
pub mod writer;

pub use loader::{SourceFormat, load_dataset};
pub use table::Dataset;
pub use writer::{write_csv, write_outputs, write_xlsx};
