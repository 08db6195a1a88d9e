//! Enrichment pipeline orchestration for coursegeo.
//!
//! This crate ties together dataset loading, geocoding, and output writing
//! into end-to-end workflows (`run_pipeline`, `fetch_courses`).

pub mod fetch;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;
