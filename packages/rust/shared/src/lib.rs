//! Shared types, error model, and configuration for coursegeo.
//!
//! This crate is the foundation depended on by all other coursegeo crates.
//! It provides:
//! - [`CourseGeoError`]: the unified error type
//! - Domain types ([`Value`], [`GeoPoint`], [`GeocodeMatch`], [`GeocodeResult`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FetchConfig, GeocoderConfig, OutputPaths, PipelineConfig,
    SourceConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CourseGeoError, Result};
pub use types::{
    GeoPoint, GeocodeMatch, GeocodeResult, LATITUDE_COLUMN, LONGITUDE_COLUMN, UnresolvedReason,
    Value,
};
