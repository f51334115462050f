//! FloodSAR: Sentinel-1 GRD acquisition and preprocessing for flood mapping
//!
//! This library wraps the external tooling used in flood-mapping research
//! (ESA SNAP's `gpt` and GDAL's command-line converters) behind a small
//! sequential batch pipeline, and provides clients for the data providers
//! that feed it: the Alaska Satellite Facility search API, LP DAAC SRTM
//! tiles, and the USGS NWIS gage-height service.

pub mod types;
pub mod config;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{FloodError, FloodResult, Granule, Polarization};

pub use config::{EnvSettings, PipelineConfig};
pub use core::pipeline::GrdPipeline;
