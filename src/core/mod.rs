//! Core GRD preprocessing modules

pub mod gpt;
pub mod orbit;
pub mod border_noise;
pub mod calibrate;
pub mod speckle_filter;
pub mod terrain_correction;
pub mod export;
pub mod pipeline;

// Re-export main types
pub use gpt::GptInvocation;
pub use orbit::OrbitCorrection;
pub use border_noise::BorderNoiseRemoval;
pub use calibrate::Calibration;
pub use speckle_filter::{SpeckleFilter, SpeckleFilterType};
pub use terrain_correction::{DemSource, TerrainCorrection};
pub use pipeline::GrdPipeline;
