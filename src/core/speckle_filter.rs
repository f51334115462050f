//! Stage 4: speckle filtering.

use std::path::{Path, PathBuf};

use crate::core::gpt::GptInvocation;
use crate::types::FloodResult;

/// Despeckling filter variants supported by the processing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeckleFilterType {
    Boxcar,
    Median,
    Frost,
    GammaMap,
    Lee,
    /// Refined Lee, the variant used for flood-mapping preprocessing
    RefinedLee,
    LeeSigma,
}

impl SpeckleFilterType {
    /// Filter name as spelled in the tool's `-Pfilter` parameter.
    pub fn tool_name(&self) -> &'static str {
        match self {
            SpeckleFilterType::Boxcar => "Boxcar",
            SpeckleFilterType::Median => "Median",
            SpeckleFilterType::Frost => "Frost",
            SpeckleFilterType::GammaMap => "Gamma Map",
            SpeckleFilterType::Lee => "Lee",
            SpeckleFilterType::RefinedLee => "Refined Lee",
            SpeckleFilterType::LeeSigma => "Lee Sigma",
        }
    }
}

impl Default for SpeckleFilterType {
    fn default() -> Self {
        SpeckleFilterType::RefinedLee
    }
}

/// Applies a despeckling filter to the calibrated product.
pub struct SpeckleFilter {
    filter: SpeckleFilterType,
}

impl SpeckleFilter {
    pub const SUFFIX: &'static str = "_OB_GBN_CAL_SP";

    /// Create a speckle filter with the default (Refined Lee) variant
    pub fn new() -> Self {
        Self::with_filter(SpeckleFilterType::default())
    }

    pub fn with_filter(filter: SpeckleFilterType) -> Self {
        SpeckleFilter { filter }
    }

    pub fn invocation(&self, working_dir: &Path, granule: &str, input: &Path) -> GptInvocation {
        GptInvocation::new(
            "Speckle-Filter",
            working_dir.join(format!("{}{}", granule, Self::SUFFIX)),
        )
        .param(format!("-Pfilter={}", self.filter.tool_name()))
        .param(format!("-Ssource={}", input.display()))
    }

    /// Run the speckle filter on the calibrated product.
    pub fn apply(
        &self,
        gpt: &Path,
        working_dir: &Path,
        granule: &str,
        input: &Path,
    ) -> FloodResult<PathBuf> {
        log::info!(
            "Applying {} speckle filter to {}",
            self.filter.tool_name(),
            granule
        );
        self.invocation(working_dir, granule, input).run(gpt)?;
        Ok(working_dir.join(format!("{}{}.dim", granule, Self::SUFFIX)))
    }
}

impl Default for SpeckleFilter {
    fn default() -> Self {
        Self::new()
    }
}
