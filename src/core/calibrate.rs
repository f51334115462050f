//! Stage 3: radiometric calibration to sigma nought.

use std::path::{Path, PathBuf};

use crate::core::gpt::GptInvocation;
use crate::types::FloodResult;

/// Calibrates digital numbers to the sigma-nought backscatter coefficient.
///
/// The beta-nought band is explicitly excluded; only sigma nought is carried
/// forward into the speckle filter.
pub struct Calibration;

impl Calibration {
    pub const SUFFIX: &'static str = "_OB_GBN_CAL";

    pub fn invocation(working_dir: &Path, granule: &str, input: &Path) -> GptInvocation {
        GptInvocation::new(
            "Calibration",
            working_dir.join(format!("{}{}", granule, Self::SUFFIX)),
        )
        .param("-PoutputBetaBand=false")
        .param("-PoutputSigmaBand=true")
        .param(format!("-Ssource={}", input.display()))
    }

    /// Run the calibration on the border-noise-removed product.
    pub fn apply(
        gpt: &Path,
        working_dir: &Path,
        granule: &str,
        input: &Path,
    ) -> FloodResult<PathBuf> {
        log::info!("Calibrating {} to sigma nought", granule);
        Self::invocation(working_dir, granule, input).run(gpt)?;
        Ok(working_dir.join(format!("{}{}.dim", granule, Self::SUFFIX)))
    }
}
