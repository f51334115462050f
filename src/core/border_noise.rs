//! Stage 2: GRD border-noise removal.

use std::path::{Path, PathBuf};

use crate::core::gpt::GptInvocation;
use crate::types::FloodResult;

/// Removes the noisy image border artifacts of GRD products.
pub struct BorderNoiseRemoval;

impl BorderNoiseRemoval {
    pub const SUFFIX: &'static str = "_OB_GBN";

    pub fn invocation(working_dir: &Path, granule: &str, input: &Path) -> GptInvocation {
        GptInvocation::new(
            "Remove-GRD-Border-Noise",
            working_dir.join(format!("{}{}", granule, Self::SUFFIX)),
        )
        .param(format!("-SsourceProduct={}", input.display()))
    }

    /// Run the border-noise removal on the orbit-corrected product.
    pub fn apply(
        gpt: &Path,
        working_dir: &Path,
        granule: &str,
        input: &Path,
    ) -> FloodResult<PathBuf> {
        log::info!("Removing border noise from {}", granule);
        Self::invocation(working_dir, granule, input).run(gpt)?;
        Ok(working_dir.join(format!("{}{}.dim", granule, Self::SUFFIX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_noise_consumes_predecessor_product() {
        let inv =
            BorderNoiseRemoval::invocation(Path::new("/work"), "G", Path::new("/work/G_OB.dim"));
        assert_eq!(inv.target(), Path::new("/work/G_OB_GBN"));
        assert!(inv
            .args()
            .contains(&"-SsourceProduct=/work/G_OB.dim".to_string()));
    }
}
