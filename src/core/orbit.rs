//! Stage 1: precise orbit correction.

use std::path::{Path, PathBuf};

use crate::core::gpt::GptInvocation;
use crate::types::FloodResult;

/// Applies the precise orbit model to a raw GRD archive.
///
/// This is the only stage that reads the product archive directly; every
/// later stage consumes its predecessor's BEAM-DIMAP output.
pub struct OrbitCorrection;

impl OrbitCorrection {
    pub const SUFFIX: &'static str = "_OB";

    pub fn invocation(working_dir: &Path, granule: &str, archive: &Path) -> GptInvocation {
        GptInvocation::new(
            "Apply-Orbit-File",
            working_dir.join(format!("{}{}", granule, Self::SUFFIX)),
        )
        .param("-PcontinueOnFail=false")
        .param("-PorbitType=Sentinel Precise (Auto Download)")
        .param(archive.to_string_lossy().into_owned())
    }

    /// Run the orbit correction, returning the path of its output product.
    pub fn apply(
        gpt: &Path,
        working_dir: &Path,
        granule: &str,
        archive: &Path,
    ) -> FloodResult<PathBuf> {
        log::info!("Applying precise orbit file to {}", granule);
        Self::invocation(working_dir, granule, archive).run(gpt)?;
        Ok(working_dir.join(format!("{}{}.dim", granule, Self::SUFFIX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_target_is_granule_ob() {
        let inv = OrbitCorrection::invocation(Path::new("/work"), "G", Path::new("/data/G.zip"));
        assert_eq!(inv.target(), Path::new("/work/G_OB"));

        let args = inv.args();
        assert_eq!(args[0], "Apply-Orbit-File");
        assert!(args.contains(&"-PcontinueOnFail=false".to_string()));
        assert!(args.contains(&"-PorbitType=Sentinel Precise (Auto Download)".to_string()));
        assert_eq!(args.last().unwrap(), "/data/G.zip");
    }
}
