//! Stage 5: range-Doppler terrain correction.

use std::path::{Path, PathBuf};

use crate::core::gpt::GptInvocation;
use crate::types::FloodResult;

/// Name of the built-in global 1-arc-second elevation source.
pub const DEFAULT_DEM_NAME: &str = "SRTM 1Sec HGT";

/// Elevation model used by the terrain correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemSource {
    /// The tool's built-in global 1-arc-second source
    Srtm1Sec,
    /// A caller-supplied elevation raster
    External(PathBuf),
}

impl DemSource {
    pub fn from_option(external: Option<PathBuf>) -> Self {
        match external {
            Some(path) => DemSource::External(path),
            None => DemSource::Srtm1Sec,
        }
    }

    fn params(&self) -> Vec<String> {
        match self {
            DemSource::Srtm1Sec => vec![format!("-PdemName={}", DEFAULT_DEM_NAME)],
            DemSource::External(path) => vec![
                "-PdemName=External DEM".to_string(),
                format!("-PexternalDEMFile={}", path.display()),
                "-PexternalDEMNoDataValue=0".to_string(),
            ],
        }
    }
}

/// Geocodes the speckle-filtered product to map geometry.
///
/// Alongside the corrected amplitude bands the tool always emits the
/// incidence-angle-from-ellipsoid raster, which the flood classifiers
/// downstream require.
pub struct TerrainCorrection {
    pub pixel_spacing: f64,
    pub dem: DemSource,
}

impl TerrainCorrection {
    pub const SUFFIX: &'static str = "_OB_GBN_CAL_SP_TC";

    pub fn new(pixel_spacing: f64, dem: DemSource) -> Self {
        TerrainCorrection { pixel_spacing, dem }
    }

    pub fn invocation(&self, working_dir: &Path, granule: &str, input: &Path) -> GptInvocation {
        let mut inv = GptInvocation::new(
            "Terrain-Correction",
            working_dir.join(format!("{}{}", granule, Self::SUFFIX)),
        )
        .param(format!("-Ssource={}", input.display()))
        .param("-PsaveDEM=false")
        .param("-PsaveIncidenceAngleFromEllipsoid=true")
        .param(format!("-PpixelSpacingInMeter={}", self.pixel_spacing));
        for p in self.dem.params() {
            inv = inv.param(p);
        }
        inv
    }

    /// Run the terrain correction, returning the final `.dim` product path.
    pub fn apply(
        &self,
        gpt: &Path,
        working_dir: &Path,
        granule: &str,
        input: &Path,
    ) -> FloodResult<PathBuf> {
        log::info!(
            "Applying terrain correction to {} at {} m -- this will take some time",
            granule,
            self.pixel_spacing
        );
        self.invocation(working_dir, granule, input).run(gpt)?;
        Ok(working_dir.join(format!("{}{}.dim", granule, Self::SUFFIX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dem_source_is_named_not_pathed() {
        let tc = TerrainCorrection::new(10.0, DemSource::Srtm1Sec);
        let args = tc
            .invocation(Path::new("/work"), "G", Path::new("/work/G_OB_GBN_CAL_SP.dim"))
            .args();
        assert!(args.contains(&format!("-PdemName={}", DEFAULT_DEM_NAME)));
        assert!(!args.iter().any(|a| a.starts_with("-PexternalDEMFile=")));
        assert!(args.contains(&"-PpixelSpacingInMeter=10".to_string()));
    }

    #[test]
    fn external_dem_replaces_the_builtin_source() {
        let tc = TerrainCorrection::new(30.0, DemSource::External(PathBuf::from("/dem/huc8.tif")));
        let args = tc
            .invocation(Path::new("/work"), "G", Path::new("/work/G_OB_GBN_CAL_SP.dim"))
            .args();
        assert!(args.contains(&"-PdemName=External DEM".to_string()));
        assert!(args.contains(&"-PexternalDEMFile=/dem/huc8.tif".to_string()));
        assert!(args.contains(&"-PexternalDEMNoDataValue=0".to_string()));
        assert!(!args.contains(&format!("-PdemName={}", DEFAULT_DEM_NAME)));
    }

    #[test]
    fn target_carries_the_full_suffix_chain() {
        let tc = TerrainCorrection::new(10.0, DemSource::Srtm1Sec);
        let inv = tc.invocation(Path::new("/work"), "G", Path::new("/work/G_OB_GBN_CAL_SP.dim"));
        assert_eq!(inv.target(), Path::new("/work/G_OB_GBN_CAL_SP_TC"));
    }
}
