//! Tool-environment settings and the pipeline configuration value.
//!
//! The external executables are named once in a small JSON settings file
//! (`env_setting.json`) read before batch start, then threaded through the
//! pipeline as an explicit [`PipelineConfig`] value. Nothing here is
//! process-global, so tests can substitute stub executables freely.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{FloodError, FloodResult};

/// Default output pixel spacing of the terrain-corrected product, in meters.
pub const DEFAULT_PIXEL_SPACING: f64 = 10.0;

/// Software-environment settings naming the external executables.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvSettings {
    /// Path of SNAP's graph processing tool (`gpt`)
    pub snap_bin_gpt: PathBuf,
    /// Path of GDAL's raster converter (`gdal_translate`)
    pub gdal_translate_bin: PathBuf,
    /// Path of GDAL's tile merger, used for assembling downloaded DEM tiles
    #[serde(default = "default_gdal_merge")]
    pub gdal_merge_bin: PathBuf,
}

fn default_gdal_merge() -> PathBuf {
    PathBuf::from("gdal_merge.py")
}

impl EnvSettings {
    /// Read settings from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> FloodResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FloodError::Config(format!("cannot read settings file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            FloodError::Config(format!("malformed settings file {}: {}", path.display(), e))
        })
    }
}

/// Everything the GRD pipeline needs to know about its environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub gpt: PathBuf,
    pub gdal_translate: PathBuf,
    /// Output pixel spacing in meters
    pub pixel_spacing: f64,
    /// External elevation raster; when `None` the terrain correction falls
    /// back to SNAP's built-in global 1-arc-second source.
    pub external_dem: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(settings: &EnvSettings) -> Self {
        PipelineConfig {
            gpt: settings.snap_bin_gpt.clone(),
            gdal_translate: settings.gdal_translate_bin.clone(),
            pixel_spacing: DEFAULT_PIXEL_SPACING,
            external_dem: None,
        }
    }

    pub fn pixel_spacing(mut self, meters: f64) -> Self {
        self.pixel_spacing = meters;
        self
    }

    pub fn external_dem(mut self, dem: Option<PathBuf>) -> Self {
        self.external_dem = dem;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env_setting.json");
        let mut f = fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"snap_bin_gpt": "/opt/snap/bin/gpt", "gdal_translate_bin": "/usr/local/bin/gdal_translate"}}"#
        )
        .unwrap();

        let settings = EnvSettings::from_file(&path).unwrap();
        assert_eq!(settings.snap_bin_gpt, PathBuf::from("/opt/snap/bin/gpt"));
        assert_eq!(
            settings.gdal_translate_bin,
            PathBuf::from("/usr/local/bin/gdal_translate")
        );
        // merge tool falls back to whatever is on PATH
        assert_eq!(settings.gdal_merge_bin, PathBuf::from("gdal_merge.py"));
    }

    #[test]
    fn missing_settings_file_is_a_config_error() {
        let err = EnvSettings::from_file("/nonexistent/env_setting.json").unwrap_err();
        assert!(matches!(err, FloodError::Config(_)));
    }
}
