//! The GRD preprocessing batch driver.
//!
//! Granules run strictly one at a time, in input order, each through the
//! fixed five-stage chain (orbit correction, border-noise removal,
//! calibration, speckle filtering, terrain correction) followed by band
//! extraction and cleanup. A stage failure aborts the batch and leaves the
//! granule's partial working directory on disk for inspection; restart
//! granularity is the whole granule, never a single stage.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::core::border_noise::BorderNoiseRemoval;
use crate::core::calibrate::Calibration;
use crate::core::export;
use crate::core::orbit::OrbitCorrection;
use crate::core::speckle_filter::SpeckleFilter;
use crate::core::terrain_correction::{DemSource, TerrainCorrection};
use crate::types::{FloodError, FloodResult, Granule};

/// Sequential preprocessing pipeline for a batch of GRD archives.
pub struct GrdPipeline {
    config: PipelineConfig,
    work_dir: PathBuf,
    final_dir: PathBuf,
    speckle_filter: SpeckleFilter,
}

impl GrdPipeline {
    /// Build a pipeline writing working directories under `work_dir` and
    /// finished products into `save_dir/final`.
    pub fn new(config: PipelineConfig, save_dir: &Path, work_dir: Option<&Path>) -> Self {
        let work_dir = work_dir.unwrap_or(save_dir).to_path_buf();
        let final_dir = save_dir.join("final");
        GrdPipeline {
            config,
            work_dir,
            final_dir,
            speckle_filter: SpeckleFilter::new(),
        }
    }

    /// Where finished products end up.
    pub fn final_dir(&self) -> &Path {
        &self.final_dir
    }

    /// The working directory a granule gets, exclusive to it for the whole
    /// run and removed on success.
    pub fn working_dir(&self, granule: &str) -> PathBuf {
        self.work_dir.join(format!("{}_Processed", granule))
    }

    /// Whether a granule already has preprocessed output, in either its
    /// working directory or the shared final directory.
    pub fn is_processed(&self, granule: &str) -> bool {
        if self
            .final_dir
            .join(format!("{}_Sigma0_VV.tif", granule))
            .is_file()
        {
            return true;
        }
        has_vv_artifact(&self.working_dir(granule))
    }

    /// Run one granule through all five stages, extraction, and cleanup.
    pub fn process_granule(&self, archive: &Path) -> FloodResult<()> {
        let granule = Granule::from_archive(archive)?;
        let name = granule.name.as_str();
        let gpt = self.config.gpt.as_path();

        let working_dir = self.working_dir(name);
        fs::create_dir_all(&working_dir)?;

        let orbit_corrected = OrbitCorrection::apply(gpt, &working_dir, name, archive)?;
        let denoised = BorderNoiseRemoval::apply(gpt, &working_dir, name, &orbit_corrected)?;
        let calibrated = Calibration::apply(gpt, &working_dir, name, &denoised)?;
        let filtered = self
            .speckle_filter
            .apply(gpt, &working_dir, name, &calibrated)?;

        let tc = TerrainCorrection::new(
            self.config.pixel_spacing,
            DemSource::from_option(self.config.external_dem.clone()),
        );
        let corrected = tc.apply(gpt, &working_dir, name, &filtered)?;

        let data_dir = corrected.with_extension("data");
        export::sigma0_to_gtiff(
            &self.config.gdal_translate,
            &working_dir,
            &data_dir,
            name,
        )?;
        export::clean_dirs(
            &working_dir,
            &self.final_dir,
            name,
            &self.config.gdal_translate,
        )?;
        Ok(())
    }

    /// Process every archive in input order, skipping granules that already
    /// have output. Returns the number actually processed.
    pub fn process_batch(&self, archives: &[PathBuf]) -> FloodResult<usize> {
        if archives.is_empty() {
            return Err(FloodError::InvalidInput(
                "no GRD archives to process".to_string(),
            ));
        }
        for archive in archives {
            if !archive.is_file() {
                return Err(FloodError::InvalidInput(format!(
                    "archive does not exist: {}",
                    archive.display()
                )));
            }
        }

        let batch_start = Instant::now();
        let total = archives.len();
        let mut processed = 0;

        for (idx, archive) in archives.iter().enumerate() {
            log::info!("Processing GRD file {} / {}", idx + 1, total);
            let granule = Granule::from_archive(archive)?;
            if self.is_processed(&granule.name) {
                log::info!("{} already has output files...skipping", archive.display());
                continue;
            }
            let start = Instant::now();
            self.process_granule(archive)?;
            processed += 1;
            log::info!(
                "Complete, took {:.1} seconds",
                start.elapsed().as_secs_f64()
            );
        }

        log::info!(
            "Process complete, took {:.1} seconds",
            batch_start.elapsed().as_secs_f64()
        );
        Ok(processed)
    }
}

/// True if `dir` holds any file whose name mentions the VV band.
fn has_vv_artifact(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return false,
    };
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().contains("VV") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvSettings;

    fn test_pipeline(save_dir: &Path) -> GrdPipeline {
        let settings = EnvSettings {
            snap_bin_gpt: PathBuf::from("/opt/snap/bin/gpt"),
            gdal_translate_bin: PathBuf::from("/usr/local/bin/gdal_translate"),
            gdal_merge_bin: PathBuf::from("gdal_merge.py"),
        };
        GrdPipeline::new(PipelineConfig::new(&settings), save_dir, None)
    }

    #[test]
    fn working_dir_is_scoped_to_the_granule() {
        let p = test_pipeline(Path::new("/out"));
        assert_eq!(p.working_dir("G"), Path::new("/out/G_Processed"));
        assert_eq!(p.final_dir(), Path::new("/out/final"));
    }

    #[test]
    fn finished_granules_are_detected_in_the_final_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let p = test_pipeline(tmp.path());
        assert!(!p.is_processed("G"));

        fs::create_dir_all(p.final_dir()).unwrap();
        fs::write(p.final_dir().join("G_Sigma0_VV.tif"), b"x").unwrap();
        assert!(p.is_processed("G"));
    }

    #[test]
    fn half_finished_working_dirs_are_detected_too() {
        let tmp = tempfile::tempdir().unwrap();
        let p = test_pipeline(tmp.path());

        let wd = p.working_dir("G");
        fs::create_dir_all(&wd).unwrap();
        assert!(!p.is_processed("G"));
        fs::write(wd.join("G_Sigma0_VV.tif"), b"x").unwrap();
        assert!(p.is_processed("G"));
    }

    #[test]
    fn empty_batch_is_rejected_before_any_invocation() {
        let p = test_pipeline(Path::new("/out"));
        assert!(matches!(
            p.process_batch(&[]),
            Err(FloodError::InvalidInput(_))
        ));
    }
}
