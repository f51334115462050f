//! Band extraction and per-granule cleanup.
//!
//! After terrain correction the product lives in the tool's native
//! BEAM-DIMAP layout (`<name>.dim` header plus a `<name>.data` directory of
//! `.img` band rasters). The two sigma-nought polarization bands and the
//! incidence-angle raster are converted to GeoTIFF, then everything outside
//! the four-file keep-list is deleted and the keepers move to the shared
//! final directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::gpt::run_tool;
use crate::core::terrain_correction::TerrainCorrection;
use crate::types::{FloodResult, Polarization};

/// Convert one raster to GeoTIFF via the external converter.
pub fn translate_to_gtiff(gdal_translate: &Path, src: &Path, dst: &Path) -> FloodResult<()> {
    let args = vec![
        "-of".to_string(),
        "GTiff".to_string(),
        src.to_string_lossy().into_owned(),
        dst.to_string_lossy().into_owned(),
    ];
    run_tool(gdal_translate, &args)
}

/// Extract the sigma-nought bands and the incidence-angle raster from the
/// terrain-corrected `.data` directory into GeoTIFFs next to the product.
///
/// Returns the paths of the three converted rasters.
pub fn sigma0_to_gtiff(
    gdal_translate: &Path,
    working_dir: &Path,
    data_dir: &Path,
    granule: &str,
) -> FloodResult<Vec<PathBuf>> {
    let mut converted = Vec::new();
    for pol in [Polarization::VH, Polarization::VV] {
        let src = data_dir.join(format!("Sigma0_{}.img", pol));
        let dst = working_dir.join(format!("{}_Sigma0_{}.tif", granule, pol));
        translate_to_gtiff(gdal_translate, &src, &dst)?;
        converted.push(dst);
    }

    let src = data_dir.join("incidenceAngleFromEllipsoid.img");
    let dst = working_dir.join(format!("{}_incidenceAngleFromEllipsoid.tif", granule));
    log::info!("Incidence angle outfile: {}", dst.display());
    translate_to_gtiff(gdal_translate, &src, &dst)?;
    converted.push(dst);

    Ok(converted)
}

/// The four files a successful granule run keeps, in `dir`.
pub fn keep_list(dir: &Path, granule: &str) -> [PathBuf; 4] {
    [
        dir.join(format!("{}{}.dim", granule, TerrainCorrection::SUFFIX)),
        dir.join(format!("{}_Sigma0_VH.tif", granule)),
        dir.join(format!("{}_Sigma0_VV.tif", granule)),
        dir.join(format!("{}_incidenceAngleFromEllipsoid.tif", granule)),
    ]
}

/// Delete everything in the working directory outside the keep-list, move
/// the keepers into the final directory, and remove the working tree.
///
/// Any moved file still in the native `.img` format gets an opportunistic
/// GeoTIFF conversion on the way out.
pub fn clean_dirs(
    working_dir: &Path,
    final_dir: &Path,
    granule: &str,
    gdal_translate: &Path,
) -> FloodResult<()> {
    let keep = keep_list(working_dir, granule);
    let keep_out = keep_list(final_dir, granule);

    let mut files = Vec::new();
    collect_files(working_dir, &mut files)?;
    for file in &files {
        if !keep.contains(file) {
            fs::remove_file(file)?;
        }
    }

    fs::create_dir_all(final_dir)?;

    for (file, file_out) in keep.iter().zip(keep_out.iter()) {
        if !file.is_file() {
            continue;
        }
        move_file(file, file_out)?;
        if file_out.extension().map_or(false, |e| e == "img") {
            let dst = file_out.with_extension("tif");
            translate_to_gtiff(gdal_translate, file_out, &dst)?;
        }
    }

    fs::remove_dir_all(working_dir)?;
    Ok(())
}

/// Recursively gather every file under `dir`.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> FloodResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Rename, falling back to copy-and-delete across filesystems.
fn move_file(src: &Path, dst: &Path) -> FloodResult<()> {
    if fs::rename(src, dst).is_err() {
        fs::copy(src, dst)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_list_names_the_four_final_artifacts() {
        let keep = keep_list(Path::new("/out/final"), "G");
        assert_eq!(keep[0], Path::new("/out/final/G_OB_GBN_CAL_SP_TC.dim"));
        assert_eq!(keep[1], Path::new("/out/final/G_Sigma0_VH.tif"));
        assert_eq!(keep[2], Path::new("/out/final/G_Sigma0_VV.tif"));
        assert_eq!(
            keep[3],
            Path::new("/out/final/G_incidenceAngleFromEllipsoid.tif")
        );
    }

    #[test]
    fn cleanup_removes_everything_but_the_keep_list() {
        let tmp = tempfile::tempdir().unwrap();
        let wd = tmp.path().join("G_Processed");
        let final_dir = tmp.path().join("final");
        fs::create_dir_all(wd.join("G_OB_GBN_CAL_SP_TC.data")).unwrap();

        for name in [
            "G_OB.dim",
            "G_OB_GBN.dim",
            "G_OB_GBN_CAL_SP_TC.dim",
            "G_Sigma0_VH.tif",
            "G_Sigma0_VV.tif",
            "G_incidenceAngleFromEllipsoid.tif",
        ] {
            fs::write(wd.join(name), b"x").unwrap();
        }
        fs::write(wd.join("G_OB_GBN_CAL_SP_TC.data/Sigma0_VV.img"), b"x").unwrap();

        clean_dirs(&wd, &final_dir, "G", Path::new("/usr/bin/true")).unwrap();

        assert!(!wd.exists());
        let mut names: Vec<_> = fs::read_dir(&final_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "G_OB_GBN_CAL_SP_TC.dim",
                "G_Sigma0_VH.tif",
                "G_Sigma0_VV.tif",
                "G_incidenceAngleFromEllipsoid.tif"
            ]
        );
    }
}
