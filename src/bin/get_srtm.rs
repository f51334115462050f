//! Download SRTM 1-arc-second elevation tiles covering a region and merge
//! them into a single GeoTIFF for terrain correction.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;

use floodsar::config::EnvSettings;
use floodsar::io::credentials::Credentials;
use floodsar::io::dem::{self, SrtmDownloader};
use floodsar::io::region;

#[derive(Parser)]
#[command(name = "get_srtm", version, about = "Download SRTM elevation for a region")]
struct Cli {
    /// Region of interest: GeoJSON or WKT polygon file (EPSG:4326)
    extent: PathBuf,

    /// Path for the merged DEM file (defaults to <extent>_DEM.tif)
    #[arg(short = 'd', long)]
    save_path: Option<PathBuf>,

    /// Tile cache directory (defaults to ~/elevation)
    #[arg(short = 'a', long)]
    cache_dir: Option<PathBuf>,

    /// Software-environment settings file naming the merge tool
    #[arg(short = 's', long)]
    env_setting: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let save_path = match &cli.save_path {
        Some(path) => path.clone(),
        None => {
            let stem = cli
                .extent
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "region".to_string());
            env::current_dir()?.join(format!("{}_DEM.tif", stem))
        }
    };
    log::info!("download SRTM1, will save to {}", save_path.display());
    if save_path.is_file() {
        log::warn!("{} already exists, skip", save_path.display());
        return Ok(());
    }

    let polygons = region::read_region_polygons(&cli.extent)
        .with_context(|| format!("reading region {}", cli.extent.display()))?;
    if polygons.len() != 1 {
        bail!("currently, only one extent polygon is supported");
    }
    let bounds = region::region_bounds(&polygons[0])?;

    let gdal_merge = match &cli.env_setting {
        Some(path) => EnvSettings::from_file(path)?.gdal_merge_bin,
        None => PathBuf::from("gdal_merge.py"),
    };

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("elevation")
    });

    let credentials = Credentials::earthdata(None, None)?;
    let downloader = SrtmDownloader::new(&cache_dir)?;

    let tiles = dem::tiles_for_bounds(&bounds);
    log::info!("region needs {} SRTM tiles", tiles.len());
    let archives = downloader.download_tiles(&tiles, &credentials)?;
    let hgt_files = downloader.unpack_tiles(&archives)?;
    dem::merge_tiles(&gdal_merge, &hgt_files, &save_path)?;

    // the zipped tiles stay cached; the unpacked rasters are only needed
    // for the merge
    for hgt in &hgt_files {
        let _ = fs::remove_file(hgt);
    }

    log::info!("merged DEM written to {}", save_path.display());
    Ok(())
}
