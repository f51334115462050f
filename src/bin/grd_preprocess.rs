//! Pre-process Sentinel-1 GRD archives for flood mapping: precise orbit
//! correction, border-noise removal, sigma-nought calibration, speckle
//! filtering, and range-Doppler terrain correction via ESA SNAP's `gpt`,
//! then band extraction to GeoTIFF.

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

use floodsar::config::{EnvSettings, PipelineConfig, DEFAULT_PIXEL_SPACING};
use floodsar::core::pipeline::GrdPipeline;
use floodsar::io::{grd_file_list, region};
use floodsar::types::FloodError;

#[derive(Parser)]
#[command(
    name = "grd_preprocess",
    version,
    about = "Pre-process SAR GRD files; input a txt file containing a file list or a directory of archives"
)]
struct Cli {
    /// Text file listing GRD archives (one per line) or a directory of
    /// *GRDH*.zip archives
    input: PathBuf,

    /// Folder to save pre-processed results
    #[arg(short = 'd', long, default_value = "asf_data")]
    save_dir: PathBuf,

    /// Where per-granule working directories go (defaults to the save dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Spatial resolution of the output rasters, in meters
    #[arg(short = 'p', long, default_value_t = DEFAULT_PIXEL_SPACING)]
    save_pixel_size: f64,

    /// DEM file used for terrain correction; if not set, SRTM 1 sec is used
    #[arg(short = 'e', long)]
    elevation_file: Option<PathBuf>,

    /// Software-environment settings file
    #[arg(short = 's', long, default_value = "env_setting.json")]
    env_setting: PathBuf,

    /// Region polygon (GeoJSON or WKT file); enables the footprint overlap
    /// filter
    #[arg(long)]
    region: Option<PathBuf>,

    /// Minimum footprint overlap fraction for a granule to be kept
    #[arg(long, default_value_t = region::DEFAULT_MIN_OVERLAP)]
    min_overlap: f64,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        if let FloodError::Tool { tool, output, .. } = &err {
            eprintln!("---- captured {} output ----", tool);
            eprintln!("{}", output);
        }
        eprintln!("Error: {}", err);
        std::process::exit(err.exit_status());
    }
}

fn run(cli: &Cli) -> Result<(), FloodError> {
    let settings = EnvSettings::from_file(&cli.env_setting)?;
    log::info!("setting SNAP gpt: {}", settings.snap_bin_gpt.display());
    log::info!("gdal_translate: {}", settings.gdal_translate_bin.display());

    let mut archives = grd_file_list(&cli.input)?;

    if let Some(region_file) = &cli.region {
        let polygons = region::read_region_polygons(region_file)?;
        let before = archives.len();
        archives = region::filter_by_overlap(&polygons[0], &archives, cli.min_overlap)?;
        log::info!(
            "Overlap filter kept {} of {} archives",
            archives.len(),
            before
        );
    }

    let config = PipelineConfig::new(&settings)
        .pixel_spacing(cli.save_pixel_size)
        .external_dem(cli.elevation_file.clone());
    let pipeline = GrdPipeline::new(config, &cli.save_dir, cli.work_dir.as_deref());
    pipeline.process_batch(&archives)?;
    Ok(())
}
