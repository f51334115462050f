//! Download daily mean gage-height observations from USGS NWIS for the
//! gaging stations inside a region of interest.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use env_logger::Env;

use floodsar::io::nwis::{self, NwisClient};
use floodsar::io::region;

#[derive(Parser)]
#[command(
    name = "get_gage_height",
    version,
    about = "Download daily mean gage height from NWIS"
)]
struct Cli {
    /// Region of interest: GeoJSON or WKT polygon file (EPSG:4326)
    extent: PathBuf,

    /// Path for the readings table (defaults to <extent>_hydro.csv)
    #[arg(short = 'd', long)]
    save_path: Option<PathBuf>,

    /// Start date for the inquiry, year-month-day
    #[arg(short = 's', long, default_value = "2017-08-16")]
    start_date: NaiveDate,

    /// End date for the inquiry, year-month-day
    #[arg(short = 'e', long, default_value = "2017-09-13")]
    end_date: NaiveDate,
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
            env::current_dir()?.join(format!("{}_hydro.csv", stem))
        }
    };
    log::info!(
        "download daily mean gage height (feet), will save to {}",
        save_path.display()
    );

    let polygons = region::read_region_polygons(&cli.extent)
        .with_context(|| format!("reading region {}", cli.extent.display()))?;
    if polygons.len() != 1 {
        bail!("currently, only one extent polygon is supported");
    }
    let bounds = region::region_bounds(&polygons[0])?;

    let client = NwisClient::new()?;
    let sites = client.sites_in_bounds(&bounds)?;
    log::info!("found {} daily-value sites in the region", sites.len());

    let covered = nwis::covering_period(&sites, cli.start_date, cli.end_date);
    log::info!(
        "{} sites cover {} .. {}",
        covered.len(),
        cli.start_date,
        cli.end_date
    );

    let site_numbers: Vec<String> = covered.iter().map(|s| s.site_no.clone()).collect();
    let readings = client.daily_gage_height(&site_numbers, cli.start_date, cli.end_date)?;

    let sites_path = save_path.with_file_name(format!(
        "{}_sites.csv",
        save_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "hydro".to_string())
    ));
    nwis::write_sites_csv(&covered, &sites_path)?;
    log::info!("save site locations to {}", sites_path.display());

    nwis::write_readings_csv(&readings, &save_path)?;
    log::info!("save table to {}", save_path.display());
    Ok(())
}
