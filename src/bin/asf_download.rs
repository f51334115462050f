//! Search and download Sentinel-1 GRD products from the Alaska Satellite
//! Facility for one or more regions of interest.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use env_logger::Env;

use floodsar::io::asf::{write_download_log, AsfSearch, SearchParams};
use floodsar::io::credentials::Credentials;
use floodsar::io::region;

#[derive(Parser)]
#[command(
    name = "asf_download",
    version,
    about = "Download data from the Alaska Satellite Facility"
)]
struct Cli {
    /// Region of interest: GeoJSON or WKT polygon file (EPSG:4326)
    extent: PathBuf,

    /// Folder to save downloaded data
    #[arg(short = 'd', long, default_value = "asf_data")]
    save_dir: PathBuf,

    /// Start date for the inquiry, year-month-day
    #[arg(short = 's', long, default_value = "2018-04-30")]
    start_date: NaiveDate,

    /// End date for the inquiry, year-month-day
    #[arg(short = 'e', long, default_value = "2018-06-30")]
    end_date: NaiveDate,

    /// EarthData account (falls back to ASF_API_USER or ~/.netrc)
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Password for the EarthData account
    #[arg(short = 'p', long)]
    password: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let polygons = region::read_region_polygons(&cli.extent)
        .with_context(|| format!("reading region {}", cli.extent.display()))?;
    let credentials = Credentials::earthdata(cli.username.as_deref(), cli.password.as_deref())?;
    let client = AsfSearch::new()?;

    log::info!(
        "download data from ASF, start_date: {}, end_date: {}, user: {}, will save to {}",
        cli.start_date,
        cli.end_date,
        credentials.username,
        cli.save_dir.display()
    );

    for (idx, polygon) in polygons.iter().enumerate() {
        let wkt = region::polygon_to_wkt(polygon);
        let params = SearchParams::grd(wkt, cli.start_date, cli.end_date);
        let results = client.geo_search(&params)?;

        let download_dir = if polygons.len() == 1 {
            cli.save_dir.clone()
        } else {
            cli.save_dir.join(format!("roi_{}", idx))
        };
        client.download(&results, &download_dir, &credentials)?;
        write_download_log(&download_dir, &results)?;
    }

    Ok(())
}
