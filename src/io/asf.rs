//! Alaska Satellite Facility search and download client.
//!
//! Thin wrapper over the ASF search API's `param` endpoint with the
//! `jsonlite` output format. Searches are unauthenticated; product
//! downloads need an EarthData login.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::io::credentials::Credentials;
use crate::types::{FloodError, FloodResult};

/// ASF search API endpoint.
pub const SEARCH_ENDPOINT: &str = "https://api.daac.asf.alaska.edu/services/search/param";

/// One search hit, trimmed to the fields the downloader uses.
#[derive(Debug, Clone, Deserialize)]
pub struct AsfProduct {
    #[serde(rename = "granuleName")]
    pub granule_name: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "sizeMB", default)]
    pub size_mb: Option<f64>,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<AsfProduct>,
}

/// Geographic search parameters, defaulting to the GRD flood-mapping query.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Region of interest as a WKT polygon (lon/lat)
    pub intersects_with: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub platform: String,
    pub processing_level: String,
    pub beam_mode: String,
}

impl SearchParams {
    pub fn grd(intersects_with: String, start: NaiveDate, end: NaiveDate) -> Self {
        SearchParams {
            intersects_with,
            start,
            end,
            platform: "Sentinel-1".to_string(),
            processing_level: "GRD_HD".to_string(),
            beam_mode: "IW".to_string(),
        }
    }
}

/// Blocking ASF search/download client.
pub struct AsfSearch {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl AsfSearch {
    pub fn new() -> FloodResult<Self> {
        Self::with_endpoint(SEARCH_ENDPOINT)
    }

    /// Point the client somewhere else, for tests against a local server.
    pub fn with_endpoint<S: Into<String>>(endpoint: S) -> FloodResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .user_agent(concat!("floodsar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(AsfSearch {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Run a geographic search, returning every matching product.
    pub fn geo_search(&self, params: &SearchParams) -> FloodResult<Vec<AsfProduct>> {
        log::info!("Searching... ... ...");
        let start = params.start.format("%Y-%m-%d").to_string();
        let end = params.end.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("platform", params.platform.as_str()),
                ("processingLevel", params.processing_level.as_str()),
                ("beamMode", params.beam_mode.as_str()),
                ("intersectsWith", params.intersects_with.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("output", "jsonlite"),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(FloodError::Download {
                url: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let results = response.json::<SearchResponse>()?.results;
        log::info!("Found {} results", results.len());
        Ok(results)
    }

    /// Download every product into `download_dir`, skipping files already
    /// on disk. Returns the downloaded paths.
    pub fn download(
        &self,
        products: &[AsfProduct],
        download_dir: &Path,
        credentials: &Credentials,
    ) -> FloodResult<Vec<PathBuf>> {
        fs::create_dir_all(download_dir)?;
        let mut downloaded = Vec::new();

        for product in products {
            let target = download_dir.join(&product.file_name);
            if target.is_file() {
                log::info!("{} already exists, skipping", target.display());
                downloaded.push(target);
                continue;
            }

            log::info!(
                "Downloading {} ({:.0} MB)",
                product.granule_name,
                product.size_mb.unwrap_or(0.0)
            );
            let mut response = self
                .client
                .get(&product.download_url)
                .basic_auth(&credentials.username, Some(&credentials.password))
                .send()?;
            if !response.status().is_success() {
                return Err(FloodError::Download {
                    url: product.download_url.clone(),
                    status: response.status().as_u16(),
                });
            }

            // stage to a partial file so an interrupted transfer never
            // passes the already-on-disk check
            let partial = target.with_extension("part");
            let mut out = fs::File::create(&partial)?;
            response.copy_to(&mut out)?;
            fs::rename(&partial, &target)?;
            downloaded.push(target);
        }

        log::info!("Finished download");
        Ok(downloaded)
    }
}

/// Write the per-run log of what was retrieved.
pub fn write_download_log(download_dir: &Path, products: &[AsfProduct]) -> FloodResult<PathBuf> {
    let log_path = download_dir.join("download_log.txt");
    let mut f = fs::File::create(&log_path)?;
    for product in products {
        writeln!(
            f,
            "{}\t{}\t{}",
            product.granule_name,
            product.start_time.as_deref().unwrap_or("-"),
            product.download_url
        )?;
    }
    log::info!("Saving log results to {}", log_path.display());
    Ok(log_path)
}
