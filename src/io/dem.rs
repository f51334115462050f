//! SRTM 1-arc-second tile acquisition.
//!
//! Tiles come from the LP DAAC archive (`SRTMGL1.003`), which sits behind
//! an EarthData login. Downloads land in a cache directory and are skipped
//! when already present; the unpacked `.hgt` tiles are merged into a single
//! GeoTIFF with GDAL's external merge tool.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use geo::Rect;

use crate::core::gpt::run_tool;
use crate::io::credentials::Credentials;
use crate::types::{FloodError, FloodResult};

/// LP DAAC SRTMGL1 v003 tile root.
pub const SRTM_ENDPOINT: &str = "https://e4ftl01.cr.usgs.gov/MEASURES/SRTMGL1.003/2000.02.11/";

/// Nodata value of the merged elevation product.
pub const SRTM_NODATA: i32 = -32768;

/// Tile archive names (`N15W086.SRTMGL1.hgt.zip`) covering a lon/lat
/// bounding rectangle, one per square degree.
pub fn tiles_for_bounds(bounds: &Rect<f64>) -> Vec<String> {
    let min_lon = bounds.min().x.floor() as i32;
    let max_lon = bounds.max().x.ceil() as i32;
    let min_lat = bounds.min().y.floor() as i32;
    let max_lat = bounds.max().y.ceil() as i32;

    let mut tiles = Vec::new();
    for lat in min_lat..max_lat {
        let lat_str = if lat > 0 {
            format!("N{:02}", lat.abs())
        } else {
            format!("S{:02}", lat.abs())
        };
        for lon in min_lon..max_lon {
            let lon_str = if lon > 0 {
                format!("E{:03}", lon.abs())
            } else {
                format!("W{:03}", lon.abs())
            };
            tiles.push(format!("{}{}.SRTMGL1.hgt.zip", lat_str, lon_str));
        }
    }
    tiles
}

/// Blocking SRTM tile downloader with a local cache directory.
pub struct SrtmDownloader {
    client: reqwest::blocking::Client,
    endpoint: String,
    cache_dir: PathBuf,
}

impl SrtmDownloader {
    pub fn new<P: Into<PathBuf>>(cache_dir: P) -> FloodResult<Self> {
        Self::with_endpoint(SRTM_ENDPOINT, cache_dir)
    }

    pub fn with_endpoint<S: Into<String>, P: Into<PathBuf>>(
        endpoint: S,
        cache_dir: P,
    ) -> FloodResult<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .user_agent(concat!("floodsar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(SrtmDownloader {
            client,
            endpoint: endpoint.into(),
            cache_dir,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Fetch every tile archive, skipping ones already cached. A tile the
    /// archive does not hold (open ocean) is logged and dropped rather
    /// than failing the batch.
    pub fn download_tiles(
        &self,
        tiles: &[String],
        credentials: &Credentials,
    ) -> FloodResult<Vec<PathBuf>> {
        let mut downloaded = Vec::new();
        for tile in tiles {
            let target = self.cache_dir.join(tile);
            if target.is_file() {
                log::info!("{} already exists", target.display());
                downloaded.push(target);
                continue;
            }

            let url = format!("{}{}", self.endpoint, tile);
            log::info!("Beginning file download {}", url);
            let mut response = self
                .client
                .get(&url)
                .basic_auth(&credentials.username, Some(&credentials.password))
                .send()?;
            if !response.status().is_success() {
                log::warn!(
                    "{} not downloaded (HTTP {}): tile unavailable or bad EarthData login",
                    tile,
                    response.status()
                );
                continue;
            }

            let mut out = fs::File::create(&target)?;
            response.copy_to(&mut out)?;
            log::info!("Downloaded file: {}", tile);
            downloaded.push(target);
        }

        if downloaded.is_empty() {
            return Err(FloodError::InvalidInput(
                "no SRTM tiles could be downloaded for the region".to_string(),
            ));
        }
        Ok(downloaded)
    }

    /// Unpack cached tile archives into bare `.hgt` rasters.
    ///
    /// Both plain-zip (`.hgt.zip`) and gzip (`.hgt.gz`) tile containers
    /// are handled.
    pub fn unpack_tiles(&self, archives: &[PathBuf]) -> FloodResult<Vec<PathBuf>> {
        let mut unpacked = Vec::new();
        for archive in archives {
            let name = archive.to_string_lossy();
            if name.ends_with(".gz") {
                unpacked.push(self.gunzip_tile(archive)?);
            } else {
                unpacked.extend(self.unzip_tile(archive)?);
            }
        }
        Ok(unpacked)
    }

    fn unzip_tile(&self, archive: &Path) -> FloodResult<Vec<PathBuf>> {
        let file = fs::File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file)?;
        let mut out = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if !entry.name().ends_with(".hgt") {
                continue;
            }
            let dest = self.cache_dir.join(
                Path::new(entry.name())
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new("tile.hgt")),
            );
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            fs::File::create(&dest)?.write_all(&contents)?;
            out.push(dest);
        }
        Ok(out)
    }

    fn gunzip_tile(&self, archive: &Path) -> FloodResult<PathBuf> {
        let stem = archive.file_stem().map(PathBuf::from).ok_or_else(|| {
            FloodError::InvalidInput(format!("bad tile archive name: {}", archive.display()))
        })?;
        let dest = self.cache_dir.join(stem);
        let mut decoder = flate2::read::GzDecoder::new(fs::File::open(archive)?);
        let mut contents = Vec::new();
        decoder.read_to_end(&mut contents)?;
        fs::File::create(&dest)?.write_all(&contents)?;
        Ok(dest)
    }
}

/// Merge unpacked `.hgt` tiles into one GeoTIFF via the external merger.
pub fn merge_tiles(gdal_merge: &Path, tiles: &[PathBuf], save_path: &Path) -> FloodResult<()> {
    if tiles.is_empty() {
        return Err(FloodError::InvalidInput("no tiles to merge".to_string()));
    }
    let mut args = vec![
        "-o".to_string(),
        save_path.to_string_lossy().into_owned(),
        "-n".to_string(),
        SRTM_NODATA.to_string(),
        "-a_nodata".to_string(),
        SRTM_NODATA.to_string(),
    ];
    args.extend(tiles.iter().map(|t| t.to_string_lossy().into_owned()));
    run_tool(gdal_merge, &args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn tile_names_cover_the_bounds() {
        // Hurricane Harvey study area, lower Brazos
        let bounds = Rect::new(
            coord! { x: -96.25, y: 29.25 },
            coord! { x: -95.2, y: 30.25 },
        );
        let tiles = tiles_for_bounds(&bounds);
        assert_eq!(
            tiles,
            vec![
                "N29W097.SRTMGL1.hgt.zip",
                "N29W096.SRTMGL1.hgt.zip",
                "N30W097.SRTMGL1.hgt.zip",
                "N30W096.SRTMGL1.hgt.zip"
            ]
        );
    }

    #[test]
    fn southern_western_hemispheres_get_their_prefixes() {
        let bounds = Rect::new(coord! { x: -85.5, y: -15.5 }, coord! { x: -85.1, y: -15.1 });
        assert_eq!(tiles_for_bounds(&bounds), vec!["S16W086.SRTMGL1.hgt.zip"]);
    }

    #[test]
    fn merge_with_no_tiles_is_rejected() {
        assert!(merge_tiles(Path::new("gdal_merge.py"), &[], Path::new("/tmp/out.tif")).is_err());
    }
}
