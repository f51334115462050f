//! USGS NWIS gage-height client.
//!
//! Two endpoints: the site service (RDB output) to find daily-value gaging
//! stations inside a bounding box, and the daily-values service (JSON) for
//! the mean gage height series itself (parameter 00065, statistic 00003).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use geo::Rect;
use serde::Deserialize;

use crate::types::{FloodError, FloodResult};

/// NWIS site service (RDB output).
pub const SITE_ENDPOINT: &str = "https://waterservices.usgs.gov/nwis/site/";
/// NWIS daily-values service (JSON output).
pub const DV_ENDPOINT: &str = "https://waterservices.usgs.gov/nwis/dv/";

/// Gage height, feet (mean daily value).
pub const GAGE_HEIGHT_PARAMETER: &str = "00065";
const MEAN_STATISTIC: &str = "00003";

/// A daily-value gaging station with its period of record.
#[derive(Debug, Clone)]
pub struct GageSite {
    pub site_no: String,
    pub station_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub begin_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One daily mean gage-height observation.
#[derive(Debug, Clone)]
pub struct GageReading {
    pub site_no: String,
    pub station_name: String,
    pub date: String,
    pub gage_height_ft: f64,
}

pub struct NwisClient {
    client: reqwest::blocking::Client,
    site_endpoint: String,
    dv_endpoint: String,
}

impl NwisClient {
    pub fn new() -> FloodResult<Self> {
        Self::with_endpoints(SITE_ENDPOINT, DV_ENDPOINT)
    }

    pub fn with_endpoints<S1: Into<String>, S2: Into<String>>(
        site_endpoint: S1,
        dv_endpoint: S2,
    ) -> FloodResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("floodsar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(NwisClient {
            client,
            site_endpoint: site_endpoint.into(),
            dv_endpoint: dv_endpoint.into(),
        })
    }

    /// Daily-value sites inside a lon/lat bounding box.
    pub fn sites_in_bounds(&self, bounds: &Rect<f64>) -> FloodResult<Vec<GageSite>> {
        let bbox = format!(
            "{:.6},{:.6},{:.6},{:.6}",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
        let response = self
            .client
            .get(&self.site_endpoint)
            .query(&[
                ("format", "rdb"),
                ("bBox", bbox.as_str()),
                ("hasDataTypeCd", "dv"),
                ("outputDataTypeCd", "dv"),
                ("parameterCd", GAGE_HEIGHT_PARAMETER),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(FloodError::Download {
                url: self.site_endpoint.clone(),
                status: response.status().as_u16(),
            });
        }
        parse_site_rdb(&response.text()?)
    }

    /// Fetch the daily mean gage-height series for a set of sites.
    pub fn daily_gage_height(
        &self,
        sites: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> FloodResult<Vec<GageReading>> {
        if sites.is_empty() {
            return Err(FloodError::InvalidInput(
                "no gaging stations cover the requested period".to_string(),
            ));
        }
        let sites = sites.join(",");
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&self.dv_endpoint)
            .query(&[
                ("format", "json"),
                ("sites", sites.as_str()),
                ("startDT", start.as_str()),
                ("endDT", end.as_str()),
                ("parameterCd", GAGE_HEIGHT_PARAMETER),
                ("statCd", MEAN_STATISTIC),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(FloodError::Download {
                url: self.dv_endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let parsed: DvResponse = response.json()?;
        let mut readings = Vec::new();
        for series in parsed.value.time_series {
            let site_no = series
                .source_info
                .site_code
                .first()
                .map(|c| c.value.clone())
                .unwrap_or_default();
            for block in &series.values {
                for point in &block.value {
                    let height: f64 = match point.value.parse() {
                        Ok(v) => v,
                        Err(_) => continue, // provisional markers and the like
                    };
                    readings.push(GageReading {
                        site_no: site_no.clone(),
                        station_name: series.source_info.site_name.clone(),
                        date: point.date_time.clone(),
                        gage_height_ft: height,
                    });
                }
            }
        }
        Ok(readings)
    }
}

/// Sites whose period of record covers the whole requested date range.
pub fn covering_period(sites: &[GageSite], start: NaiveDate, end: NaiveDate) -> Vec<GageSite> {
    sites
        .iter()
        .filter(|s| s.begin_date <= start && s.end_date >= end)
        .cloned()
        .collect()
}

/// Parse the tab-delimited RDB site listing.
pub fn parse_site_rdb(rdb: &str) -> FloodResult<Vec<GageSite>> {
    let mut lines = rdb.lines().filter(|l| !l.starts_with('#'));

    let header = lines
        .next()
        .ok_or_else(|| FloodError::InvalidInput("empty RDB response".to_string()))?;
    let columns: Vec<&str> = header.split('\t').collect();
    let col = |name: &str| columns.iter().position(|c| *c == name);

    let (site_no, station_nm, lat, lon, begin, end) = match (
        col("site_no"),
        col("station_nm"),
        col("dec_lat_va"),
        col("dec_long_va"),
        col("begin_date"),
        col("end_date"),
    ) {
        (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) => (a, b, c, d, e, f),
        _ => {
            return Err(FloodError::InvalidInput(
                "RDB response is missing expected site columns".to_string(),
            ))
        }
    };

    let mut sites: Vec<GageSite> = Vec::new();
    for line in lines.skip(1) {
        // skip(1): the column-width line after the header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= end.max(begin).max(lon) {
            continue;
        }
        let parse_date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        let (begin_date, end_date) = match (parse_date(fields[begin]), parse_date(fields[end])) {
            (Some(b), Some(e)) => (b, e),
            _ => continue,
        };
        let (latitude, longitude) = match (fields[lat].parse(), fields[lon].parse()) {
            (Ok(la), Ok(lo)) => (la, lo),
            _ => continue,
        };
        if sites.iter().any(|s| s.site_no == fields[site_no]) {
            continue; // one row per data type, keep the first
        }
        sites.push(GageSite {
            site_no: fields[site_no].to_string(),
            station_name: fields[station_nm].to_string(),
            latitude,
            longitude,
            begin_date,
            end_date,
        });
    }
    Ok(sites)
}

/// Write readings as a CSV table.
pub fn write_readings_csv(readings: &[GageReading], save_path: &Path) -> FloodResult<PathBuf> {
    let mut f = fs::File::create(save_path)?;
    writeln!(f, "site_no,station_nm,date,gage_height_ft")?;
    for r in readings {
        writeln!(
            f,
            "{},\"{}\",{},{}",
            r.site_no, r.station_name, r.date, r.gage_height_ft
        )?;
    }
    Ok(save_path.to_path_buf())
}

/// Write the site listing next to the readings table.
pub fn write_sites_csv(sites: &[GageSite], save_path: &Path) -> FloodResult<PathBuf> {
    let mut f = fs::File::create(save_path)?;
    writeln!(f, "site_no,station_nm,dec_lat_va,dec_long_va,begin_date,end_date")?;
    for s in sites {
        writeln!(
            f,
            "{},\"{}\",{},{},{},{}",
            s.site_no, s.station_name, s.latitude, s.longitude, s.begin_date, s.end_date
        )?;
    }
    Ok(save_path.to_path_buf())
}

#[derive(Debug, Deserialize)]
struct DvResponse {
    value: DvValue,
}

#[derive(Debug, Deserialize)]
struct DvValue {
    #[serde(rename = "timeSeries")]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(rename = "sourceInfo")]
    source_info: SourceInfo,
    values: Vec<ValueBlock>,
}

#[derive(Debug, Deserialize)]
struct SourceInfo {
    #[serde(rename = "siteName")]
    site_name: String,
    #[serde(rename = "siteCode")]
    site_code: Vec<SiteCode>,
}

#[derive(Debug, Deserialize)]
struct SiteCode {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ValueBlock {
    value: Vec<DvPoint>,
}

#[derive(Debug, Deserialize)]
struct DvPoint {
    value: String,
    #[serde(rename = "dateTime")]
    date_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDB: &str = "\
# US Geological Survey
#
agency_cd\tsite_no\tstation_nm\tsite_tp_cd\tdec_lat_va\tdec_long_va\tbegin_date\tend_date\tcount_nu
5s\t15s\t50s\t7s\t16s\t16s\t10d\t10d\t8n
USGS\t08068720\tCypress Ck at Katy-Hockley Rd\tST\t29.965\t-95.733\t2008-10-01\t2023-01-15\t5000
USGS\t08068720\tCypress Ck at Katy-Hockley Rd\tST\t29.965\t-95.733\t2010-10-01\t2023-01-15\t4000
USGS\t08074000\tBuffalo Bayou at Houston\tST\t29.762\t-95.403\t2017-09-01\t2017-09-05\t5
";

    #[test]
    fn rdb_sites_parse_and_dedupe() {
        let sites = parse_site_rdb(RDB).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].site_no, "08068720");
        assert_eq!(sites[0].begin_date, NaiveDate::from_ymd_opt(2008, 10, 1).unwrap());
        assert_eq!(sites[1].station_name, "Buffalo Bayou at Houston");
    }

    #[test]
    fn period_of_record_filter_drops_short_sites() {
        let sites = parse_site_rdb(RDB).unwrap();
        let start = NaiveDate::from_ymd_opt(2017, 8, 16).unwrap();
        let end = NaiveDate::from_ymd_opt(2017, 9, 13).unwrap();
        let covered = covering_period(&sites, start, end);
        assert_eq!(covered.len(), 1);
        assert_eq!(covered[0].site_no, "08068720");
    }

    #[test]
    fn daily_values_json_deserializes() {
        let body = r#"{"value":{"timeSeries":[
            {"sourceInfo":{"siteName":"Cypress Ck","siteCode":[{"value":"08068720"}]},
             "values":[{"value":[
                {"value":"4.35","dateTime":"2017-08-27T00:00:00.000"},
                {"value":"","dateTime":"2017-08-28T00:00:00.000"}]}]}]}}"#;
        let parsed: DvResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.value.time_series.len(), 1);
        assert_eq!(parsed.value.time_series[0].values[0].value.len(), 2);
    }
}
