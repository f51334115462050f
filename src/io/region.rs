//! Region-of-interest loading and the footprint overlap filter.
//!
//! Regions come in as EPSG:4326 polygons, either from a GeoJSON file or
//! from a file holding a single well-known-text `POLYGON`. Coordinates are
//! lon/lat throughout.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Area, BooleanOps, BoundingRect, Coord, Geometry, LineString, Polygon, Rect};
use geojson::GeoJson;

use crate::io::manifest;
use crate::types::{FloodError, FloodResult};

/// Minimum footprint overlap, as a fraction of the region area, for a
/// granule to be worth preprocessing.
pub const DEFAULT_MIN_OVERLAP: f64 = 0.15;

/// Load the region polygons from a GeoJSON or WKT file.
pub fn read_region_polygons(path: &Path) -> FloodResult<Vec<Polygon<f64>>> {
    let contents = fs::read_to_string(path)?;
    let trimmed = contents.trim();

    let polygons = if trimmed.starts_with("POLYGON") {
        vec![parse_wkt_polygon(trimmed)?]
    } else {
        geojson_polygons(trimmed)?
    };

    if polygons.is_empty() {
        return Err(FloodError::InvalidInput(format!(
            "no polygons in {}",
            path.display()
        )));
    }
    Ok(polygons)
}

fn geojson_polygons(contents: &str) -> FloodResult<Vec<Polygon<f64>>> {
    let geojson: GeoJson = contents
        .parse()
        .map_err(|e| FloodError::InvalidInput(format!("bad GeoJSON region: {}", e)))?;
    let collection = geojson::quick_collection(&geojson)
        .map_err(|e| FloodError::InvalidInput(format!("bad GeoJSON region: {}", e)))?;

    let mut polygons = Vec::new();
    for geometry in collection {
        match geometry {
            Geometry::Polygon(p) => polygons.push(p),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
            _ => {}
        }
    }
    Ok(polygons)
}

/// Parse a single-ring `POLYGON((lon lat, lon lat, ...))` string.
pub fn parse_wkt_polygon(wkt: &str) -> FloodResult<Polygon<f64>> {
    let bad = |msg: &str| FloodError::InvalidInput(format!("bad WKT polygon: {}", msg));

    let body = wkt
        .trim()
        .strip_prefix("POLYGON")
        .ok_or_else(|| bad("missing POLYGON keyword"))?
        .trim();
    let inner = body
        .strip_prefix("((")
        .and_then(|s| s.strip_suffix("))"))
        .ok_or_else(|| bad("expected (( ... ))"))?;

    let mut coords = Vec::new();
    for pair in inner.split(',') {
        let mut parts = pair.split_whitespace();
        let lon: f64 = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| bad(pair))?;
        let lat: f64 = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| bad(pair))?;
        coords.push(Coord { x: lon, y: lat });
    }
    if coords.len() < 4 {
        return Err(bad("ring needs at least four coordinates"));
    }
    Ok(Polygon::new(LineString::from(coords), vec![]))
}

/// Render a polygon's exterior ring as a WKT string for search queries.
pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    let ring: Vec<String> = polygon
        .exterior()
        .0
        .iter()
        .map(|c| format!("{} {}", c.x, c.y))
        .collect();
    format!("POLYGON(({}))", ring.join(","))
}

/// Bounding rectangle of one region polygon.
pub fn region_bounds(polygon: &Polygon<f64>) -> FloodResult<Rect<f64>> {
    polygon
        .bounding_rect()
        .ok_or_else(|| FloodError::InvalidInput("region polygon is empty".to_string()))
}

/// Keep the archives whose scene footprint covers more than `min_overlap`
/// of the region area.
///
/// Footprints come from each archive's SAFE manifest; a granule that barely
/// clips the region is not worth a full preprocessing run.
pub fn filter_by_overlap(
    region: &Polygon<f64>,
    archives: &[PathBuf],
    min_overlap: f64,
) -> FloodResult<Vec<PathBuf>> {
    let region_area = region.unsigned_area();
    if region_area <= 0.0 {
        return Err(FloodError::InvalidInput(
            "region polygon has zero area".to_string(),
        ));
    }

    let mut keep = Vec::new();
    for archive in archives {
        let footprint = manifest::read_footprint(archive)?;
        let fraction = overlap_fraction(region, &footprint, region_area);
        if fraction > min_overlap {
            keep.push(archive.clone());
        } else {
            log::info!(
                "{}: only {:.1}% overlap with the region, dropping",
                archive.display(),
                fraction * 100.0
            );
        }
    }
    Ok(keep)
}

fn overlap_fraction(region: &Polygon<f64>, footprint: &Polygon<f64>, region_area: f64) -> f64 {
    footprint.intersection(region).unsigned_area() / region_area
}
