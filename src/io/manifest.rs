//! SAFE manifest footprint extraction.
//!
//! Each product archive carries a `manifest.safe` XML file whose
//! `<gml:coordinates>` element lists the scene footprint as
//! whitespace-separated `lat,lon` pairs. That polygon is all the overlap
//! filter needs, so the rest of the manifest is never materialized.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use geo::{Coord, LineString, Polygon};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::types::{FloodError, FloodResult};

/// Read the scene footprint polygon out of a GRD product archive.
pub fn read_footprint(archive: &Path) -> FloodResult<Polygon<f64>> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let manifest_name = zip
        .file_names()
        .find(|n| n.ends_with("manifest.safe"))
        .map(str::to_string)
        .ok_or_else(|| {
            FloodError::InvalidInput(format!("no manifest.safe in {}", archive.display()))
        })?;

    let mut manifest = String::new();
    zip.by_name(&manifest_name)?.read_to_string(&mut manifest)?;
    let coordinates = extract_gml_coordinates(&manifest)?;
    parse_gml_coordinates(&coordinates)
}

/// Pull the text of the first `<gml:coordinates>` element.
pub fn extract_gml_coordinates(manifest_xml: &str) -> FloodResult<String> {
    let mut reader = Reader::from_str(manifest_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"coordinates" => {
                let text = reader
                    .read_text(e.name())
                    .map_err(|e| FloodError::XmlParsing(format!("bad coordinates element: {}", e)))?;
                return Ok(text.trim().to_string());
            }
            Ok(Event::Eof) => {
                return Err(FloodError::XmlParsing(
                    "manifest has no gml:coordinates element".to_string(),
                ))
            }
            Err(e) => {
                return Err(FloodError::XmlParsing(format!("malformed manifest: {}", e)))
            }
            _ => {}
        }
    }
}

/// Parse `lat,lon lat,lon ...` into a lon/lat polygon.
pub fn parse_gml_coordinates(text: &str) -> FloodResult<Polygon<f64>> {
    let mut coords = Vec::new();
    for pair in text.split_whitespace() {
        let (lat, lon) = pair.split_once(',').ok_or_else(|| {
            FloodError::XmlParsing(format!("bad coordinate pair: {:?}", pair))
        })?;
        let lat: f64 = lat.parse().map_err(|_| {
            FloodError::XmlParsing(format!("bad latitude: {:?}", lat))
        })?;
        let lon: f64 = lon.parse().map_err(|_| {
            FloodError::XmlParsing(format!("bad longitude: {:?}", lon))
        })?;
        coords.push(Coord { x: lon, y: lat });
    }
    if coords.len() < 3 {
        return Err(FloodError::XmlParsing(format!(
            "footprint has only {} coordinates",
            coords.len()
        )));
    }
    Ok(Polygon::new(LineString::from(coords), vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1" xmlns:gml="http://www.opengis.net/gml">
  <metadataSection>
    <metadataObject ID="measurementFrameSet">
      <metadataWrap>
        <xmlData>
          <safe:frameSet xmlns:safe="http://www.esa.int/safe/sentinel-1.0">
            <safe:frame>
              <safe:footPrint srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
                <gml:coordinates>30.1,-96.5 30.2,-94.2 28.6,-94.0 28.5,-96.3</gml:coordinates>
              </safe:footPrint>
            </safe:frame>
          </safe:frameSet>
        </xmlData>
      </metadataWrap>
    </metadataObject>
  </metadataSection>
</xfdu:XFDU>"#;

    #[test]
    fn coordinates_come_out_of_the_frame_set() {
        let text = extract_gml_coordinates(SAMPLE).unwrap();
        assert_eq!(text, "30.1,-96.5 30.2,-94.2 28.6,-94.0 28.5,-96.3");
    }

    #[test]
    fn pairs_are_lat_lon_and_become_lon_lat() {
        let poly = parse_gml_coordinates("30.1,-96.5 30.2,-94.2 28.6,-94.0 28.5,-96.3").unwrap();
        let first = poly.exterior().0[0];
        assert_eq!(first.x, -96.5);
        assert_eq!(first.y, 30.1);
        assert!(poly.unsigned_area() > 0.0);
    }

    #[test]
    fn degenerate_footprints_are_rejected() {
        assert!(parse_gml_coordinates("30.1,-96.5 30.2,-94.2").is_err());
        assert!(parse_gml_coordinates("garbage").is_err());
    }
}
