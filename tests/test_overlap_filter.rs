//! Footprint extraction and overlap filtering against real product zips
//! (fabricated in a temp dir, with just the manifest inside).

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use geo::{Coord, LineString, Polygon};
use zip::write::FileOptions;
use zip::ZipWriter;

use floodsar::io::manifest::read_footprint;
use floodsar::io::region::filter_by_overlap;

/// Manifest skeleton with a configurable footprint.
fn manifest_xml(coordinates: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1" xmlns:gml="http://www.opengis.net/gml">
  <metadataSection>
    <metadataObject ID="measurementFrameSet">
      <metadataWrap>
        <xmlData>
          <safe:frameSet xmlns:safe="http://www.esa.int/safe/sentinel-1.0">
            <safe:frame>
              <safe:footPrint srsName="http://www.opengis.net/gml/srs/epsg.xml#4326">
                <gml:coordinates>{}</gml:coordinates>
              </safe:footPrint>
            </safe:frame>
          </safe:frameSet>
        </xmlData>
      </metadataWrap>
    </metadataObject>
  </metadataSection>
</xfdu:XFDU>"#,
        coordinates
    )
}

/// Write a product archive holding only its SAFE manifest.
fn write_product_zip(dir: &Path, granule: &str, coordinates: &str) -> PathBuf {
    let path = dir.join(format!("{}.zip", granule));
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.start_file(
        format!("{}.SAFE/manifest.safe", granule),
        FileOptions::default(),
    )
    .unwrap();
    zip.write_all(manifest_xml(coordinates).as_bytes()).unwrap();
    zip.finish().unwrap();
    path
}

fn unit_square_region() -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 1.0 },
            Coord { x: 0.0, y: 0.0 },
        ]),
        vec![],
    )
}

#[test]
fn footprint_comes_out_of_the_archive_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    // manifest pairs are lat,lon
    let archive = write_product_zip(
        tmp.path(),
        "S1A_IW_GRDH_1SDV_FULL",
        "0.0,0.0 0.0,1.0 1.0,1.0 1.0,0.0",
    );

    let footprint = read_footprint(&archive).unwrap();
    assert_eq!(footprint.exterior().0.len(), 5); // auto-closed ring
}

#[test]
fn low_overlap_granules_are_dropped() {
    let tmp = tempfile::tempdir().unwrap();

    // covers the whole region
    let full = write_product_zip(
        tmp.path(),
        "S1A_IW_GRDH_1SDV_FULL",
        "0.0,0.0 0.0,1.0 1.0,1.0 1.0,0.0",
    );
    // covers half of it
    let half = write_product_zip(
        tmp.path(),
        "S1A_IW_GRDH_1SDV_HALF",
        "0.0,0.5 0.0,1.5 1.0,1.5 1.0,0.5",
    );
    // clips a 10% sliver
    let sliver = write_product_zip(
        tmp.path(),
        "S1A_IW_GRDH_1SDV_SLIVER",
        "0.0,0.9 0.0,1.9 1.0,1.9 1.0,0.9",
    );

    let region = unit_square_region();
    let archives = vec![full.clone(), half.clone(), sliver];
    let kept = filter_by_overlap(&region, &archives, 0.15).unwrap();
    assert_eq!(kept, vec![full, half]);
}

#[test]
fn archive_without_manifest_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("S1A_IW_GRDH_1SDV_BAD.zip");
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.start_file("readme.txt", FileOptions::default()).unwrap();
    zip.write_all(b"nothing here").unwrap();
    zip.finish().unwrap();

    assert!(read_footprint(&path).is_err());
}
