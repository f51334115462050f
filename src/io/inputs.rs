//! Resolution of the batch input: a list file or a directory of archives.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{FloodError, FloodResult};

/// Substring every high-resolution GRD product archive carries in its name.
const GRD_PRODUCT_MARKER: &str = "GRDH";

/// Resolve the positional input into a list of archive paths.
///
/// A directory is scanned for `*GRDH*.zip` archives (sorted for a
/// deterministic batch order); anything else is read as a text file with
/// one archive path per line, blank lines ignored.
pub fn grd_file_list(file_or_dir: &Path) -> FloodResult<Vec<PathBuf>> {
    if file_or_dir.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(file_or_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_grd_archive(p))
            .collect();
        files.sort();
        Ok(files)
    } else if file_or_dir.is_file() {
        let contents = fs::read_to_string(file_or_dir)?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    } else {
        Err(FloodError::InvalidInput(format!(
            "input is neither a file nor a directory: {}",
            file_or_dir.display()
        )))
    }
}

fn is_grd_archive(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    name.contains(GRD_PRODUCT_MARKER) && name.ends_with(".zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_scan_matches_only_grdh_zips() {
        let tmp = tempfile::tempdir().unwrap();
        for name in [
            "S1A_IW_GRDH_1SDV_a.zip",
            "S1B_IW_GRDH_1SDV_b.zip",
            "S1A_IW_SLC__1SDV_c.zip",
            "S1A_IW_GRDH_1SDV_d.txt",
            "notes.txt",
        ] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }

        let files = grd_file_list(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["S1A_IW_GRDH_1SDV_a.zip", "S1B_IW_GRDH_1SDV_b.zip"]
        );
    }

    #[test]
    fn list_file_drops_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let list = tmp.path().join("grd_files.txt");
        fs::write(&list, "/data/a.zip\n\n  /data/b.zip  \n").unwrap();

        let files = grd_file_list(&list).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("/data/a.zip"), PathBuf::from("/data/b.zip")]
        );
    }

    #[test]
    fn missing_input_is_rejected() {
        assert!(grd_file_list(Path::new("/no/such/input")).is_err());
    }
}
