use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Polarization modes for Sentinel-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

/// One GRD product instance, identified by the archive it came in.
///
/// The granule name is the archive basename up to the first `.`, so
/// `S1A_IW_GRDH_..._D734.zip` and `S1A_IW_GRDH_..._D734.SAFE.zip` both
/// resolve to the same identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    pub name: String,
    pub archive: PathBuf,
}

impl Granule {
    pub fn from_archive<P: AsRef<Path>>(archive: P) -> FloodResult<Self> {
        let archive = archive.as_ref();
        let basename = archive
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FloodError::InvalidInput(format!("not a file path: {}", archive.display()))
            })?;
        let name = basename.split('.').next().unwrap_or(basename);
        if name.is_empty() {
            return Err(FloodError::InvalidInput(format!(
                "cannot derive a granule name from {}",
                archive.display()
            )));
        }
        Ok(Granule {
            name: name.to_string(),
            archive: archive.to_path_buf(),
        })
    }
}

/// Error types for acquisition and preprocessing
#[derive(Debug, thiserror::Error)]
pub enum FloodError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{tool} failed with exit status {status:?}")]
    Tool {
        tool: String,
        status: Option<i32>,
        output: String,
    },

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download of {url} failed with HTTP status {status}")]
    Download { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl FloodError {
    /// Exit status to propagate when an external tool fails; 1 for
    /// everything else.
    pub fn exit_status(&self) -> i32 {
        match self {
            FloodError::Tool { status, .. } => status.unwrap_or(1),
            _ => 1,
        }
    }
}

/// Result type for acquisition and preprocessing operations
pub type FloodResult<T> = Result<T, FloodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granule_name_strips_everything_after_first_dot() {
        let g = Granule::from_archive("/data/S1A_IW_GRDH_1SDV_20170829_D734.zip").unwrap();
        assert_eq!(g.name, "S1A_IW_GRDH_1SDV_20170829_D734");

        let g = Granule::from_archive("S1B_IW_GRDH_1SDV.SAFE.zip").unwrap();
        assert_eq!(g.name, "S1B_IW_GRDH_1SDV");
    }

    #[test]
    fn granule_rejects_pathless_input() {
        assert!(Granule::from_archive("/").is_err());
    }
}
