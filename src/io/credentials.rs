//! EarthData credential lookup.
//!
//! Both the ASF product downloads and the LP DAAC SRTM tiles sit behind a
//! NASA EarthData login. Credentials are resolved from explicit arguments,
//! then the `ASF_API_USER`/`ASF_API_PASS` environment variables, then the
//! `~/.netrc` entry for `urs.earthdata.nasa.gov`.

use std::env;
use std::fs;

use crate::types::{FloodError, FloodResult};

/// EarthData login machine name used in `.netrc`.
pub const URS_MACHINE: &str = "urs.earthdata.nasa.gov";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Resolve EarthData credentials from arguments, environment, or netrc.
    pub fn earthdata(username: Option<&str>, password: Option<&str>) -> FloodResult<Self> {
        if let (Some(u), Some(p)) = (username, password) {
            return Ok(Credentials {
                username: u.to_string(),
                password: p.to_string(),
            });
        }
        if let (Ok(u), Ok(p)) = (env::var("ASF_API_USER"), env::var("ASF_API_PASS")) {
            return Ok(Credentials {
                username: u,
                password: p,
            });
        }
        Self::from_netrc(URS_MACHINE)
    }

    /// Look a machine up in `~/.netrc`.
    pub fn from_netrc(machine: &str) -> FloodResult<Self> {
        let netrc_path = dirs::home_dir()
            .map(|home| home.join(".netrc"))
            .ok_or_else(|| FloodError::Config("cannot locate home directory".to_string()))?;
        let contents = fs::read_to_string(&netrc_path).map_err(|_| {
            FloodError::Config(format!(
                "no credentials given and {} is unreadable",
                netrc_path.display()
            ))
        })?;
        parse_netrc(&contents, machine).ok_or_else(|| {
            FloodError::Config(format!(
                "no entry for machine {} in {}",
                machine,
                netrc_path.display()
            ))
        })
    }
}

/// Token-scan a netrc body for one machine's login/password.
pub fn parse_netrc(contents: &str, machine: &str) -> Option<Credentials> {
    let tokens: Vec<&str> = contents.split_whitespace().collect();

    let mut in_machine = false;
    let mut login = None;
    let mut password = None;

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "machine" if i + 1 < tokens.len() => {
                if in_machine {
                    break; // next entry starts, stop collecting
                }
                in_machine = tokens[i + 1] == machine;
                i += 2;
            }
            "default" => {
                if in_machine {
                    break;
                }
                i += 1;
            }
            "login" if in_machine && i + 1 < tokens.len() => {
                login = Some(tokens[i + 1].to_string());
                i += 2;
            }
            "password" if in_machine && i + 1 < tokens.len() => {
                password = Some(tokens[i + 1].to_string());
                i += 2;
            }
            _ => i += 1,
        }
    }

    match (login, password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netrc_entry_is_found_among_others() {
        let netrc = "machine example.com login a password b\n\
                     machine urs.earthdata.nasa.gov\n  login flooduser\n  password s3cret\n\
                     machine other.org login x password y\n";
        let creds = parse_netrc(netrc, URS_MACHINE).unwrap();
        assert_eq!(creds.username, "flooduser");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn missing_machine_yields_none() {
        assert!(parse_netrc("machine example.com login a password b", URS_MACHINE).is_none());
    }
}
