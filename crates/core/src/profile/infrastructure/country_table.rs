use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::profile::domain::country_profile::CountryProfile;

const BUNDLED_TABLE: &str = include_str!("../../../data/countries.json");

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read country table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed country table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid profile {code}: {reason}")]
    Invalid { code: String, reason: String },
    #[error("duplicate country code {0}")]
    Duplicate(String),
    #[error("unknown country code {0}")]
    Unknown(String),
}

#[derive(Deserialize)]
struct CountryTableFile {
    version: u32,
    countries: Vec<CountryProfile>,
}

/// Versioned, read-only table of country profiles.
///
/// Profiles keep the order of the table file. Lookups ignore case.
#[derive(Clone, Debug)]
pub struct CountryProfiles {
    version: u32,
    profiles: Vec<CountryProfile>,
}

impl CountryProfiles {
    /// The table compiled into the binary.
    pub fn bundled() -> Result<Self, ProfileError> {
        Self::from_json(BUNDLED_TABLE)
    }

    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let json = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&json)?;
        log::info!(
            "Loaded {} country profiles from {} (version {})",
            table.profiles.len(),
            path.display(),
            table.version
        );
        Ok(table)
    }

    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let file: CountryTableFile = serde_json::from_str(json)?;
        let mut profiles: Vec<CountryProfile> = Vec::with_capacity(file.countries.len());
        for mut profile in file.countries {
            profile.code = profile.code.trim().to_ascii_uppercase();
            if let Some(reason) = profile.problem() {
                return Err(ProfileError::Invalid {
                    code: profile.code,
                    reason,
                });
            }
            if profiles.iter().any(|p| p.code == profile.code) {
                return Err(ProfileError::Duplicate(profile.code));
            }
            profiles.push(profile);
        }
        Ok(Self {
            version: file.version,
            profiles,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, code: &str) -> Result<&CountryProfile, ProfileError> {
        self.profiles
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| ProfileError::Unknown(code.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryProfile> {
        self.profiles.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.code.as_str()).collect()
    }
}
