//! Run settings: directories, source URL, survey year and archive name.
//!
//! Values come from the environment (a `.env` file is loaded by the binary)
//! and fall back to defaults; CLI flags override either.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::meta::{FLOW_META_FILE, PROCESS_META_FILE, SOURCES_FILE};
use crate::mapping::MAPPING_FILE;
use crate::output::DISTANCES_FILE;

/// Public use file of the 2017 Commodity Flow Survey.
pub const DEFAULT_PUF_URL: &str =
    "https://www2.census.gov/programs-surveys/cfs/datasets/2017/CFS_2017_PUF_CSV.zip";
pub const DEFAULT_YEAR: i32 = 2017;
pub const DEFAULT_ARCHIVE_NAME: &str = "uslci-transport";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub meta_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub puf_source: String,
    pub year: i32,
    pub archive_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            meta_dir: PathBuf::from("metadata"),
            output_dir: PathBuf::from("output"),
            cache_dir: PathBuf::from("cache"),
            puf_source: DEFAULT_PUF_URL.to_string(),
            year: DEFAULT_YEAR,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

impl Settings {
    /// Reads `CT_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset or empty keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(v) = get("CT_DATA_DIR") {
            settings.data_dir = v.into();
        }
        if let Some(v) = get("CT_META_DIR") {
            settings.meta_dir = v.into();
        }
        if let Some(v) = get("CT_OUTPUT_DIR") {
            settings.output_dir = v.into();
        }
        if let Some(v) = get("CT_CACHE_DIR") {
            settings.cache_dir = v.into();
        }
        if let Some(v) = get("CT_PUF_URL") {
            settings.puf_source = v;
        }
        if let Some(v) = get("CT_YEAR") {
            settings.year = v
                .trim()
                .parse()
                .with_context(|| format!("CT_YEAR must be a year, got '{v}'"))?;
        }
        if let Some(v) = get("CT_ARCHIVE_NAME") {
            settings.archive_name = v;
        }

        Ok(settings)
    }

    pub fn distances_path(&self) -> PathBuf {
        self.data_dir.join(DISTANCES_FILE)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_dir.join(MAPPING_FILE)
    }

    pub fn flow_meta_path(&self) -> PathBuf {
        self.meta_dir.join(FLOW_META_FILE)
    }

    pub fn process_meta_path(&self) -> PathBuf {
        self.meta_dir.join(PROCESS_META_FILE)
    }

    pub fn sources_path(&self) -> PathBuf {
        self.meta_dir.join(SOURCES_FILE)
    }
}
