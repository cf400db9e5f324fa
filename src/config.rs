//! YAML configuration and the file-backed report state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::positivity::DEFAULT_WINDOW;
use crate::error::ConfigError;
use crate::state::ReportStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Urls {
    pub case_data: String,
    pub rt: String,
    #[serde(default)]
    pub geojson: Option<String>,
}

/// Inputs for the NYT county series processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NytConfig {
    pub live_url: String,
    pub historical_url: String,
    /// State name to the counties kept for it.
    pub states: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_nyt_output")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub post_to_facebook: bool,
    #[serde(default)]
    pub send_email: bool,
    #[serde(default)]
    pub group_uid: String,
    #[serde(default)]
    pub test_group_uid: String,

    #[serde(default)]
    pub generate_bullet: bool,
    #[serde(default)]
    pub generate_line: bool,
    #[serde(default)]
    pub generate_xkcd_graph: bool,
    #[serde(default)]
    pub generate_state_map: bool,
    #[serde(default)]
    pub generate_regional_map: bool,

    pub counties: Vec<String>,
    pub primary_county: String,
    pub urls: Urls,

    /// Last data date reported for each county.
    #[serde(default)]
    pub latest_index: BTreeMap<String, NaiveDate>,
    #[serde(default)]
    pub post_negative_results: bool,

    #[serde(default = "default_window")]
    pub rolling_window: usize,
    #[serde(default = "default_state_fips")]
    pub state_fips: String,
    #[serde(default = "default_fips_width")]
    pub fips_width: usize,
    #[serde(default = "default_rt_region")]
    pub rt_region: String,

    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,
    /// Charts only plot dates after this one.
    #[serde(default)]
    pub chart_since: Option<NaiveDate>,

    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default)]
    pub nyt: Option<NytConfig>,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_state_fips() -> String {
    "05".to_string()
}

fn default_fips_width() -> usize {
    3
}

fn default_rt_region() -> String {
    "AR".to_string()
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("charts")
}

fn default_nyt_output() -> PathBuf {
    PathBuf::from("nyt_filtered.csv")
}

fn default_link() -> String {
    "https://arkansascovid.com/".to_string()
}

fn default_sources() -> Vec<String> {
    vec![
        "https://arkansascovid.com/".to_string(),
        "https://rt.live/us/AR".to_string(),
    ]
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.counties.is_empty() {
            return Err(ConfigError::Invalid("no counties configured".into()));
        }
        if !self.counties.contains(&self.primary_county) {
            return Err(ConfigError::Invalid(format!(
                "primary county '{}' is not in counties",
                self.primary_county
            )));
        }
        if self.rolling_window == 0 {
            return Err(ConfigError::Invalid("rolling_window must be at least 1".into()));
        }
        Ok(())
    }

    /// Feed group to post to; the test group in test mode.
    pub fn group(&self) -> &str {
        if self.test_mode {
            &self.test_group_uid
        } else {
            &self.group_uid
        }
    }
}

/// A [`Config`] bound to the file it was loaded from.
///
/// Implements [`ReportStore`] over `latest_index`; every update rewrites
/// the file.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Config::from_yaml(&text)?;
        debug!(path = %path.display(), counties = config.counties.len(), "Config loaded");
        Ok(Self { path, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        write_atomic(&self.path, &self.config)
    }
}

/// Writes `config` to a sibling temporary file and renames it into place.
fn write_atomic(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io = |source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    };
    let text = serde_yaml::to_string(config)?;
    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    std::fs::write(&tmp, text).map_err(io)?;
    std::fs::rename(&tmp, path).map_err(io)?;
    Ok(())
}

impl ReportStore for ConfigStore {
    fn get_last_reported(&self, county: &str) -> Option<NaiveDate> {
        self.config.latest_index.get(county).copied()
    }

    fn set_last_reported(&mut self, county: &str, date: NaiveDate) -> Result<()> {
        // The in-memory marker only moves once the file holds it.
        let mut next = self.config.clone();
        next.latest_index.insert(county.to_string(), date);
        write_atomic(&self.path, &next)?;
        self.config = next;
        debug!(county, %date, "Report state saved");
        Ok(())
    }
}
