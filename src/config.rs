use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;

const CONFIG_FILE: &str = "coinafrique";
const ENV_PREFIX: &str = "COINAFRIQUE";

/// What the fetcher does when one listing page fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Log the failure, record it in the report and move on.
    Skip,
    /// Stop the run and discard what was fetched so far.
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
    pub max_pages: u32,
    pub on_page_error: PageErrorPolicy,
    pub stop_on_empty_page: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "https://sn.coinafrique.com".to_string(),
            user_agent: concat!("coinafrique_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 20,
            data_dir: PathBuf::from("data"),
            max_pages: 200,
            on_page_error: PageErrorPolicy::Skip,
            stop_on_empty_page: false,
        }
    }
}

impl Settings {
    /// Defaults, then `coinafrique.toml` if present, then `COINAFRIQUE_*` env vars.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
