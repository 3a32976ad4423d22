use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::scraper::sites::GymSite;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub sites: SitesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Which gyms to crawl and where their price pages live
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SitesConfig {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,

    #[serde(default)]
    pub justclimb_url: Option<String>,

    #[serde(default)]
    pub atticv_url: Option<String>,

    #[serde(default)]
    pub vermcity_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "hk-climb-price/0.1 (price comparison for Hong Kong climbing gyms)".to_string()
}
fn default_enabled() -> Vec<String> {
    crate::scraper::sites::all()
        .iter()
        .map(|s| s.key().to_string())
        .collect()
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("CLIMB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("sites.enabled")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        Self::from_config(cfg)
    }

    /// Sections or keys left out keep their defaults; a present but invalid
    /// value is an error.
    pub fn from_config(cfg: config::Config) -> Result<Self> {
        cfg.try_deserialize().context("Invalid configuration")
    }
}

impl SitesConfig {
    /// Configured URL for `site`, falling back to the site's own default.
    pub fn url_for(&self, site: &dyn GymSite) -> String {
        let configured = match site.key() {
            "justclimb" => self.justclimb_url.as_deref(),
            "atticv" => self.atticv_url.as_deref(),
            "vermcity" => self.vermcity_url.as_deref(),
            _ => None,
        };
        configured.unwrap_or(site.default_url()).to_string()
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            justclimb_url: None,
            atticv_url: None,
            vermcity_url: None,
        }
    }
}
