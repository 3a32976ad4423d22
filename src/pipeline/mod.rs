//! Crawl driver: fetch each enabled gym's price page and extract it.
//!
//! Sites are visited one after another. A fetch failure for one site is
//! logged and counted; the others still run. Extraction never fails a site,
//! its section failures travel inside the returned `Gym`.

use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::models::Gym;
use crate::scraper::sites::{self, GymSite};
use crate::scraper::{PageSource, aggregate_html};

pub struct Pipeline<S> {
    config: AppConfig,
    source: S,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(config: AppConfig, source: S) -> Self {
        Self { config, source }
    }

    /// Resolve site keys, defaulting to the configured `sites.enabled` list.
    pub fn select_sites(&self, keys: &[String]) -> Result<Vec<Box<dyn GymSite>>> {
        let keys: &[String] = if keys.is_empty() {
            &self.config.sites.enabled
        } else {
            keys
        };
        keys.iter()
            .map(|key| sites::by_key(key).with_context(|| format!("Unknown site {:?}", key)))
            .collect()
    }

    pub async fn run(&self, keys: &[String]) -> Result<(Vec<Gym>, PipelineStats)> {
        let selected = self.select_sites(keys)?;
        info!("=== Crawling {} sites ===", selected.len());

        let mut gyms = Vec::with_capacity(selected.len());
        let mut stats = PipelineStats::default();

        for site in &selected {
            let url = match Url::parse(&self.config.sites.url_for(site.as_ref())) {
                Ok(url) => url,
                Err(e) => {
                    warn!("{}: bad page URL: {}", site.name(), e);
                    stats.fetch_failures += 1;
                    continue;
                }
            };
            info!("{}: fetching {}", site.name(), url);

            let html = match self
                .source
                .fetch_page(url.as_str())
                .await
                .with_context(|| format!("fetch_page({})", site.key()))
            {
                Ok(html) => html,
                Err(e) => {
                    warn!("{}: {:#}", site.name(), e);
                    stats.fetch_failures += 1;
                    continue;
                }
            };

            let gym = aggregate_html(site.as_ref(), &html, Some(url.as_str()));
            stats.sites += 1;
            stats.packages += gym.packages.len();
            stats.section_failures += gym.error_count();
            gyms.push(gym);
        }

        info!(
            "=== Done: {} sites | {} packages | {} extraction errors | {} fetch failures ===",
            stats.sites, stats.packages, stats.section_failures, stats.fetch_failures
        );

        Ok((gyms, stats))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub sites: usize,
    pub packages: usize,
    /// Failed sections plus skipped variants.
    pub section_failures: usize,
    pub fetch_failures: usize,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
